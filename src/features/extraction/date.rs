use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// 日付の近くに現れるキーワード（英語とポーランド語）
///
/// 長いキーワードを先に並べ、"date" 単独へのフォールバックを最後に置く
static DATE_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(invoice\s*date|receipt\s*date|purchase\s*date|transaction\s*date|issued\s*on|data\s*zakupu|data\s*sprzedaży|date)\s*:?\s*",
    )
    .expect("日付キーワード正規表現のコンパイルに失敗")
});

/// 時刻付き日付（ISO順 YYYY-MM-DD HH:MM または日先行 DD-MM-YYYY HH:MM）
static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{4})[-.\\/](\d{1,2})[-.\\/](\d{1,2})[ T](\d{1,2}):(\d{1,2})|(\d{1,2})[-.\\/](\d{1,2})[-.\\/](\d{4})[ T](\d{1,2}):(\d{1,2})",
    )
    .expect("時刻付き日付正規表現のコンパイルに失敗")
});

/// ISO形式の日付（YYYY-MM-DD、区切りは - . \ / のいずれか）
static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[-.\\/](\d{1,2})[-.\\/](\d{1,2})")
        .expect("ISO日付正規表現のコンパイルに失敗")
});

/// 日先行形式の日付（DD.MM.YYYY / DD/MM/YYYY）
static DAY_FIRST_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[-.\\/](\d{1,2})[-.\\/](\d{4})")
        .expect("日先行日付正規表現のコンパイルに失敗")
});

/// OCRテキストから日付を抽出する
///
/// # 引数
/// * `text` - OCRで読み取られたテキスト
///
/// # 戻り値
/// 抽出された日付。時刻情報がない場合は深夜0時。検出できない場合はNone
///
/// # 抽出順序
/// 1. キーワード（Date: など）の直後のテキストに対してパターンを試す
/// 2. キーワードでの一致がなければ、テキスト全体を行単位で走査する
///
/// いずれの場合もパターンの優先順位は 時刻付き → ISO → 日先行。
/// 暦として成立しない数値の組（13月など）は一致として扱わない
pub fn extract_date(text: &str) -> Option<NaiveDateTime> {
    // キーワードの直後を優先的に探す
    for line in text.lines() {
        if let Some(keyword_match) = DATE_KEYWORD_RE.find(line) {
            let after_keyword = &line[keyword_match.end()..];
            if let Some(date) = try_date_patterns(after_keyword) {
                return Some(date);
            }
        }
    }

    // キーワードで見つからなければテキスト全体を走査する
    for line in text.lines() {
        if let Some(date) = try_date_patterns(line) {
            return Some(date);
        }
    }

    None
}

/// テキスト片に対して日付パターンを優先順に試す
///
/// 最初に成立したパターンの結果を返す
fn try_date_patterns(fragment: &str) -> Option<NaiveDateTime> {
    let matchers: [fn(&str) -> Option<NaiveDateTime>; 3] =
        [match_datetime, match_iso_date, match_day_first_date];

    matchers.iter().find_map(|matcher| matcher(fragment))
}

/// 時刻付き日付の一致を試す
fn match_datetime(fragment: &str) -> Option<NaiveDateTime> {
    let caps = DATETIME_RE.captures(fragment)?;

    if caps.get(1).is_some() {
        // YYYY-MM-DD HH:MM 形式
        build_datetime(
            caps.get(1)?.as_str(),
            caps.get(2)?.as_str(),
            caps.get(3)?.as_str(),
            caps.get(4)?.as_str(),
            caps.get(5)?.as_str(),
        )
    } else {
        // DD-MM-YYYY HH:MM 形式
        build_datetime(
            caps.get(8)?.as_str(),
            caps.get(7)?.as_str(),
            caps.get(6)?.as_str(),
            caps.get(9)?.as_str(),
            caps.get(10)?.as_str(),
        )
    }
}

/// ISO形式（YYYY-MM-DD）の一致を試す
fn match_iso_date(fragment: &str) -> Option<NaiveDateTime> {
    let caps = ISO_DATE_RE.captures(fragment)?;

    build_date(
        caps.get(1)?.as_str(),
        caps.get(2)?.as_str(),
        caps.get(3)?.as_str(),
    )
}

/// 日先行形式（DD.MM.YYYY）の一致を試す
fn match_day_first_date(fragment: &str) -> Option<NaiveDateTime> {
    let caps = DAY_FIRST_DATE_RE.captures(fragment)?;

    build_date(
        caps.get(3)?.as_str(),
        caps.get(2)?.as_str(),
        caps.get(1)?.as_str(),
    )
}

/// 年月日の文字列から日付を構築する（深夜0時）
fn build_date(year: &str, month: &str, day: &str) -> Option<NaiveDateTime> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

/// 年月日と時分の文字列から日時を構築する
fn build_datetime(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    minute: &str,
) -> Option<NaiveDateTime> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn ymd_hm(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_keyword_iso_date() {
        assert_eq!(extract_date("Date: 2024-03-15"), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_keyword_variants() {
        assert_eq!(
            extract_date("Invoice date: 2023-11-02"),
            Some(ymd(2023, 11, 2))
        );
        assert_eq!(
            extract_date("data zakupu: 12.06.2024"),
            Some(ymd(2024, 6, 12))
        );
        assert_eq!(
            extract_date("Data sprzedaży: 01/02/2024"),
            Some(ymd(2024, 2, 1))
        );
    }

    #[test]
    fn test_datetime_takes_priority() {
        // 時刻付きのパターンが日付のみより優先される
        assert_eq!(
            extract_date("Date: 2024-03-15 14:30"),
            Some(ymd_hm(2024, 3, 15, 14, 30))
        );
        assert_eq!(
            extract_date("Date: 15.03.2024 09:05"),
            Some(ymd_hm(2024, 3, 15, 9, 5))
        );
    }

    #[test]
    fn test_unanchored_fallback() {
        // キーワードなしでも日付らしき文字列を拾う
        let text = "PARAGON FISKALNY\n17.04.2024 12:01\nSUMA PLN 23,50";
        assert_eq!(extract_date(text), Some(ymd_hm(2024, 4, 17, 12, 1)));
    }

    #[test]
    fn test_keyword_match_preferred_over_earlier_line() {
        // 前の行に裸の日付があっても、キーワード付きの日付を優先する
        let text = "01.01.2020\nDate: 2024-03-15";
        assert_eq!(extract_date(text), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_invalid_calendar_components_rejected() {
        // 13月は日付として成立しないので一致扱いしない
        assert_eq!(extract_date("Date: 2024-13-45"), None);

        // 後続の行に正しい日付があればそちらを採用する
        let text = "Date: 2024-13-45\n15.03.2024";
        assert_eq!(extract_date(text), Some(ymd(2024, 3, 15)));
    }

    #[test]
    fn test_no_date_returns_none() {
        assert_eq!(extract_date("żadnych dat tutaj nie ma"), None);
        assert_eq!(extract_date(""), None);
    }
}
