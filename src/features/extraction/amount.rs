use once_cell::sync::Lazy;
use regex::Regex;

/// 「合計」を意味するキーワードに続く金額のパターン
///
/// OCRの典型的な誤読（O→0、A→4、M→Bなど）を許容する。
/// キーワードの後に通貨記号が続く場合もある
static KEYWORD_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(SU[A4]|SU[BM][A4]|SU[BM][A4]\s*PL N|T[O0]TAL|[A4]M[O0]UNT|TOTAL\s*DUE|AMOUNT\s*PAID|PAYMENT|P[A4]Y[A4]BLE)\s*(PLN|EUR|USD|£|\$|€)?\s*([\d\s,.]+\d)",
    )
    .expect("金額キーワード正規表現のコンパイルに失敗")
});

/// キーワードなしで通貨記号に隣接する金額のパターン（フォールバック）
static CURRENCY_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(PLN|EUR|USD|£|\$|€)\s*([\d\s,.]+\d)")
        .expect("通貨フォールバック正規表現のコンパイルに失敗")
});

/// OCRテキストから金額を抽出する
///
/// # 引数
/// * `text` - OCRで読み取られたテキスト
///
/// # 戻り値
/// 抽出された金額（小数点以下2桁に丸め済み）。検出できない場合は0.0
///
/// # 抽出順序
/// 1. キーワード（合計・金額・支払など）に続く数値
/// 2. 通貨記号に隣接する数値
/// 3. どちらも見つからなければ0.0
pub fn extract_amount(text: &str) -> f64 {
    let matchers: [fn(&str) -> Option<f64>; 2] = [match_keyword_amount, match_currency_amount];

    matchers
        .iter()
        .find_map(|matcher| matcher(text))
        .unwrap_or(0.0)
}

/// キーワードに続く金額を探す
fn match_keyword_amount(text: &str) -> Option<f64> {
    let caps = KEYWORD_AMOUNT_RE.captures(text)?;
    let raw = caps.get(3)?.as_str();

    // キーワードが見つかった時点で後続の候補は探さない。解釈不能なら0.0
    Some(normalize_amount(raw).unwrap_or(0.0))
}

/// 通貨記号に隣接する金額を探す
fn match_currency_amount(text: &str) -> Option<f64> {
    let caps = CURRENCY_AMOUNT_RE.captures(text)?;
    let raw = caps.get(2)?.as_str();

    Some(normalize_amount(raw).unwrap_or(0.0))
}

/// 金額文字列を正規化して数値に変換する
///
/// # 引数
/// * `raw` - 正規表現でキャプチャされた金額文字列
///
/// # 戻り値
/// 小数点以下2桁に丸めた金額、または解釈できない場合はNone
///
/// # 正規化手順
/// 1. 空白を除去（"1 234,56" のような千区切り空白）
/// 2. 最初のカンマをドットに置換（ヨーロッパ式小数点）
/// 3. 先頭から解釈可能な最長の数値プレフィックスを読む
fn normalize_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.replacen(',', ".", 1);

    let value = parse_float_prefix(&cleaned)?;
    Some(round_to_cents(value))
}

/// 先頭から解釈できる最長の数値プレフィックスをf64として読む
///
/// "1.234.56" のような複数ドットの文字列は "1.234" として解釈される
fn parse_float_prefix(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => {
                seen_digit = true;
                end = i + 1;
            }
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }

    s[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// 小数点以下2桁に丸める
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
