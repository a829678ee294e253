use once_cell::sync::Lazy;
use regex::Regex;

/// 会社名として採用しない行のパターン（レシートの定型ヘッダーや記号行）
static EXCLUSION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[|~*]+$",      // 記号のみの行
        r"(?i)^PARAGON",  // レシート定型句（ポーランド語）
        r"(?i)^FISKALNY",
        r"(?i)^nr wydr",
        r"(?i)^NIP",      // 税番号の行
        r"(?i)^ARKADTA",
        r"(?i)^SUMA PLN",
        r"(?i)^ROZLICZENIE",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("除外パターン正規表現のコンパイルに失敗"))
    .collect()
});

/// 法人格サフィックスのパターン（OCRの誤読を許容）
///
/// "Sp. z o.o." はOCRで o→0、z→2、S→5 と誤読されやすい
static LEGAL_SUFFIX_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:sp|5p)[.,]?\s*[z2][.,]?\s*[o\d][.,]?\s*[o\d][.,]?", // Sp. z o.o. と誤読変種
        r"(?i)\b[s86]\.\s*a\.?",                                       // S.A. と誤読変種
        r"(?i)\bltd\b",
        r"(?i)\binc\b",
        r"(?i)\bs\.r\.o\.",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("法人格サフィックス正規表現のコンパイルに失敗"))
    .collect()
});

/// 行頭・行末の記号の連なり
static LEADING_SYMBOLS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[|~*]+").expect("先頭記号正規表現のコンパイルに失敗"));
static TRAILING_SYMBOLS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[|~*]+$").expect("末尾記号正規表現のコンパイルに失敗"));

/// OCRで誤読された "Sp. z o.o." の変種（正規化用）
static SP_Z_OO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sp|5p)[.,]?\s*[z2][.,]?\s*(?:[o\d][.,]?\s*){2}")
        .expect("Sp. z o.o.正規化正規表現のコンパイルに失敗")
});

/// 連続する空白
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("空白正規表現のコンパイルに失敗"));

/// OCRテキストから会社名を抽出する
///
/// # 引数
/// * `text` - OCRで読み取られたテキスト
///
/// # 戻り値
/// 抽出された会社名。候補が見つからない場合は空文字列
///
/// # 選択順序
/// 1. 法人格サフィックス（Sp. z o.o.、S.A.、Ltd など）を含む最初の行
/// 2. 2語以上で各語が2文字以上の最初の行
/// 3. 除外パターンに該当しない最初の行
pub fn extract_company(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let candidates: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| !is_excluded(line))
        .collect();

    // 法人格サフィックスを含む行を最優先
    for line in &candidates {
        if LEGAL_SUFFIX_RES.iter().any(|re| re.is_match(line)) {
            return clean_company_name(line);
        }
    }

    // 複数語からなる行を次点とする
    for line in &candidates {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.len() >= 2 && words.iter().all(|word| word.chars().count() > 1) {
            return clean_company_name(line);
        }
    }

    // フォールバック: 除外されなかった最初の行
    candidates
        .first()
        .map(|line| clean_company_name(line))
        .unwrap_or_default()
}

/// 行が除外パターンに該当するかどうか
fn is_excluded(line: &str) -> bool {
    EXCLUSION_RES.iter().any(|re| re.is_match(line))
}

/// 会社名をクリーンアップし、OCRの誤読を修正する
///
/// # 引数
/// * `name` - 抽出された生の会社名
///
/// # 戻り値
/// 記号を除去し、法人格サフィックスを正規化した会社名
fn clean_company_name(name: &str) -> String {
    let cleaned = LEADING_SYMBOLS_RE.replace(name, "");
    let cleaned = TRAILING_SYMBOLS_RE.replace(&cleaned, "");

    // 誤読された法人格サフィックスを正準形に戻す
    let cleaned = SP_Z_OO_RE.replace_all(&cleaned, "Sp. z o.o. ");

    WHITESPACE_RE.replace_all(&cleaned, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_suffix_preferred() {
        let text = "ul. Marszałkowska 1\nEmpik Sp. z o.o.\nWarszawa";
        assert_eq!(extract_company(text), "Empik Sp. z o.o.");
    }

    #[test]
    fn test_garbled_sp_z_oo_normalized() {
        // OCRが "o.o." を "0.0" と誤読したケース
        let text = "Biedronka Sp. z 0.0\nPARAGON FISKALNY";
        assert_eq!(extract_company(text), "Biedronka Sp. z o.o.");

        // z→2 の誤読
        let text = "Żabka Sp. 2 o.0\ncośtam";
        assert_eq!(extract_company(text), "Żabka Sp. z o.o.");
    }

    #[test]
    fn test_exclusion_lines_skipped() {
        let text = "PARAGON FISKALNY\nNIP 123-456-78-90\n|||\nCCC S.A.\nSUMA PLN 99,99";
        assert_eq!(extract_company(text), "CCC S.A.");
    }

    #[test]
    fn test_multi_word_line_fallback() {
        // 法人格サフィックスなし。2語以上の行を採用する
        let text = "X\nSklep Spożywczy Kowalski\n123456";
        assert_eq!(extract_company(text), "Sklep Spożywczy Kowalski");
    }

    #[test]
    fn test_first_line_fallback() {
        // 複数語の行すらない場合は最初の非除外行
        let text = "Delikatesy\n12:30";
        assert_eq!(extract_company(text), "Delikatesy");
    }

    #[test]
    fn test_empty_when_all_excluded() {
        let text = "PARAGON\nNIP 123\n***";
        assert_eq!(extract_company(text), "");

        assert_eq!(extract_company(""), "");
    }

    #[test]
    fn test_symbols_trimmed_from_result() {
        let text = "~~Rossmann SD Sp. z o.o.~~";
        assert_eq!(extract_company(text), "Rossmann SD Sp. z o.o.");
    }
}
