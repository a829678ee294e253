use crate::features::extraction::amount::extract_amount;
use crate::features::extraction::company::extract_company;
use crate::features::extraction::date::extract_date;
use crate::features::extraction::models::ExtractedFields;

/// OCRテキストからすべてのフィールドを抽出する
///
/// # 引数
/// * `text` - OCRで読み取られたテキスト
///
/// # 戻り値
/// 抽出されたフィールド一式
///
/// 各フィールドは独立して抽出され、失敗したフィールドだけが
/// デフォルト値になる。この関数は入力にかかわらずエラーを返さない
pub fn extract_fields(text: &str) -> ExtractedFields {
    let fields = ExtractedFields {
        amount: extract_amount(text),
        company: extract_company(text),
        date: extract_date(text),
    };

    log::debug!(
        "OCRフィールド抽出: amount={}, company={:?}, date={:?}",
        fields.amount,
        fields.company,
        fields.date
    );

    fields
}
