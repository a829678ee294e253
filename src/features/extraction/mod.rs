/// OCRフィールド抽出機能モジュール
///
/// このモジュールはOCRで読み取られたレシート・請求書のテキストから
/// 構造化されたフィールドを抽出します：
/// - 金額（合計キーワードまたは通貨記号に隣接する数値）
/// - 会社名（法人格サフィックスを優先するヒューリスティック）
/// - 日付（キーワード近傍を優先する複数形式の探索）
///
/// 抽出は純粋な計算であり、失敗した場合は各フィールドが独立に
/// デフォルト値へ退避します。エラーは発生しません
// サブモジュールの宣言
mod amount;
mod company;
mod date;
pub mod models;
pub mod service;

// モデル
pub use models::ExtractedFields;

// 個別フィールドの抽出関数
pub use amount::extract_amount;
pub use company::extract_company;
pub use date::extract_date;

// サービス（全フィールド一括抽出）
pub use service::extract_fields;
