use crate::features::categories::models::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ドキュメント（レシート・請求書）データモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub user_id: i64,
    /// 取引日時
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub description: String,
    /// OCRで読み取られた生テキスト
    pub ocr_text: String,
    /// 画像への参照（ストレージ上のURL）
    pub image_url: String,
    /// 支出額（正の実数）
    pub amount: f64,
    pub company: String,
    /// 保証の有無
    pub has_warranty: bool,
    /// 保証期間（月数）。has_warrantyがfalseの場合は必ずNone
    pub warranty_months: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// 関連カテゴリ付きのドキュメント
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentWithCategories {
    #[serde(flatten)]
    pub document: Document,
    pub categories: Vec<Category>,
}

/// ドキュメント作成リクエスト
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentRequest {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub ocr_text: String,
    pub image_url: String,
    pub amount: f64,
    pub company: String,
    pub has_warranty: bool,
    pub warranty_months: Option<i64>,
    /// 関連付けるカテゴリID。空の場合は「Other」が割り当てられる
    pub category_ids: Vec<i64>,
}

/// ドキュメント更新リクエスト
///
/// image_urlが空文字列の場合は保存済みの画像参照を保持する
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocumentRequest {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub ocr_text: String,
    pub image_url: String,
    pub amount: f64,
    pub company: String,
    pub has_warranty: bool,
    pub warranty_months: Option<i64>,
    /// 関連付けるカテゴリID（全置換）。空の場合は「Other」が割り当てられる
    pub category_ids: Vec<i64>,
}
