use crate::features::categories::models::Category;
use crate::features::documents::models::DocumentWithCategories;
use serde::{Deserialize, Serialize};

/// ユーザーデータモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    /// 資格情報ハッシュ（外部へのレスポンスには含めない）
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

/// 集計・表示に使うユーザーデータの完全なスナップショット
///
/// ドキュメント（カテゴリ付き）と全カテゴリの一覧。
/// 認可チェック済みの状態で取得され、分析モジュールの入力になる
#[derive(Debug, Serialize, Clone)]
pub struct UserData {
    pub documents: Vec<DocumentWithCategories>,
    pub categories: Vec<Category>,
}

impl UserData {
    /// カテゴリ名の一覧を取得する（カテゴリの並び順を保つ）
    pub fn category_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|category| category.name.clone())
            .collect()
    }
}
