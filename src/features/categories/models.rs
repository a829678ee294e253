use serde::{Deserialize, Serialize};

/// 削除・改名が保護される既定カテゴリの名前
///
/// ユーザー登録時に自動作成され、カテゴリ未選択のドキュメントの
/// フォールバック先になる
pub const OTHER_CATEGORY_NAME: &str = "Other";

/// 支出カテゴリデータモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: String,
}

impl Category {
    /// 保護された既定カテゴリ（"Other"）かどうか
    pub fn is_protected(&self) -> bool {
        self.name == OTHER_CATEGORY_NAME
    }
}
