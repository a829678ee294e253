use crate::features::users::models::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// セッション情報を表す構造体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// セッションID
    pub id: String,
    /// ユーザーID
    pub user_id: i64,
    /// 有効期限
    pub expires_at: DateTime<Utc>,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// セッションが期限切れかどうか
    ///
    /// # 引数
    /// * `now` - 現在時刻
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// アカウント登録リクエスト
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// ログイン成功時の結果（ユーザー情報と発行済みトークン）
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: User,
    /// 暗号化されたセッショントークン。以降のリクエストで提示する
    pub token: String,
}
