use crate::features::auth::models::{LoginResult, RegisterRequest, Session};
use crate::features::auth::repository;
use crate::features::auth::token::SessionTokenCipher;
use crate::features::categories;
use crate::features::categories::models::OTHER_CATEGORY_NAME;
use crate::features::users;
use crate::features::users::models::User;
use crate::shared::config::SessionConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::security::{hash_password, verify_password};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

/// メールアドレスの形式チェック
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("メールアドレス正規表現のコンパイルに失敗")
});

/// 認証サービス
///
/// アカウント登録・ログイン・セッション検証を提供する。
/// 認可が必要なすべての操作は、このサービスが検証したセッションの
/// ユーザーIDを明示的に受け取って実行する（プロセス全体で共有する
/// 可変の認証状態は持たない）
#[derive(Clone)]
pub struct AuthService {
    /// セッショントークンの暗号器
    cipher: SessionTokenCipher,
}

impl AuthService {
    /// 新しいAuthServiceを作成する
    ///
    /// # 引数
    /// * `encryption_key` - セッショントークン暗号化用のキー
    ///
    /// # 戻り値
    /// AuthServiceインスタンス
    pub fn new(encryption_key: &str) -> Self {
        Self {
            cipher: SessionTokenCipher::new(encryption_key),
        }
    }

    /// セッション設定からAuthServiceを作成する
    ///
    /// # 引数
    /// * `config` - 環境変数から読み込まれたセッション設定
    ///
    /// # 戻り値
    /// AuthServiceインスタンス
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.session_encryption_key)
    }

    /// アカウントを登録する
    ///
    /// # 引数
    /// * `conn` - データベース接続
    /// * `request` - 登録リクエスト
    ///
    /// # 戻り値
    /// 作成されたユーザー、または失敗時はエラー
    ///
    /// # エラー
    /// - `Validation` - メールアドレス・ユーザー名・パスワードの形式が不正
    /// - `Conflict` - ユーザー名が既に使われている
    ///
    /// 登録時に既定カテゴリ「Other」が自動的に作成される
    pub fn register(&self, conn: &Connection, request: &RegisterRequest) -> AppResult<User> {
        validate_email(&request.email)?;
        users::service::validate_username(&request.username)?;

        if request.password.is_empty() {
            return Err(AppError::validation("パスワードが未指定です"));
        }

        if users::repository::find_by_username(conn, &request.username)?.is_some() {
            return Err(AppError::conflict(format!(
                "ユーザー名「{}」は既に使われています",
                request.username
            )));
        }

        let password_hash = hash_password(&request.password);

        let tx = conn.unchecked_transaction()?;
        let user = users::repository::create(&tx, &request.email, &request.username, &password_hash)?;

        // 新規ユーザーの既定カテゴリ「Other」を自動作成する
        categories::repository::create(&tx, user.id, OTHER_CATEGORY_NAME)?;
        tx.commit()?;

        log::info!(
            "アカウントを登録しました: user_id={}, username={}",
            user.id,
            user.username
        );

        Ok(user)
    }

    /// ログインしてセッショントークンを発行する
    ///
    /// # 引数
    /// * `conn` - データベース接続
    /// * `username` - ユーザー名
    /// * `password` - 平文パスワード
    ///
    /// # 戻り値
    /// ユーザー情報と発行済みトークン、または失敗時はエラー
    ///
    /// ユーザー名の存在とパスワードの不一致は区別せず、同じ
    /// セキュリティエラーとして返す
    pub fn login(&self, conn: &Connection, username: &str, password: &str) -> AppResult<LoginResult> {
        let user = users::repository::find_by_username(conn, username)?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash) {
            log::warn!("ログイン失敗: username={username}");
            return Err(invalid_credentials());
        }

        let session = repository::create(conn, user.id)?;
        let token = self.cipher.encrypt(&session.id)?;

        log::info!("ログインしました: user_id={}", user.id);

        Ok(LoginResult { user, token })
    }

    /// セッショントークンを検証する
    ///
    /// # 引数
    /// * `conn` - データベース接続
    /// * `token` - 暗号化されたセッショントークン
    ///
    /// # 戻り値
    /// 検証されたセッション、または失敗時はエラー
    ///
    /// 期限切れのセッションは検証時に削除される
    pub fn authenticate(&self, conn: &Connection, token: &str) -> AppResult<Session> {
        let session_id = self.cipher.decrypt(token)?;

        let session = repository::find_by_id(conn, &session_id)?
            .ok_or_else(|| AppError::security("セッションが見つかりません"))?;

        if session.is_expired(Utc::now()) {
            // 期限切れセッションを削除
            repository::delete(conn, &session.id)?;
            return Err(AppError::security("セッションが期限切れです"));
        }

        log::debug!(
            "セッションを検証しました: user_id={}, session_id={}",
            session.user_id,
            session.id
        );

        Ok(session)
    }

    /// セッショントークンから認証済みユーザーを取得する
    ///
    /// # 引数
    /// * `conn` - データベース接続
    /// * `token` - 暗号化されたセッショントークン
    ///
    /// # 戻り値
    /// 認証済みユーザー、または失敗時はエラー
    pub fn current_user(&self, conn: &Connection, token: &str) -> AppResult<User> {
        let session = self.authenticate(conn, token)?;
        users::repository::find_by_id(conn, session.user_id)
    }

    /// ログアウトしてセッションを無効化する
    ///
    /// # 引数
    /// * `conn` - データベース接続
    /// * `token` - 暗号化されたセッショントークン
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー
    pub fn logout(&self, conn: &Connection, token: &str) -> AppResult<()> {
        let session_id = self.cipher.decrypt(token)?;
        repository::delete(conn, &session_id)
    }

    /// 期限切れセッションをクリーンアップする
    ///
    /// # 引数
    /// * `conn` - データベース接続
    ///
    /// # 戻り値
    /// 削除されたセッション数、または失敗時はエラー
    pub fn cleanup_expired_sessions(&self, conn: &Connection) -> AppResult<usize> {
        repository::delete_expired(conn)
    }

    /// ユーザーのすべてのセッションを無効化する
    ///
    /// # 引数
    /// * `conn` - データベース接続
    /// * `user_id` - ユーザーID
    ///
    /// # 戻り値
    /// 削除されたセッション数、または失敗時はエラー
    pub fn invalidate_user_sessions(&self, conn: &Connection, user_id: i64) -> AppResult<usize> {
        repository::delete_for_user(conn, user_id)
    }
}

/// 資格情報不一致のエラー
fn invalid_credentials() -> AppError {
    AppError::security("ユーザー名またはパスワードが正しくありません")
}

/// メールアドレスの形式を検証する
fn validate_email(email: &str) -> AppResult<()> {
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::validation("メールアドレスの形式が不正です"));
    }
    Ok(())
}
