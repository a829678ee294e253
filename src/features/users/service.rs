use crate::features::categories;
use crate::features::documents;
use crate::features::users::models::{User, UserData};
use crate::features::users::repository;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::security::hash_password;
use rusqlite::Connection;

/// ユーザー名の最小文字数
pub(crate) const USERNAME_MIN_LENGTH: usize = 3;
/// ユーザー名の最大文字数
pub(crate) const USERNAME_MAX_LENGTH: usize = 50;

/// ユーザーを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
///
/// # 戻り値
/// ユーザー、または失敗時はエラー
pub fn get(conn: &Connection, user_id: i64) -> AppResult<User> {
    repository::find_by_id(conn, user_id)
}

/// アカウント情報（ユーザー名・パスワード）を更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `username` - 新しいユーザー名（Noneの場合は変更しない）
/// * `password` - 新しい平文パスワード（Noneの場合は変更しない）
///
/// # 戻り値
/// 更新後のユーザー、または失敗時はエラー
///
/// # エラー
/// - `Validation` - 両方ともNone、またはユーザー名の形式が不正
/// - `Conflict` - 新しいユーザー名が既に使われている
pub fn update_account(
    conn: &Connection,
    user_id: i64,
    username: Option<&str>,
    password: Option<&str>,
) -> AppResult<User> {
    if username.is_none() && password.is_none() {
        return Err(AppError::validation(
            "ユーザー名とパスワードの両方が未指定です",
        ));
    }

    if let Some(new_username) = username {
        validate_username(new_username)?;

        // 他ユーザーとの重複チェック
        if let Some(existing) = repository::find_by_username(conn, new_username)? {
            if existing.id != user_id {
                return Err(AppError::conflict(format!(
                    "ユーザー名「{new_username}」は既に使われています"
                )));
            }
        }
    }

    let password_hash = password.map(hash_password);

    let user = repository::update(conn, user_id, username, password_hash.as_deref())?;
    log::info!("アカウント情報を更新しました: user_id={user_id}");

    Ok(user)
}

/// アカウントを削除する
///
/// 所有するドキュメント・カテゴリ・セッションも連鎖して削除される
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete_account(conn: &Connection, user_id: i64) -> AppResult<()> {
    repository::delete(conn, user_id)?;
    log::info!("アカウントを削除しました: user_id={user_id}");
    Ok(())
}

/// 集計・表示用のユーザーデータ一式を取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
///
/// # 戻り値
/// ドキュメント（カテゴリ付き）と全カテゴリのスナップショット、
/// または失敗時はエラー
pub fn get_user_data(conn: &Connection, user_id: i64) -> AppResult<UserData> {
    // ユーザーの存在確認
    repository::find_by_id(conn, user_id)?;

    let documents = documents::repository::find_by_user_with_categories(conn, user_id)?;
    let categories = categories::repository::find_by_user(conn, user_id)?;

    Ok(UserData {
        documents,
        categories,
    })
}

/// ユーザー名の形式を検証する
pub(crate) fn validate_username(username: &str) -> AppResult<()> {
    let length = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return Err(AppError::validation(format!(
            "ユーザー名は{USERNAME_MIN_LENGTH}〜{USERNAME_MAX_LENGTH}文字である必要があります"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::OTHER_CATEGORY_NAME;
    use crate::shared::database::create_in_memory_connection;
    use crate::shared::security::verify_password;

    fn setup_user(conn: &Connection, username: &str) -> i64 {
        let user = repository::create(
            conn,
            "test@example.com",
            username,
            &hash_password("password"),
        )
        .unwrap();
        categories::repository::create(conn, user.id, OTHER_CATEGORY_NAME).unwrap();
        user.id
    }

    #[test]
    fn test_update_account_requires_some_field() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn, "alice");

        let result = update_account(&conn, user_id, None, None);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_update_username() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn, "alice");

        let updated = update_account(&conn, user_id, Some("alicia"), None).unwrap();
        assert_eq!(updated.username, "alicia");
    }

    #[test]
    fn test_update_password_is_hashed() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn, "alice");

        let updated = update_account(&conn, user_id, None, Some("new secret")).unwrap();
        assert!(verify_password("new secret", &updated.password_hash));
        assert!(!verify_password("password", &updated.password_hash));
    }

    #[test]
    fn test_update_username_conflict() {
        let conn = create_in_memory_connection().unwrap();
        setup_user(&conn, "alice");
        let bob = setup_user(&conn, "bob");

        let result = update_account(&conn, bob, Some("alice"), None);
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // 自分の現在の名前への「変更」は許される
        update_account(&conn, bob, Some("bob"), None).unwrap();
    }

    #[test]
    fn test_update_invalid_username() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn, "alice");

        assert!(matches!(
            update_account(&conn, user_id, Some("ab"), None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_account_cascades() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn, "alice");

        delete_account(&conn, user_id).unwrap();

        let category_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM spending_categories WHERE user_id = ?1",
                rusqlite::params![user_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(category_count, 0);
    }

    #[test]
    fn test_get_user_data_snapshot() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn, "alice");

        let data = get_user_data(&conn, user_id).unwrap();
        assert!(data.documents.is_empty());
        assert_eq!(data.category_names(), vec![OTHER_CATEGORY_NAME]);
    }

    #[test]
    fn test_get_user_data_unknown_user() {
        let conn = create_in_memory_connection().unwrap();

        assert!(matches!(
            get_user_data(&conn, 999),
            Err(AppError::NotFound(_))
        ));
    }
}
