use crate::features::users::models::User;
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, Row};

/// 行からユーザーを組み立てる
fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// ユーザーを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `email` - メールアドレス
/// * `username` - ユーザー名
/// * `password_hash` - ハッシュ化済みパスワード
///
/// # 戻り値
/// 作成されたユーザー、または失敗時はエラー
pub fn create(
    conn: &Connection,
    email: &str,
    username: &str,
    password_hash: &str,
) -> AppResult<User> {
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO users (email, username, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![email, username, password_hash, now],
    )?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)
}

/// IDでユーザーを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - ユーザーID
///
/// # 戻り値
/// ユーザー、または失敗時はエラー
pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<User> {
    conn.query_row(
        "SELECT id, email, username, password_hash, created_at FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("ユーザー"),
        _ => AppError::from(e),
    })
}

/// ユーザー名でユーザーを探す
///
/// # 引数
/// * `conn` - データベース接続
/// * `username` - ユーザー名
///
/// # 戻り値
/// 見つかったユーザー（存在しない場合はNone）、または失敗時はエラー
pub fn find_by_username(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    match conn.query_row(
        "SELECT id, email, username, password_hash, created_at FROM users WHERE username = ?1",
        params![username],
        user_from_row,
    ) {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::from(e)),
    }
}

/// ユーザーのアカウント情報を更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - ユーザーID
/// * `username` - 新しいユーザー名（Noneの場合は変更しない）
/// * `password_hash` - 新しいパスワードハッシュ（Noneの場合は変更しない）
///
/// # 戻り値
/// 更新後のユーザー、または失敗時はエラー
pub fn update(
    conn: &Connection,
    id: i64,
    username: Option<&str>,
    password_hash: Option<&str>,
) -> AppResult<User> {
    let existing = find_by_id(conn, id)?;

    let username = username.unwrap_or(&existing.username);
    let password_hash = password_hash.unwrap_or(&existing.password_hash);

    conn.execute(
        "UPDATE users SET username = ?1, password_hash = ?2 WHERE id = ?3",
        params![username, password_hash, id],
    )?;

    find_by_id(conn, id)
}

/// ユーザーを削除する
///
/// 所有するドキュメント・カテゴリ・セッションは外部キー制約で連鎖削除される
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - ユーザーID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    let affected_rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;

    if affected_rows == 0 {
        return Err(AppError::not_found("ユーザー"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::create_in_memory_connection;

    #[test]
    fn test_create_and_find_user() {
        let conn = create_in_memory_connection().unwrap();

        let user = create(&conn, "alice@example.com", "alice", "hash").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");

        let found = find_by_id(&conn, user.id).unwrap();
        assert_eq!(found, user);
    }

    #[test]
    fn test_find_by_username() {
        let conn = create_in_memory_connection().unwrap();
        create(&conn, "alice@example.com", "alice", "hash").unwrap();

        assert!(find_by_username(&conn, "alice").unwrap().is_some());
        assert!(find_by_username(&conn, "bob").unwrap().is_none());
    }

    #[test]
    fn test_username_unique() {
        let conn = create_in_memory_connection().unwrap();
        create(&conn, "alice@example.com", "alice", "hash").unwrap();

        // 同じユーザー名での作成は一意制約に違反する
        let result = create(&conn, "other@example.com", "alice", "hash");
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn test_partial_update() {
        let conn = create_in_memory_connection().unwrap();
        let user = create(&conn, "alice@example.com", "alice", "hash").unwrap();

        // ユーザー名のみ更新
        let updated = update(&conn, user.id, Some("alicia"), None).unwrap();
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.password_hash, "hash");

        // パスワードのみ更新
        let updated = update(&conn, user.id, None, Some("newhash")).unwrap();
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.password_hash, "newhash");
    }

    #[test]
    fn test_delete_user() {
        let conn = create_in_memory_connection().unwrap();
        let user = create(&conn, "alice@example.com", "alice", "hash").unwrap();

        delete(&conn, user.id).unwrap();
        assert!(matches!(
            find_by_id(&conn, user.id),
            Err(AppError::NotFound(_))
        ));

        // 2回目の削除はNotFound
        assert!(matches!(delete(&conn, user.id), Err(AppError::NotFound(_))));
    }
}
