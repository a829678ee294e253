use crate::features::auth::models::Session;
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};

/// セッションの有効期間（日数）
const SESSION_LIFETIME_DAYS: i64 = 30;

/// 行からセッションを組み立てる
fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let expires_at: String = row.get(2)?;
    let created_at: String = row.get(3)?;

    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        expires_at: timestamp_from_column(2, expires_at)?,
        created_at: timestamp_from_column(3, created_at)?,
    })
}

/// RFC3339形式のカラム値を日時として読み取る
fn timestamp_from_column(index: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_e| {
            rusqlite::Error::InvalidColumnType(
                index,
                "timestamp".to_string(),
                rusqlite::types::Type::Text,
            )
        })
}

/// セッションを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
///
/// # 戻り値
/// 作成されたセッション、または失敗時はエラー
pub fn create(conn: &Connection, user_id: i64) -> AppResult<Session> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();
    let expires_at = now + Duration::days(SESSION_LIFETIME_DAYS);

    conn.execute(
        "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            session_id,
            user_id,
            expires_at.to_rfc3339(),
            now.to_rfc3339()
        ],
    )?;

    log::info!("セッションを作成しました: user_id={user_id}, session_id={session_id}");

    Ok(Session {
        id: session_id,
        user_id,
        expires_at,
        created_at: now,
    })
}

/// IDでセッションを探す
///
/// # 引数
/// * `conn` - データベース接続
/// * `session_id` - セッションID
///
/// # 戻り値
/// 見つかったセッション（存在しない場合はNone）、または失敗時はエラー
pub fn find_by_id(conn: &Connection, session_id: &str) -> AppResult<Option<Session>> {
    match conn.query_row(
        "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?1",
        params![session_id],
        session_from_row,
    ) {
        Ok(session) => Ok(Some(session)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::from(e)),
    }
}

/// セッションを削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `session_id` - セッションID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete(conn: &Connection, session_id: &str) -> AppResult<()> {
    let affected_rows = conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;

    if affected_rows > 0 {
        log::info!("セッションを無効化しました: session_id={session_id}");
    } else {
        log::warn!("無効化対象のセッションが見つかりませんでした: session_id={session_id}");
    }

    Ok(())
}

/// 期限切れセッションをすべて削除する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 削除されたセッション数、または失敗時はエラー
pub fn delete_expired(conn: &Connection) -> AppResult<usize> {
    let now = Utc::now();

    let affected_rows = conn.execute(
        "DELETE FROM sessions WHERE expires_at < ?1",
        params![now.to_rfc3339()],
    )?;

    if affected_rows > 0 {
        log::info!("期限切れセッションを{affected_rows}件削除しました");
    }

    Ok(affected_rows)
}

/// ユーザーのすべてのセッションを削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - ユーザーID
///
/// # 戻り値
/// 削除されたセッション数、または失敗時はエラー
pub fn delete_for_user(conn: &Connection, user_id: i64) -> AppResult<usize> {
    let affected_rows =
        conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;

    log::info!("ユーザー{user_id}のセッションを{affected_rows}件無効化しました");
    Ok(affected_rows)
}
