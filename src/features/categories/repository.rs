use crate::features::categories::models::Category;
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, Row};

/// 行からカテゴリを組み立てる
fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// カテゴリを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 所有ユーザーID
/// * `name` - カテゴリ名
///
/// # 戻り値
/// 作成されたカテゴリ、または失敗時はエラー
pub fn create(conn: &Connection, user_id: i64, name: &str) -> AppResult<Category> {
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO spending_categories (user_id, name, created_at) VALUES (?1, ?2, ?3)",
        params![user_id, name, now],
    )?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)
}

/// IDでカテゴリを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - カテゴリID
///
/// # 戻り値
/// カテゴリ、または失敗時はエラー
pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Category> {
    conn.query_row(
        "SELECT id, user_id, name, created_at FROM spending_categories WHERE id = ?1",
        params![id],
        category_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("カテゴリ"),
        _ => AppError::from(e),
    })
}

/// ユーザーの全カテゴリを取得する（作成順）
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 所有ユーザーID
///
/// # 戻り値
/// カテゴリのリスト、または失敗時はエラー
///
/// 並び順はチャートの色割り当ての基準になるため、ID昇順で安定させる
pub fn find_by_user(conn: &Connection, user_id: i64) -> AppResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, created_at FROM spending_categories
         WHERE user_id = ?1 ORDER BY id",
    )?;

    let categories = stmt.query_map(params![user_id], category_from_row)?;

    categories
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// 名前でカテゴリを探す（大文字小文字は区別しない）
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 所有ユーザーID
/// * `name` - カテゴリ名
///
/// # 戻り値
/// 見つかったカテゴリ（存在しない場合はNone）、または失敗時はエラー
pub fn find_by_name(conn: &Connection, user_id: i64, name: &str) -> AppResult<Option<Category>> {
    // nameカラムはCOLLATE NOCASEで定義されているため、比較は大文字小文字を無視する
    match conn.query_row(
        "SELECT id, user_id, name, created_at FROM spending_categories
         WHERE user_id = ?1 AND name = ?2",
        params![user_id, name],
        category_from_row,
    ) {
        Ok(category) => Ok(Some(category)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::from(e)),
    }
}

/// カテゴリ名を変更する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - カテゴリID
/// * `name` - 新しいカテゴリ名
///
/// # 戻り値
/// 更新後のカテゴリ、または失敗時はエラー
pub fn rename(conn: &Connection, id: i64, name: &str) -> AppResult<Category> {
    let affected_rows = conn.execute(
        "UPDATE spending_categories SET name = ?1 WHERE id = ?2",
        params![name, id],
    )?;

    if affected_rows == 0 {
        return Err(AppError::not_found("カテゴリ"));
    }

    find_by_id(conn, id)
}

/// カテゴリを削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - カテゴリID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    let affected_rows = conn.execute(
        "DELETE FROM spending_categories WHERE id = ?1",
        params![id],
    )?;

    if affected_rows == 0 {
        return Err(AppError::not_found("カテゴリ"));
    }

    Ok(())
}

/// カテゴリを参照しているドキュメントの数を数える
///
/// # 引数
/// * `conn` - データベース接続
/// * `category_id` - カテゴリID
///
/// # 戻り値
/// 参照ドキュメント数、または失敗時はエラー
pub fn document_count(conn: &Connection, category_id: i64) -> AppResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM document_categories WHERE category_id = ?1",
        params![category_id],
        |row| row.get(0),
    )
    .map_err(AppError::from)
}

/// ドキュメントに関連付けられたカテゴリを取得する（ID昇順）
///
/// # 引数
/// * `conn` - データベース接続
/// * `document_id` - ドキュメントID
///
/// # 戻り値
/// カテゴリのリスト、または失敗時はエラー
pub fn find_by_document(conn: &Connection, document_id: i64) -> AppResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.user_id, c.name, c.created_at
         FROM spending_categories c
         JOIN document_categories dc ON dc.category_id = c.id
         WHERE dc.document_id = ?1
         ORDER BY c.id",
    )?;

    let categories = stmt.query_map(params![document_id], category_from_row)?;

    categories
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}
