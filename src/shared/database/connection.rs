use crate::shared::errors::AppResult;
use rusqlite::Connection;
use std::path::Path;

/// データベース接続を初期化し、スキーマを準備する
///
/// # 引数
/// * `database_path` - データベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
///
/// # 処理内容
/// 1. データベース接続の開設
/// 2. 外部キー制約の有効化
/// 3. テーブル作成の実行
pub fn initialize_database<P: AsRef<Path>>(database_path: P) -> AppResult<Connection> {
    let conn = Connection::open(database_path.as_ref())?;

    // 外部キー制約を有効化（ユーザー削除時のカスケードに必要）
    conn.execute_batch("PRAGMA foreign_keys = ON")?;

    // テーブルを作成
    create_tables(&conn)?;

    log::info!(
        "データベースを初期化しました: {:?}",
        database_path.as_ref()
    );

    Ok(conn)
}

/// テスト用のインメモリデータベース接続を作成する
///
/// # 戻り値
/// スキーマ作成済みのインメモリ接続、または失敗時はエラー
pub fn create_in_memory_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON")?;
    create_tables(&conn)?;
    Ok(conn)
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    create_users_table(conn)?;
    create_spending_categories_table(conn)?;
    create_documents_table(conn)?;
    create_document_categories_table(conn)?;
    create_sessions_table(conn)?;

    // インデックスを作成
    create_indexes(conn)?;

    Ok(())
}

/// ユーザーテーブルを作成する
fn create_users_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// 支出カテゴリテーブルを作成する
///
/// カテゴリ名はユーザーごとに大文字小文字を区別せず一意
fn create_spending_categories_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS spending_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL COLLATE NOCASE,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, name)
        )",
        [],
    )?;

    Ok(())
}

/// ドキュメント（レシート・請求書）テーブルを作成する
fn create_documents_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            timestamp TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            ocr_text TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL DEFAULT '',
            amount REAL NOT NULL,
            company TEXT NOT NULL DEFAULT '',
            has_warranty INTEGER NOT NULL DEFAULT 0,
            warranty_months INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// ドキュメントとカテゴリの関連テーブルを作成する
///
/// カテゴリ側のカスケードはユーザー削除時の連鎖のためであり、
/// 「使用中カテゴリは削除不可」のルールはサービス層で強制する
fn create_document_categories_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS document_categories (
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES spending_categories(id) ON DELETE CASCADE,
            PRIMARY KEY (document_id, category_id)
        )",
        [],
    )?;

    Ok(())
}

/// セッションテーブルを作成する
fn create_sessions_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_user_id ON documents(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_timestamp ON documents(timestamp)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_spending_categories_user_id
         ON spending_categories(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_document_categories_category_id
         ON document_categories(category_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();

        // テーブル作成が成功することを確認
        let result = create_tables(&conn);
        assert!(result.is_ok());

        // 各テーブルが作成されていることを確認
        let tables = [
            "users",
            "spending_categories",
            "documents",
            "document_categories",
            "sessions",
        ];
        for table in &tables {
            let count: i64 = conn
                .query_row(
                    &format!(
                        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='{table}'"
                    ),
                    [],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "テーブル {table} が作成されていません");
        }
    }

    #[test]
    fn test_create_in_memory_connection() {
        let conn = create_in_memory_connection().unwrap();

        // 外部キー制約が有効になっていることを確認
        let fk_enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn test_category_name_unique_per_user_case_insensitive() {
        let conn = create_in_memory_connection().unwrap();

        conn.execute(
            "INSERT INTO users (email, username, password_hash, created_at)
             VALUES ('a@example.com', 'alice', 'hash', '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO spending_categories (user_id, name, created_at)
             VALUES (1, 'Groceries', '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();

        // 大文字小文字違いの同名カテゴリは一意制約に違反する
        let result = conn.execute(
            "INSERT INTO spending_categories (user_id, name, created_at)
             VALUES (1, 'GROCERIES', '2024-01-01T00:00:00+00:00')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_user_delete_cascades() {
        let conn = create_in_memory_connection().unwrap();

        conn.execute(
            "INSERT INTO users (email, username, password_hash, created_at)
             VALUES ('a@example.com', 'alice', 'hash', '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO spending_categories (user_id, name, created_at)
             VALUES (1, 'Other', '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO documents (user_id, timestamp, name, amount, created_at, updated_at)
             VALUES (1, '2024-01-02T00:00:00+00:00', 'Receipt', 10.0,
                     '2024-01-02T00:00:00+00:00', '2024-01-02T00:00:00+00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO document_categories (document_id, category_id) VALUES (1, 1)",
            [],
        )
        .unwrap();

        // ユーザー削除で所有データがすべて消えることを確認
        conn.execute("DELETE FROM users WHERE id = 1", []).unwrap();

        for table in ["spending_categories", "documents", "document_categories"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0, "{table} にカスケード削除されない行が残っています");
        }
    }
}
