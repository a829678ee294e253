use crate::features::categories;
use crate::features::documents::models::{
    CreateDocumentRequest, Document, DocumentWithCategories, UpdateDocumentRequest,
};
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

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

/// 行からドキュメントを組み立てる
fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let timestamp: String = row.get(2)?;

    Ok(Document {
        id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp: timestamp_from_column(2, timestamp)?,
        name: row.get(3)?,
        description: row.get(4)?,
        ocr_text: row.get(5)?,
        image_url: row.get(6)?,
        amount: row.get(7)?,
        company: row.get(8)?,
        has_warranty: row.get(9)?,
        warranty_months: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// ドキュメント取得に使う共通のSELECT句
const SELECT_COLUMNS: &str = "SELECT id, user_id, timestamp, name, description, ocr_text,
        image_url, amount, company, has_warranty, warranty_months, created_at, updated_at
 FROM documents";

/// ドキュメントを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 所有ユーザーID
/// * `request` - 作成リクエスト
///
/// # 戻り値
/// 作成されたドキュメント、または失敗時はエラー
pub fn create(
    conn: &Connection,
    user_id: i64,
    request: &CreateDocumentRequest,
) -> AppResult<Document> {
    let now = Utc::now().to_rfc3339();

    // 保証がないドキュメントには保証期間を持たせない
    let warranty_months = if request.has_warranty {
        request.warranty_months
    } else {
        None
    };

    conn.execute(
        "INSERT INTO documents
         (user_id, timestamp, name, description, ocr_text, image_url, amount, company,
          has_warranty, warranty_months, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            user_id,
            request.timestamp.to_rfc3339(),
            request.name,
            request.description,
            request.ocr_text,
            request.image_url,
            request.amount,
            request.company,
            request.has_warranty,
            warranty_months,
            now,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)
}

/// IDでドキュメントを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - ドキュメントID
///
/// # 戻り値
/// ドキュメント、または失敗時はエラー
pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Document> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id],
        document_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("ドキュメント"),
        _ => AppError::from(e),
    })
}

/// ユーザーの全ドキュメントを取得する（取引日時の昇順）
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 所有ユーザーID
///
/// # 戻り値
/// ドキュメントのリスト、または失敗時はエラー
pub fn find_by_user(conn: &Connection, user_id: i64) -> AppResult<Vec<Document>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY timestamp"
    ))?;

    let documents = stmt.query_map(params![user_id], document_from_row)?;

    documents
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// ユーザーの全ドキュメントをカテゴリ付きで取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 所有ユーザーID
///
/// # 戻り値
/// カテゴリ付きドキュメントのリスト、または失敗時はエラー
pub fn find_by_user_with_categories(
    conn: &Connection,
    user_id: i64,
) -> AppResult<Vec<DocumentWithCategories>> {
    let documents = find_by_user(conn, user_id)?;

    documents
        .into_iter()
        .map(|document| {
            let document_categories = categories::repository::find_by_document(conn, document.id)?;
            Ok(DocumentWithCategories {
                document,
                categories: document_categories,
            })
        })
        .collect()
}

/// カテゴリに関連付けられたドキュメントを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `category_id` - カテゴリID
///
/// # 戻り値
/// ドキュメントのリスト、または失敗時はエラー
pub fn find_by_category(conn: &Connection, category_id: i64) -> AppResult<Vec<Document>> {
    let mut stmt = conn.prepare(
        "SELECT d.id, d.user_id, d.timestamp, d.name, d.description, d.ocr_text,
                d.image_url, d.amount, d.company, d.has_warranty, d.warranty_months,
                d.created_at, d.updated_at
         FROM documents d
         JOIN document_categories dc ON dc.document_id = d.id
         WHERE dc.category_id = ?1
         ORDER BY d.timestamp",
    )?;

    let documents = stmt.query_map(params![category_id], document_from_row)?;

    documents
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

/// ドキュメントを更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - ドキュメントID
/// * `request` - 更新リクエスト
/// * `image_url` - 保存する画像参照（空文字列の扱いはサービス層で解決済み）
///
/// # 戻り値
/// 更新後のドキュメント、または失敗時はエラー
pub fn update(
    conn: &Connection,
    id: i64,
    request: &UpdateDocumentRequest,
    image_url: &str,
) -> AppResult<Document> {
    let now = Utc::now().to_rfc3339();

    // 保証がないドキュメントには保証期間を持たせない
    let warranty_months = if request.has_warranty {
        request.warranty_months
    } else {
        None
    };

    let affected_rows = conn.execute(
        "UPDATE documents SET
            timestamp = ?1, name = ?2, description = ?3, ocr_text = ?4, image_url = ?5,
            amount = ?6, company = ?7, has_warranty = ?8, warranty_months = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            request.timestamp.to_rfc3339(),
            request.name,
            request.description,
            request.ocr_text,
            image_url,
            request.amount,
            request.company,
            request.has_warranty,
            warranty_months,
            now,
            id,
        ],
    )?;

    if affected_rows == 0 {
        return Err(AppError::not_found("ドキュメント"));
    }

    find_by_id(conn, id)
}

/// ドキュメントを削除する
///
/// カテゴリとの関連は外部キー制約で連鎖削除される
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - ドキュメントID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    let affected_rows = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;

    if affected_rows == 0 {
        return Err(AppError::not_found("ドキュメント"));
    }

    Ok(())
}

/// ドキュメントにカテゴリを関連付ける
///
/// # 引数
/// * `conn` - データベース接続
/// * `document_id` - ドキュメントID
/// * `category_id` - カテゴリID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn attach_category(conn: &Connection, document_id: i64, category_id: i64) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO document_categories (document_id, category_id) VALUES (?1, ?2)",
        params![document_id, category_id],
    )?;

    Ok(())
}

/// ドキュメントからすべてのカテゴリ関連を外す
///
/// # 引数
/// * `conn` - データベース接続
/// * `document_id` - ドキュメントID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn detach_all_categories(conn: &Connection, document_id: i64) -> AppResult<()> {
    conn.execute(
        "DELETE FROM document_categories WHERE document_id = ?1",
        params![document_id],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::create_in_memory_connection;
    use chrono::TimeZone;

    fn setup_user(conn: &Connection) -> i64 {
        conn.execute(
            "INSERT INTO users (email, username, password_hash, created_at)
             VALUES ('a@example.com', 'alice', 'hash', '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    fn sample_request(day: u32) -> CreateDocumentRequest {
        CreateDocumentRequest {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            name: "Receipt".to_string(),
            description: "Weekly shopping".to_string(),
            ocr_text: "SUMA PLN 45,00".to_string(),
            image_url: "https://storage.example.com/r/1".to_string(),
            amount: 45.0,
            company: "Biedronka".to_string(),
            has_warranty: false,
            warranty_months: None,
            category_ids: Vec::new(),
        }
    }

    #[test]
    fn test_create_and_find_roundtrip() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn);

        let document = create(&conn, user_id, &sample_request(15)).unwrap();
        assert_eq!(document.amount, 45.0);
        assert_eq!(
            document.timestamp,
            Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
        );

        let found = find_by_id(&conn, document.id).unwrap();
        assert_eq!(found, document);
    }

    #[test]
    fn test_warranty_months_not_stored_without_warranty() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn);

        // 保証なしのリクエストに期間が紛れ込んでいても保存されない
        let mut request = sample_request(15);
        request.warranty_months = Some(6);
        let document = create(&conn, user_id, &request).unwrap();
        assert_eq!(document.warranty_months, None);

        // 更新でも同様に正規化される
        let update_request = UpdateDocumentRequest {
            timestamp: request.timestamp,
            name: request.name.clone(),
            description: request.description.clone(),
            ocr_text: request.ocr_text.clone(),
            image_url: request.image_url.clone(),
            amount: request.amount,
            company: request.company.clone(),
            has_warranty: false,
            warranty_months: Some(3),
            category_ids: Vec::new(),
        };
        let updated = update(&conn, document.id, &update_request, &request.image_url).unwrap();
        assert_eq!(updated.warranty_months, None);
    }

    #[test]
    fn test_find_by_user_ordered_by_timestamp() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn);

        create(&conn, user_id, &sample_request(20)).unwrap();
        create(&conn, user_id, &sample_request(5)).unwrap();
        create(&conn, user_id, &sample_request(12)).unwrap();

        let documents = find_by_user(&conn, user_id).unwrap();
        let days: Vec<u32> = documents
            .iter()
            .map(|d| chrono::Datelike::day(&d.timestamp))
            .collect();
        assert_eq!(days, vec![5, 12, 20]);
    }

    #[test]
    fn test_attach_and_detach_categories() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn);
        let document = create(&conn, user_id, &sample_request(15)).unwrap();
        let category = categories::repository::create(&conn, user_id, "Groceries").unwrap();

        attach_category(&conn, document.id, category.id).unwrap();
        // 二重の関連付けは黙って無視される
        attach_category(&conn, document.id, category.id).unwrap();

        let with_categories = find_by_user_with_categories(&conn, user_id).unwrap();
        assert_eq!(with_categories.len(), 1);
        assert_eq!(with_categories[0].categories.len(), 1);
        assert_eq!(with_categories[0].categories[0].name, "Groceries");

        detach_all_categories(&conn, document.id).unwrap();
        let with_categories = find_by_user_with_categories(&conn, user_id).unwrap();
        assert!(with_categories[0].categories.is_empty());
    }

    #[test]
    fn test_update_document() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn);
        let document = create(&conn, user_id, &sample_request(15)).unwrap();

        let update_request = UpdateDocumentRequest {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 16, 9, 0, 0).unwrap(),
            name: "Updated receipt".to_string(),
            description: String::new(),
            ocr_text: String::new(),
            image_url: String::new(),
            amount: 60.0,
            company: "Lidl".to_string(),
            has_warranty: true,
            warranty_months: Some(12),
            category_ids: Vec::new(),
        };

        let updated = update(&conn, document.id, &update_request, "kept-url").unwrap();
        assert_eq!(updated.name, "Updated receipt");
        assert_eq!(updated.amount, 60.0);
        assert_eq!(updated.image_url, "kept-url");
        assert_eq!(updated.warranty_months, Some(12));
    }

    #[test]
    fn test_delete_document_cascades_join_rows() {
        let conn = create_in_memory_connection().unwrap();
        let user_id = setup_user(&conn);
        let document = create(&conn, user_id, &sample_request(15)).unwrap();
        let category = categories::repository::create(&conn, user_id, "Groceries").unwrap();
        attach_category(&conn, document.id, category.id).unwrap();

        delete(&conn, document.id).unwrap();

        let join_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM document_categories WHERE document_id = ?1",
                params![document.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(join_count, 0);

        // カテゴリ自体は残る
        assert!(categories::repository::find_by_id(&conn, category.id).is_ok());
    }

    #[test]
    fn test_not_found_errors() {
        let conn = create_in_memory_connection().unwrap();

        assert!(matches!(find_by_id(&conn, 999), Err(AppError::NotFound(_))));
        assert!(matches!(delete(&conn, 999), Err(AppError::NotFound(_))));
    }
}
