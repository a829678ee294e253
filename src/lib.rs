//! QuikChek バックエンドコア
//!
//! レシート・請求書の画像から支出を記録し、カテゴリ別に分析する
//! 経費管理アプリケーションのサービス層。OCRテキストからのフィールド
//! 抽出、カテゴリ別集計、時系列・期間比較の構築、および所有チェック
//! 付きのCRUD操作を提供する。HTTPルーティングや画像ストレージなどの
//! 外部インターフェースはこのクレートの外側で組み合わせる

pub mod features;
pub mod shared;

use log::{error, info};
use rusqlite::Connection;
use shared::config;
use shared::errors::AppResult;
use std::path::Path;
use std::sync::Mutex;

/// アプリケーション状態（データベース接続を保持）
pub struct AppState {
    pub db: Mutex<Connection>,
}

/// アプリケーションを初期化する
///
/// # 戻り値
/// 初期化済みのアプリケーション状態、または失敗時はエラー
///
/// # 処理内容
/// 1. 環境変数の読み込み（.envファイルがある場合）
/// 2. データディレクトリとデータベースパスの決定
/// 3. データベースの初期化（スキーマ作成を含む）
pub fn initialize() -> AppResult<AppState> {
    info!("アプリケーション初期化を開始します...");

    // 環境変数を読み込み（.envファイルがある場合）
    config::load_environment_variables();

    // データディレクトリとデータベースパスを決定
    let init_result = config::initialize_application()?;

    let state = initialize_with_database_path(&init_result.database_path)?;

    config::log_initialization_complete(&init_result);

    Ok(state)
}

/// 指定されたデータベースパスでアプリケーションを初期化する
///
/// # 引数
/// * `database_path` - データベースファイルのパス
///
/// # 戻り値
/// 初期化済みのアプリケーション状態、または失敗時はエラー
pub fn initialize_with_database_path<P: AsRef<Path>>(database_path: P) -> AppResult<AppState> {
    info!("データベースを初期化しています...");

    let db_conn = shared::database::initialize_database(database_path).map_err(|e| {
        error!("データベースの初期化に失敗しました: {e}");
        e
    })?;

    info!("データベースの初期化が完了しました");

    Ok(AppState {
        db: Mutex::new(db_conn),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::analytics;
    use crate::features::auth::{AuthService, RegisterRequest};
    use crate::features::categories;
    use crate::features::documents;
    use crate::features::documents::models::CreateDocumentRequest;
    use chrono::{Duration, Utc};

    #[test]
    fn test_initialize_with_database_path() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test_quikchek.db");

        let state = initialize_with_database_path(&db_path).unwrap();

        // データベースファイルが作成されている
        assert!(db_path.exists());

        // スキーマが作成済みで、そのまま操作できる
        let conn = state.db.lock().unwrap();
        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='documents'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 1);
    }

    #[test]
    fn test_end_to_end_flow() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("e2e_quikchek.db");
        let state = initialize_with_database_path(&db_path).unwrap();
        let conn = state.db.lock().unwrap();

        // 登録とログイン
        let auth = AuthService::new("test_encryption_key_32_bytes_long");
        let user = auth
            .register(
                &conn,
                &RegisterRequest {
                    email: "alice@example.com".to_string(),
                    username: "alice".to_string(),
                    password: "secret password".to_string(),
                },
            )
            .unwrap();
        let login = auth.login(&conn, "alice", "secret password").unwrap();
        let session = auth.authenticate(&conn, &login.token).unwrap();
        assert_eq!(session.user_id, user.id);

        // カテゴリとドキュメントを作成
        let groceries = categories::create(&conn, user.id, "Groceries").unwrap();

        let request = CreateDocumentRequest {
            timestamp: Utc::now() - Duration::days(1),
            name: "Receipt".to_string(),
            description: String::new(),
            ocr_text: "SUMA PLN 45,00".to_string(),
            image_url: String::new(),
            amount: 45.0,
            company: "Biedronka".to_string(),
            has_warranty: false,
            warranty_months: None,
            category_ids: vec![groceries.id],
        };
        documents::create(&conn, user.id, &request).unwrap();

        // カテゴリ未選択のドキュメントは「Other」に割り当てられる
        let mut uncategorized = request.clone();
        uncategorized.category_ids = Vec::new();
        uncategorized.amount = 15.0;
        let fallback = documents::create(&conn, user.id, &uncategorized).unwrap();
        assert_eq!(fallback.categories.len(), 1);
        assert_eq!(fallback.categories[0].name, "Other");

        // スナップショットから各チャートを構築できる
        let data = crate::features::users::get_user_data(&conn, user.id).unwrap();
        let snapshots = analytics::to_snapshots(&data.documents);
        let category_names = data.category_names();

        let summary = analytics::spending_summary(&snapshots, &category_names, Utc::now(), None);
        let total: f64 = summary.all_time.split.iter().map(|s| s.value).sum();
        assert!((total - 60.0).abs() < 0.01);

        let series = analytics::cumulative_series(&snapshots, &category_names);
        assert!(!series.points.is_empty());

        let comparison =
            analytics::PeriodComparison::new(&snapshots, category_names.clone(), Utc::now());
        let table = comparison.table();
        assert_eq!(table.rows.len(), category_names.len());
    }
}
