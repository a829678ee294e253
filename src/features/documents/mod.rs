/// ドキュメント機能モジュール
///
/// このモジュールはレシート・請求書ドキュメントの管理に関連する機能を提供します：
/// - ドキュメントの作成、取得、更新、削除（所有チェック付き）
/// - 保証フラグと保証期間の整合性の検証
/// - カテゴリの関連付けと「Other」カテゴリへのフォールバック
/// - 未来日付の拒否（このルールの唯一の検証箇所）
// サブモジュールの宣言
pub mod models;
pub mod repository;
pub mod service;

// モデル
pub use models::{
    CreateDocumentRequest, Document, DocumentWithCategories, UpdateDocumentRequest,
};

// サービス（所有チェック付きの外部向けインターフェース）
pub use service::{create, delete, get, list, list_by_category, update};
