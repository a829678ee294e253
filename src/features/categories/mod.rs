/// 支出カテゴリ機能モジュール
///
/// このモジュールは支出カテゴリの管理に関連する機能を提供します：
/// - カテゴリの作成、取得、改名、削除（所有チェック付き）
/// - ユーザーごとの大文字小文字を区別しない名前の一意性
/// - 保護された既定カテゴリ「Other」の扱い
// サブモジュールの宣言
pub mod models;
pub mod repository;
pub mod service;

// モデル
pub use models::{Category, OTHER_CATEGORY_NAME};

// サービス（所有チェック付きの外部向けインターフェース）
pub use service::{create, delete, get, list, rename};
