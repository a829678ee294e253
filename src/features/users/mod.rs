/// ユーザー機能モジュール
///
/// このモジュールはユーザーアカウントの管理に関連する機能を提供します：
/// - アカウント情報の取得・更新・削除（所有データの連鎖削除を含む）
/// - 集計・表示に使うユーザーデータ一式の取得
///
/// アカウントの新規登録とログインは認証機能モジュール（auth）が担う
// サブモジュールの宣言
pub mod models;
pub mod repository;
pub mod service;

// モデル
pub use models::{User, UserData};

// サービス
pub use service::{delete_account, get, get_user_data, update_account};
