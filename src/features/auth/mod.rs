/// 認証機能モジュール
///
/// このモジュールは認証とセッション管理に関連する機能を提供します：
/// - アカウント登録（既定カテゴリ「Other」のシードを含む）
/// - ログインと暗号化セッショントークンの発行
/// - トークン検証（期限切れセッションの自動削除を含む）
/// - ログアウトとセッションの無効化
// サブモジュールの宣言
pub mod models;
pub mod repository;
pub mod service;
pub mod token;

// モデル
pub use models::{LoginResult, RegisterRequest, Session};

// サービス
pub use service::AuthService;

// トークン暗号器
pub use token::SessionTokenCipher;
