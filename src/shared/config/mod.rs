/// 実行環境の判定と環境変数管理
pub mod environment;
/// アプリケーション初期化処理
pub mod initialization;

pub use environment::{
    get_database_filename, get_environment, initialize_logging_system, load_environment_variables,
    Environment, EnvironmentConfig, SessionConfig,
};
pub use initialization::{
    initialize_application, log_initialization_complete, InitializationResult,
};
