use thiserror::Error;

/// アプリケーション全体で使用される統一エラー型
#[derive(Debug, Error)]
pub enum AppError {
    /// データベース関連のエラー
    #[error("データベースエラー: {0}")]
    Database(String),

    /// バリデーション関連のエラー
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// リソースが見つからない場合のエラー
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 重複や保護されたリソースへの操作による競合エラー
    #[error("競合エラー: {0}")]
    Conflict(String),

    /// セキュリティ関連のエラー
    #[error("セキュリティエラー: {0}")]
    Security(String),

    /// 設定関連のエラー
    #[error("設定エラー: {0}")]
    Configuration(String),

    /// I/O関連のエラー
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    /// JSON解析エラー
    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),
}

/// エラーの重要度を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// 低重要度（ユーザー入力エラーなど）
    Low,
    /// 中重要度（I/Oエラーなど）
    Medium,
    /// 高重要度（データベースエラーなど）
    High,
    /// 最重要（セキュリティエラーなど）
    Critical,
}

impl AppError {
    /// ユーザーに表示するためのフレンドリーなメッセージを取得
    ///
    /// # 戻り値
    /// ユーザーに表示可能なエラーメッセージ
    pub fn user_message(&self) -> &str {
        match self {
            AppError::Database(_) => "データベース操作でエラーが発生しました",
            AppError::Validation(msg) => msg,
            AppError::NotFound(msg) => msg,
            AppError::Conflict(msg) => msg,
            AppError::Security(_) => "セキュリティエラーが発生しました",
            AppError::Configuration(_) => "設定エラーが発生しました",
            AppError::Io(_) => "ファイル操作でエラーが発生しました",
            AppError::Json(_) => "データ形式の解析でエラーが発生しました",
        }
    }

    /// エラーの詳細情報を取得
    ///
    /// # 戻り値
    /// エラーの詳細情報（ログ出力用）
    pub fn details(&self) -> String {
        format!("{self}")
    }

    /// エラーの重要度を取得
    ///
    /// # 戻り値
    /// エラーの重要度レベル
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Database(_) => ErrorSeverity::High,
            AppError::Validation(_) => ErrorSeverity::Low,
            AppError::NotFound(_) => ErrorSeverity::Low,
            AppError::Conflict(_) => ErrorSeverity::Low,
            AppError::Security(_) => ErrorSeverity::Critical,
            AppError::Configuration(_) => ErrorSeverity::High,
            AppError::Io(_) => ErrorSeverity::Medium,
            AppError::Json(_) => ErrorSeverity::Medium,
        }
    }

    /// バリデーションエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - バリデーションエラーメッセージ
    ///
    /// # 戻り値
    /// バリデーションエラー
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation(message.into())
    }

    /// リソース未発見エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `resource` - 見つからなかったリソース名
    ///
    /// # 戻り値
    /// リソース未発見エラー
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        AppError::NotFound(format!("{}が見つかりません", resource.into()))
    }

    /// 競合エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 競合エラーメッセージ
    ///
    /// # 戻り値
    /// 競合エラー
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        AppError::Conflict(message.into())
    }

    /// セキュリティエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - セキュリティエラーメッセージ
    ///
    /// # 戻り値
    /// セキュリティエラー
    pub fn security<S: Into<String>>(message: S) -> Self {
        AppError::Security(message.into())
    }

    /// 設定エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 設定エラーメッセージ
    ///
    /// # 戻り値
    /// 設定エラー
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }
}

/// AppErrorからStringへの変換（外部インターフェース層での使用のため）
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.user_message().to_string()
    }
}

/// rusqlite::ErrorからAppErrorへの変換
impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        AppError::Database(error.to_string())
    }
}

/// Result型のエイリアス（アプリケーション全体で使用）
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        // 各エラータイプの重要度をテスト
        assert_eq!(
            AppError::validation("テスト").severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            AppError::not_found("ユーザー").severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            AppError::conflict("カテゴリ名が重複しています").severity(),
            ErrorSeverity::Low
        );
        assert_eq!(
            AppError::security("不正アクセス").severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            AppError::configuration("設定ファイル不正").severity(),
            ErrorSeverity::High
        );
    }

    #[test]
    fn test_user_message() {
        // ユーザーメッセージのテスト
        let validation_error = AppError::validation("金額が不正です");
        assert_eq!(validation_error.user_message(), "金額が不正です");

        let not_found_error = AppError::not_found("ドキュメント");
        assert_eq!(not_found_error.user_message(), "ドキュメントが見つかりません");

        let conflict_error = AppError::conflict("「Other」カテゴリは変更できません");
        assert_eq!(
            conflict_error.user_message(),
            "「Other」カテゴリは変更できません"
        );

        let security_error = AppError::security("認証失敗");
        assert_eq!(
            security_error.user_message(),
            "セキュリティエラーが発生しました"
        );
    }

    #[test]
    fn test_helper_functions() {
        // ヘルパー関数のテスト
        let validation_error = AppError::validation("テストメッセージ");
        assert!(matches!(validation_error, AppError::Validation(_)));

        let not_found_error = AppError::not_found("テストリソース");
        assert!(matches!(not_found_error, AppError::NotFound(_)));

        let conflict_error = AppError::conflict("テスト競合");
        assert!(matches!(conflict_error, AppError::Conflict(_)));
    }

    #[test]
    fn test_string_conversion() {
        // String変換のテスト
        let error = AppError::validation("テストエラー");
        let error_string: String = error.into();
        assert_eq!(error_string, "テストエラー");
    }

    #[test]
    fn test_error_details() {
        // エラー詳細のテスト
        let error = AppError::validation("詳細テスト");
        let details = error.details();
        assert!(details.contains("詳細テスト"));
    }
}
