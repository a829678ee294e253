use crate::shared::errors::{AppError, AppResult};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

/// AES-GCMのナンス長（バイト）
const NONCE_LENGTH: usize = 12;

/// セッションIDを不透明トークンへ暗号化するための暗号器
///
/// トークンは「ナンス + 暗号文」をBase64エンコードしたもの。
/// 外部インターフェース層はこのトークンをそのまま持ち回り、
/// 内容を解釈しない
#[derive(Clone)]
pub struct SessionTokenCipher {
    /// 暗号化キー（32バイトに調整済み）
    encryption_key: Vec<u8>,
}

impl SessionTokenCipher {
    /// 新しい暗号器を作成する
    ///
    /// # 引数
    /// * `encryption_key` - セッション暗号化用のキー文字列
    ///
    /// # 戻り値
    /// SessionTokenCipherインスタンス
    pub fn new(encryption_key: &str) -> Self {
        // 暗号化キーを32バイトに調整（不足分は0で埋める）
        let mut key_bytes = encryption_key.as_bytes().to_vec();
        key_bytes.resize(32, 0);

        Self {
            encryption_key: key_bytes,
        }
    }

    /// セッションIDを暗号化してトークンを生成する
    ///
    /// # 引数
    /// * `session_id` - セッションID
    ///
    /// # 戻り値
    /// 暗号化されたトークン、または失敗時はエラー
    pub fn encrypt(&self, session_id: &str) -> AppResult<String> {
        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key)
            .map_err(|e| AppError::security(format!("暗号器の初期化に失敗: {e}")))?;

        // ランダムなナンスを生成
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // セッションIDを暗号化
        let ciphertext = cipher
            .encrypt(nonce, session_id.as_bytes())
            .map_err(|e| AppError::security(format!("トークンの暗号化に失敗: {e}")))?;

        // ナンスと暗号文を結合してBase64エンコード
        let mut token_bytes = nonce_bytes.to_vec();
        token_bytes.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(&token_bytes))
    }

    /// トークンを復号化してセッションIDを取得する
    ///
    /// # 引数
    /// * `token` - 暗号化されたトークン
    ///
    /// # 戻り値
    /// セッションID、または失敗時はエラー
    pub fn decrypt(&self, token: &str) -> AppResult<String> {
        let token_bytes = general_purpose::STANDARD
            .decode(token)
            .map_err(|e| AppError::security(format!("トークンのBase64デコードに失敗: {e}")))?;

        if token_bytes.len() < NONCE_LENGTH {
            return Err(AppError::security("トークンが短すぎます"));
        }

        // ナンスと暗号文を分離
        let (nonce_bytes, ciphertext) = token_bytes.split_at(NONCE_LENGTH);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key)
            .map_err(|e| AppError::security(format!("暗号器の初期化に失敗: {e}")))?;

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_e| AppError::security("トークンの復号に失敗しました"))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::security(format!("トークンのUTF-8変換に失敗: {e}")))
    }
}
