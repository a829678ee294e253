use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// ソルトの長さ（バイト）
const SALT_LENGTH: usize = 16;

/// パスワードをソルト付きでハッシュ化する
///
/// # 引数
/// * `password` - 平文パスワード
///
/// # 戻り値
/// "base64(ソルト)$hex(ダイジェスト)" 形式のハッシュ文字列
pub fn hash_password(password: &str) -> String {
    // ランダムなソルトを生成
    let mut salt = [0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);

    let digest = compute_digest(&salt, password);
    let salt_b64 = general_purpose::STANDARD.encode(salt);

    format!("{salt_b64}${digest}")
}

/// パスワードが保存済みハッシュと一致するか検証する
///
/// # 引数
/// * `password` - 平文パスワード
/// * `stored_hash` - 保存済みのハッシュ文字列
///
/// # 戻り値
/// 一致する場合はtrue、不一致または形式不正の場合はfalse
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Some((salt_b64, digest)) = stored_hash.split_once('$') else {
        return false;
    };

    let Ok(salt) = general_purpose::STANDARD.decode(salt_b64) else {
        return false;
    };

    compute_digest(&salt, password) == digest
}

/// ソルトとパスワードからダイジェストを計算する
fn compute_digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    digest.iter().map(|b| format!("{b:02x}")).collect()
}
