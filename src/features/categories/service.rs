use crate::features::categories::models::{Category, OTHER_CATEGORY_NAME};
use crate::features::categories::repository;
use crate::features::users;
use crate::shared::errors::{AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

/// カテゴリ名の最小文字数
const NAME_MIN_LENGTH: usize = 4;
/// カテゴリ名の最大文字数
const NAME_MAX_LENGTH: usize = 30;

/// カテゴリ名に使用できる文字（英字と空白のみ）
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("カテゴリ名正規表現のコンパイルに失敗"));

/// カテゴリを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `name` - カテゴリ名
///
/// # 戻り値
/// 作成されたカテゴリ、または失敗時はエラー
///
/// # エラー
/// - `Validation` - 名前の形式が不正
/// - `NotFound` - ユーザーが存在しない
/// - `Conflict` - 同名（大文字小文字問わず）のカテゴリが既に存在する
pub fn create(conn: &Connection, user_id: i64, name: &str) -> AppResult<Category> {
    validate_name(name)?;

    // 所有ユーザーの存在確認
    users::repository::find_by_id(conn, user_id)?;

    // 大文字小文字を区別しない重複チェック
    if repository::find_by_name(conn, user_id, name)?.is_some() {
        return Err(AppError::conflict(format!(
            "カテゴリ「{name}」は既に存在します"
        )));
    }

    let category = repository::create(conn, user_id, name)?;
    log::info!(
        "カテゴリを作成しました: user_id={user_id}, category_id={}, name={name}",
        category.id
    );

    Ok(category)
}

/// カテゴリを取得する（所有チェック付き）
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `category_id` - カテゴリID
///
/// # 戻り値
/// カテゴリ、または失敗時はエラー
pub fn get(conn: &Connection, user_id: i64, category_id: i64) -> AppResult<Category> {
    let category = repository::find_by_id(conn, category_id)?;
    ensure_owned(&category, user_id)?;
    Ok(category)
}

/// ユーザーの全カテゴリを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
///
/// # 戻り値
/// カテゴリのリスト（作成順）、または失敗時はエラー
pub fn list(conn: &Connection, user_id: i64) -> AppResult<Vec<Category>> {
    users::repository::find_by_id(conn, user_id)?;
    repository::find_by_user(conn, user_id)
}

/// カテゴリ名を変更する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `category_id` - カテゴリID
/// * `name` - 新しいカテゴリ名
///
/// # 戻り値
/// 更新後のカテゴリ、または失敗時はエラー
///
/// # エラー
/// - `NotFound` - カテゴリが存在しないか、呼び出しユーザーの所有ではない
/// - `Conflict` - 対象が保護された「Other」カテゴリ、または新しい名前が重複する
pub fn rename(
    conn: &Connection,
    user_id: i64,
    category_id: i64,
    name: &str,
) -> AppResult<Category> {
    let category = repository::find_by_id(conn, category_id)?;
    ensure_owned(&category, user_id)?;

    if category.is_protected() {
        return Err(AppError::conflict(format!(
            "「{OTHER_CATEGORY_NAME}」カテゴリは変更できません"
        )));
    }

    validate_name(name)?;

    // 自分自身以外との重複チェック
    if let Some(existing) = repository::find_by_name(conn, user_id, name)? {
        if existing.id != category_id {
            return Err(AppError::conflict(format!(
                "カテゴリ「{name}」は既に存在します"
            )));
        }
    }

    let renamed = repository::rename(conn, category_id, name)?;
    log::info!("カテゴリ名を変更しました: category_id={category_id}, name={name}");

    Ok(renamed)
}

/// カテゴリを削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `category_id` - カテゴリID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
///
/// # エラー
/// - `NotFound` - カテゴリが存在しないか、呼び出しユーザーの所有ではない
/// - `Conflict` - 対象が保護された「Other」カテゴリ、またはドキュメントが参照中
///
/// 参照中のカテゴリを削除するには、先にすべてのドキュメントから
/// このカテゴリを外す必要がある
pub fn delete(conn: &Connection, user_id: i64, category_id: i64) -> AppResult<()> {
    let category = repository::find_by_id(conn, category_id)?;
    ensure_owned(&category, user_id)?;

    if category.is_protected() {
        return Err(AppError::conflict(format!(
            "「{OTHER_CATEGORY_NAME}」カテゴリは削除できません"
        )));
    }

    let in_use = repository::document_count(conn, category_id)?;
    if in_use > 0 {
        return Err(AppError::conflict(
            "ドキュメントが参照しているカテゴリは削除できません。先にすべてのドキュメントからこのカテゴリを外してください",
        ));
    }

    repository::delete(conn, category_id)?;
    log::info!("カテゴリを削除しました: category_id={category_id}");

    Ok(())
}

/// カテゴリが呼び出しユーザーの所有であることを確認する
///
/// 他ユーザーのリソースは存在自体を漏らさないようNotFoundとして扱う
fn ensure_owned(category: &Category, user_id: i64) -> AppResult<()> {
    if category.user_id != user_id {
        return Err(AppError::not_found("カテゴリ"));
    }
    Ok(())
}

/// カテゴリ名の形式を検証する
///
/// # 検証条件
/// - 4〜30文字
/// - 英字と空白のみ
fn validate_name(name: &str) -> AppResult<()> {
    let length = name.chars().count();
    if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) {
        return Err(AppError::validation(format!(
            "カテゴリ名は{NAME_MIN_LENGTH}〜{NAME_MAX_LENGTH}文字である必要があります"
        )));
    }

    if !NAME_RE.is_match(name) {
        return Err(AppError::validation(
            "カテゴリ名には英字と空白のみ使用できます",
        ));
    }

    Ok(())
}
