use crate::features::categories;
use crate::features::categories::models::{Category, OTHER_CATEGORY_NAME};
use crate::features::documents::models::{
    CreateDocumentRequest, Document, DocumentWithCategories, UpdateDocumentRequest,
};
use crate::features::documents::repository;
use crate::features::users;
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

/// ドキュメント名の最小文字数
const NAME_MIN_LENGTH: usize = 2;
/// ドキュメント名の最大文字数
const NAME_MAX_LENGTH: usize = 30;
/// 説明の最大文字数
const DESCRIPTION_MAX_LENGTH: usize = 1024;

/// 少なくとも1つの英字を含むこと（数字や記号だけの名前を弾く）
static CONTAINS_LETTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]").expect("英字正規表現のコンパイルに失敗"));

/// ドキュメントを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `request` - 作成リクエスト
///
/// # 戻り値
/// 作成されたドキュメント（カテゴリ付き）、または失敗時はエラー
///
/// カテゴリが1つも選択されていない場合は「Other」カテゴリが割り当てられる
pub fn create(
    conn: &Connection,
    user_id: i64,
    request: &CreateDocumentRequest,
) -> AppResult<DocumentWithCategories> {
    validate_fields(
        &request.name,
        &request.description,
        request.amount,
        &request.company,
        &request.timestamp,
    )?;
    validate_warranty(request.has_warranty, request.warranty_months)?;

    // 所有ユーザーの存在確認
    users::repository::find_by_id(conn, user_id)?;

    let resolved_categories = resolve_categories(conn, user_id, &request.category_ids)?;

    let tx = conn.unchecked_transaction()?;
    let document = repository::create(&tx, user_id, request)?;
    for category in &resolved_categories {
        repository::attach_category(&tx, document.id, category.id)?;
    }
    tx.commit()?;

    log::info!(
        "ドキュメントを作成しました: user_id={user_id}, document_id={}, categories={}",
        document.id,
        resolved_categories.len()
    );

    Ok(DocumentWithCategories {
        document,
        categories: resolved_categories,
    })
}

/// ドキュメントを更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `document_id` - ドキュメントID
/// * `request` - 更新リクエスト
///
/// # 戻り値
/// 更新後のドキュメント（カテゴリ付き）、または失敗時はエラー
///
/// カテゴリの関連は全置換される。image_urlが空文字列の場合は
/// 保存済みの画像参照をそのまま保持する
pub fn update(
    conn: &Connection,
    user_id: i64,
    document_id: i64,
    request: &UpdateDocumentRequest,
) -> AppResult<DocumentWithCategories> {
    let existing = repository::find_by_id(conn, document_id)?;
    ensure_owned(&existing, user_id)?;

    validate_fields(
        &request.name,
        &request.description,
        request.amount,
        &request.company,
        &request.timestamp,
    )?;
    validate_warranty(request.has_warranty, request.warranty_months)?;

    let resolved_categories = resolve_categories(conn, user_id, &request.category_ids)?;

    // 新しい画像参照が与えられた場合のみ差し替える
    let image_url = if request.image_url.is_empty() {
        existing.image_url.as_str()
    } else {
        request.image_url.as_str()
    };

    let tx = conn.unchecked_transaction()?;
    let document = repository::update(&tx, document_id, request, image_url)?;
    repository::detach_all_categories(&tx, document_id)?;
    for category in &resolved_categories {
        repository::attach_category(&tx, document_id, category.id)?;
    }
    tx.commit()?;

    log::info!("ドキュメントを更新しました: document_id={document_id}");

    Ok(DocumentWithCategories {
        document,
        categories: resolved_categories,
    })
}

/// ドキュメントを削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `document_id` - ドキュメントID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete(conn: &Connection, user_id: i64, document_id: i64) -> AppResult<()> {
    let existing = repository::find_by_id(conn, document_id)?;
    ensure_owned(&existing, user_id)?;

    repository::delete(conn, document_id)?;
    log::info!("ドキュメントを削除しました: document_id={document_id}");

    Ok(())
}

/// ドキュメントを取得する（カテゴリ付き、所有チェック付き）
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `document_id` - ドキュメントID
///
/// # 戻り値
/// カテゴリ付きドキュメント、または失敗時はエラー
pub fn get(
    conn: &Connection,
    user_id: i64,
    document_id: i64,
) -> AppResult<DocumentWithCategories> {
    let document = repository::find_by_id(conn, document_id)?;
    ensure_owned(&document, user_id)?;

    let document_categories = categories::repository::find_by_document(conn, document_id)?;

    Ok(DocumentWithCategories {
        document,
        categories: document_categories,
    })
}

/// ユーザーの全ドキュメントを取得する（カテゴリ付き）
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
///
/// # 戻り値
/// カテゴリ付きドキュメントのリスト、または失敗時はエラー
pub fn list(conn: &Connection, user_id: i64) -> AppResult<Vec<DocumentWithCategories>> {
    users::repository::find_by_id(conn, user_id)?;
    repository::find_by_user_with_categories(conn, user_id)
}

/// カテゴリに属するドキュメントを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `category_id` - カテゴリID
///
/// # 戻り値
/// ドキュメントのリスト、または失敗時はエラー
pub fn list_by_category(
    conn: &Connection,
    user_id: i64,
    category_id: i64,
) -> AppResult<Vec<Document>> {
    // カテゴリの存在と所有を確認
    categories::service::get(conn, user_id, category_id)?;

    repository::find_by_category(conn, category_id)
}

/// ドキュメントが呼び出しユーザーの所有であることを確認する
///
/// 他ユーザーのリソースは存在自体を漏らさないようNotFoundとして扱う
fn ensure_owned(document: &Document, user_id: i64) -> AppResult<()> {
    if document.user_id != user_id {
        return Err(AppError::not_found("ドキュメント"));
    }
    Ok(())
}

/// カテゴリIDの一覧を実際のカテゴリに解決する
///
/// # 引数
/// * `conn` - データベース接続
/// * `user_id` - 認証済みユーザーID
/// * `category_ids` - 選択されたカテゴリID（空の場合あり）
///
/// # 戻り値
/// 関連付けるカテゴリのリスト、または失敗時はエラー
///
/// 空の場合はフォールバックとして「Other」カテゴリ1件に解決される。
/// 存在しないIDや他ユーザーのカテゴリが混じっている場合はNotFound
fn resolve_categories(
    conn: &Connection,
    user_id: i64,
    category_ids: &[i64],
) -> AppResult<Vec<Category>> {
    if category_ids.is_empty() {
        let other = categories::repository::find_by_name(conn, user_id, OTHER_CATEGORY_NAME)?
            .ok_or_else(|| AppError::not_found(format!("「{OTHER_CATEGORY_NAME}」カテゴリ")))?;
        return Ok(vec![other]);
    }

    let mut resolved = Vec::with_capacity(category_ids.len());
    for &category_id in category_ids {
        let category = match categories::repository::find_by_id(conn, category_id) {
            Ok(category) => category,
            Err(AppError::NotFound(_)) => return Err(selected_category_error()),
            Err(e) => return Err(e),
        };

        if category.user_id != user_id {
            return Err(selected_category_error());
        }

        resolved.push(category);
    }

    Ok(resolved)
}

/// 選択カテゴリの解決失敗を表すエラー
fn selected_category_error() -> AppError {
    AppError::NotFound(
        "選択されたカテゴリの一部が存在しないか、このユーザーのものではありません".to_string(),
    )
}

/// ドキュメントの基本フィールドを検証する
///
/// # 検証条件
/// - 名前: 2〜30文字、英字を少なくとも1つ含む
/// - 説明: 1024文字以内
/// - 金額: 0より大きい
/// - 会社名: 指定する場合は英字を少なくとも1つ含む
/// - 取引日時: 未来の日付は不可（このルールの唯一の検証箇所）
fn validate_fields(
    name: &str,
    description: &str,
    amount: f64,
    company: &str,
    timestamp: &DateTime<Utc>,
) -> AppResult<()> {
    let name_length = name.chars().count();
    if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&name_length) {
        return Err(AppError::validation(format!(
            "ドキュメント名は{NAME_MIN_LENGTH}〜{NAME_MAX_LENGTH}文字である必要があります"
        )));
    }

    if !CONTAINS_LETTER_RE.is_match(name) {
        return Err(AppError::validation(
            "ドキュメント名は数字や記号のみにはできません",
        ));
    }

    if description.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(AppError::validation(format!(
            "説明は{DESCRIPTION_MAX_LENGTH}文字以内である必要があります"
        )));
    }

    if amount <= 0.0 {
        return Err(AppError::validation("金額は0より大きい必要があります"));
    }

    if !company.is_empty() && !CONTAINS_LETTER_RE.is_match(company) {
        return Err(AppError::validation(
            "会社名は数字や記号のみにはできません",
        ));
    }

    if *timestamp > Utc::now() {
        return Err(AppError::validation("取引日時に未来の日付は指定できません"));
    }

    Ok(())
}

/// 保証フラグと保証期間の整合性を検証する
///
/// # 不変条件
/// - 保証なし（has_warranty=false）の場合、保証期間は0またはNone
/// - 保証あり（has_warranty=true）の場合、保証期間は1以上
fn validate_warranty(has_warranty: bool, warranty_months: Option<i64>) -> AppResult<()> {
    match (has_warranty, warranty_months) {
        (false, Some(duration)) if duration != 0 => Err(AppError::validation(
            "保証がないドキュメントに保証期間は指定できません",
        )),
        (true, None) => Err(AppError::validation(
            "保証があるドキュメントには保証期間が必要です",
        )),
        (true, Some(duration)) if duration <= 0 => Err(AppError::validation(
            "保証期間は1ヶ月以上である必要があります",
        )),
        _ => Ok(()),
    }
}
