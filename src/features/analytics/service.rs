use crate::features::analytics::aggregator::{aggregate, to_chart_pair};
use crate::features::analytics::models::{
    DateWindow, DocumentSnapshot, SpendingSummary,
};
use crate::features::documents::models::DocumentWithCategories;
use chrono::{DateTime, Duration, Utc};

/// ドキュメント一覧を集計用スナップショットへ変換する
///
/// # 引数
/// * `documents` - カテゴリ付きドキュメントの一覧
///
/// # 戻り値
/// 集計系モジュールが受け取るスナップショットの一覧
pub fn to_snapshots(documents: &[DocumentWithCategories]) -> Vec<DocumentSnapshot> {
    documents
        .iter()
        .map(|entry| DocumentSnapshot {
            timestamp: entry.document.timestamp,
            amount: entry.document.amount,
            category_names: entry
                .categories
                .iter()
                .map(|category| category.name.clone())
                .collect(),
        })
        .collect()
}

/// 支出サマリーを構築する
///
/// # 引数
/// * `documents` - 集計対象のドキュメントスナップショット
/// * `category_names` - ユーザーの全カテゴリ名
/// * `now` - 現在時刻（固定ウィンドウの基準点）
/// * `custom` - ユーザー指定のカスタム期間（開始, 終了）
///
/// # 戻り値
/// 固定3ウィンドウ（7日・30日・全期間）とカスタム期間のチャートデータ
///
/// 各ウィンドウは同じ集計ルーチンを再実行して独立に計算する
pub fn spending_summary(
    documents: &[DocumentSnapshot],
    category_names: &[String],
    now: DateTime<Utc>,
    custom: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> SpendingSummary {
    let seven_day_window = DateWindow::since(now - Duration::days(7));
    let thirty_day_window = DateWindow::since(now - Duration::days(30));

    let summary = SpendingSummary {
        seven_day: to_chart_pair(&aggregate(documents, category_names, &seven_day_window)),
        thirty_day: to_chart_pair(&aggregate(documents, category_names, &thirty_day_window)),
        all_time: to_chart_pair(&aggregate(documents, category_names, &DateWindow::all_time())),
        custom: custom.map(|(start, end)| {
            to_chart_pair(&aggregate(
                documents,
                category_names,
                &DateWindow::between(start, end),
            ))
        }),
    };

    log::debug!(
        "支出サマリーを構築しました: categories={}, documents={}",
        category_names.len(),
        documents.len()
    );

    summary
}
