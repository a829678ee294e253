use crate::features::analytics::aggregator::round_to_cents;
use crate::features::analytics::models::{
    chart_color, CumulativePoint, CumulativeSeries, DocumentSnapshot,
};
use std::collections::BTreeMap;

/// カテゴリ別の累積支出の時系列を構築する
///
/// # 引数
/// * `documents` - 集計対象のドキュメントスナップショット
/// * `category_names` - ユーザーの全カテゴリ名（この並び順が出力順になる）
///
/// # 戻り値
/// 日付昇順の累積系列。ドキュメントが1件もない場合、データ点は空
///
/// # 構築手順
/// 1. ドキュメントを暦日（時刻は無視）でグループ化する
/// 2. 最初のドキュメントの前日に全カテゴリ0の点を合成する
/// 3. 日付順に走査し、split規則（金額/カテゴリ数）で累積値を更新する
/// 4. 1日ごとに全カテゴリの累積値を持つ点を出力する
///
/// 支出のないカテゴリも省略せず、累積値0のまま全期間含まれる
pub fn cumulative_series(
    documents: &[DocumentSnapshot],
    category_names: &[String],
) -> CumulativeSeries {
    let colors: Vec<String> = category_names
        .iter()
        .enumerate()
        .map(|(i, _)| chart_color(i).to_string())
        .collect();

    if documents.is_empty() {
        return CumulativeSeries {
            categories: category_names.to_vec(),
            colors,
            points: Vec::new(),
        };
    }

    // 暦日ごとにグループ化（BTreeMapで日付昇順が保たれる）
    let mut by_day: BTreeMap<chrono::NaiveDate, Vec<&DocumentSnapshot>> = BTreeMap::new();
    for document in documents {
        by_day
            .entry(document.timestamp.date_naive())
            .or_default()
            .push(document);
    }

    // 最初のドキュメントの前日にゼロ値の点を合成する
    if let Some(day_before) = by_day.keys().next().copied().and_then(|d| d.pred_opt()) {
        by_day.entry(day_before).or_default();
    }

    let index_of: std::collections::HashMap<&str, usize> = category_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut cumulative = vec![0.0; category_names.len()];
    let mut points = Vec::with_capacity(by_day.len());

    for (date, day_documents) in &by_day {
        for document in day_documents {
            let category_count = document.category_names.len();
            if category_count == 0 {
                continue;
            }

            let split_amount = document.amount / category_count as f64;
            for name in &document.category_names {
                if let Some(&i) = index_of.get(name.as_str()) {
                    cumulative[i] += split_amount;
                }
            }
        }

        points.push(CumulativePoint {
            date: *date,
            values: cumulative.iter().map(|&v| round_to_cents(v)).collect(),
        });
    }

    CumulativeSeries {
        categories: category_names.to_vec(),
        colors,
        points,
    }
}
