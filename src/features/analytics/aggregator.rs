use crate::features::analytics::models::{
    chart_color, CategoryTotals, ChartPair, ChartSlice, DateWindow, DocumentSnapshot,
};
use std::collections::HashMap;

/// ドキュメント群をカテゴリ別の合計へ集約する
///
/// # 引数
/// * `documents` - 集計対象のドキュメントスナップショット
/// * `category_names` - ユーザーの全カテゴリ名（この並び順が出力順になる）
/// * `window` - 集計対象の日付ウィンドウ（両端を含む）
///
/// # 戻り値
/// split/combo両モードのカテゴリ別合計
///
/// # 集計規則
/// - split: ドキュメントの金額をカテゴリ数nで等分し、各カテゴリに加算
/// - combo: ドキュメントの金額を各カテゴリにそのまま全額加算
/// - カテゴリが1つも付いていないドキュメントは何も加算しない（ゼロ除算の保護）
/// - カテゴリ一覧にない名前は無視する（参照整合性はデータ層の責務）
pub fn aggregate(
    documents: &[DocumentSnapshot],
    category_names: &[String],
    window: &DateWindow,
) -> CategoryTotals {
    let index_of: HashMap<&str, usize> = category_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut split = vec![0.0; category_names.len()];
    let mut combo = vec![0.0; category_names.len()];

    for document in documents {
        if !window.contains(&document.timestamp) {
            continue;
        }

        let category_count = document.category_names.len();
        if category_count == 0 {
            // カテゴリなしのドキュメントはデータ層の不変条件上は存在しないが、
            // 万一来てもゼロ除算させず寄与なしとして扱う
            continue;
        }

        let split_amount = document.amount / category_count as f64;

        for name in &document.category_names {
            if let Some(&i) = index_of.get(name.as_str()) {
                split[i] += split_amount;
                combo[i] += document.amount;
            }
        }
    }

    CategoryTotals {
        names: category_names.to_vec(),
        split,
        combo,
    }
}

/// 集計結果をチャート表示用のスライス列へ変換する
///
/// # 引数
/// * `totals` - 集計結果
///
/// # 戻り値
/// split/combo両モードのチャートデータ
///
/// 値は小数点以下2桁に丸め、0のカテゴリは出力から省く。
/// 色はカテゴリの並び順でパレットを循環して割り当てる（フィルタ前の位置基準）
pub fn to_chart_pair(totals: &CategoryTotals) -> ChartPair {
    ChartPair {
        split: to_chart_slices(&totals.names, &totals.split),
        combo: to_chart_slices(&totals.names, &totals.combo),
    }
}

/// 1モード分の値列をチャートスライスへ変換する
fn to_chart_slices(names: &[String], values: &[f64]) -> Vec<ChartSlice> {
    names
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (name, &value))| ChartSlice {
            name: name.clone(),
            value: round_to_cents(value),
            color: chart_color(i).to_string(),
        })
        .filter(|slice| slice.value > 0.0)
        .collect()
}

/// 小数点以下2桁に丸める
pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
