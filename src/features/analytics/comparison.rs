use crate::features::analytics::aggregator::{aggregate, round_to_cents};
use crate::features::analytics::models::{chart_color, DateWindow, DocumentSnapshot};
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 既定でシードされる期間の数（"This Week" と "Last Week"）
const SEEDED_PERIOD_COUNT: usize = 2;

/// カスタム期間の表示名のプレフィックス
const CUSTOM_PERIOD_PREFIX: &str = "Custom Period";

/// 比較対象の1期間
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    /// 安定した期間ID（列のキー。表示名の変更に影響されない）
    pub id: u64,
    /// 表示名（"This Week" / "Last Week" / "Custom Period N"）
    pub name: String,
    /// 割り当てられた色
    pub color: String,
    /// 期間の開始（Noneは無制限）
    pub start: Option<DateTime<Utc>>,
    /// 期間の終了（Noneは無制限）
    pub end: Option<DateTime<Utc>>,
}

/// 1期間分の集計列（カテゴリ一覧とインデックスで対応）
#[derive(Debug, Clone, PartialEq)]
struct PeriodColumn {
    split: Vec<f64>,
    combo: Vec<f64>,
}

/// 棒グラフの凡例の1系列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSeries {
    pub name: String,
    pub color: String,
}

/// 1期間分の集計値（表の1セル）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    /// 期間の表示名
    pub period: String,
    /// split集計値
    pub split: f64,
    /// combo集計値
    pub combo: f64,
}

/// カテゴリごとの1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub category: String,
    /// 期間の並び順に対応する値の列
    pub values: Vec<PeriodValue>,
}

/// 棒グラフ表示用のワイドテーブル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    /// 凡例（期間の並び順）
    pub series: Vec<PeriodSeries>,
    /// カテゴリごとの行（カテゴリの並び順）
    pub rows: Vec<ComparisonRow>,
}

/// 名前付き期間の集合と、期間ごとのカテゴリ別集計列を保持する比較ビルダー
///
/// 列は安定した期間IDをキーに保持する。カスタム期間の削除で表示名が
/// 振り直されても、列とキーの対応は変わらない
#[derive(Debug, Clone)]
pub struct PeriodComparison {
    /// カテゴリ名（行の並び順）
    category_names: Vec<String>,
    /// 期間（列の並び順）
    periods: Vec<Period>,
    /// 期間IDごとの集計列
    columns: HashMap<u64, PeriodColumn>,
    /// 次に割り当てる期間ID
    next_period_id: u64,
}

impl PeriodComparison {
    /// 既定の2期間（"This Week" と "Last Week"）をシードした比較ビルダーを作成する
    ///
    /// # 引数
    /// * `documents` - 集計対象のドキュメントスナップショット
    /// * `category_names` - ユーザーの全カテゴリ名
    /// * `now` - 現在時刻（シード期間の基準点）
    ///
    /// # 戻り値
    /// シード済みの比較ビルダー
    pub fn new(
        documents: &[DocumentSnapshot],
        category_names: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut comparison = Self {
            category_names,
            periods: Vec::new(),
            columns: HashMap::new(),
            next_period_id: 1,
        };

        let seven_days_ago = now - Duration::days(7);
        let fourteen_days_ago = now - Duration::days(14);

        comparison.push_period(
            documents,
            "This Week".to_string(),
            Some(seven_days_ago),
            Some(now),
        );
        comparison.push_period(
            documents,
            "Last Week".to_string(),
            Some(fourteen_days_ago),
            Some(seven_days_ago),
        );

        comparison
    }

    /// 期間の一覧を取得する（列の並び順）
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// カスタム期間を末尾に追加する
    ///
    /// # 引数
    /// * `documents` - 集計対象のドキュメントスナップショット
    /// * `start` - 期間の開始
    /// * `end` - 期間の終了
    ///
    /// # 戻り値
    /// 追加された期間のID
    ///
    /// 表示名は "Custom Period N"（Nは既存のカスタム期間数+1）
    pub fn add_period(
        &mut self,
        documents: &[DocumentSnapshot],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> u64 {
        let custom_number = self.custom_period_count() + 1;
        let name = format!("{CUSTOM_PERIOD_PREFIX} {custom_number}");
        self.push_period(documents, name, start, end)
    }

    /// 指定位置の期間を削除する
    ///
    /// # 引数
    /// * `index` - 削除する期間の位置
    ///
    /// # 戻り値
    /// 成功時はOk(())、シード期間や範囲外の指定はエラー
    ///
    /// 削除後、後続のカスタム期間の番号は連番を保つよう振り直される
    pub fn remove_period(&mut self, index: usize) -> AppResult<()> {
        if index >= self.periods.len() {
            return Err(AppError::not_found("指定された期間"));
        }
        if index < SEEDED_PERIOD_COUNT {
            return Err(AppError::validation(
                "既定の期間（This Week / Last Week）は削除できません",
            ));
        }

        let removed = self.periods.remove(index);
        self.columns.remove(&removed.id);
        log::debug!("期間を削除しました: {}", removed.name);

        self.renumber_custom_periods();

        Ok(())
    }

    /// 指定位置の期間の開始日時を変更し、その期間の列だけを再計算する
    ///
    /// # 引数
    /// * `documents` - 集計対象のドキュメントスナップショット
    /// * `index` - 変更する期間の位置
    /// * `start` - 新しい開始日時
    pub fn set_period_start(
        &mut self,
        documents: &[DocumentSnapshot],
        index: usize,
        start: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let period = self
            .periods
            .get_mut(index)
            .ok_or_else(|| AppError::not_found("指定された期間"))?;

        period.start = start;
        let id = period.id;
        let window = DateWindow {
            start: period.start,
            end: period.end,
        };

        let column = compute_column(documents, &self.category_names, &window);
        self.columns.insert(id, column);

        Ok(())
    }

    /// 指定位置の期間の終了日時を変更し、その期間の列だけを再計算する
    ///
    /// # 引数
    /// * `documents` - 集計対象のドキュメントスナップショット
    /// * `index` - 変更する期間の位置
    /// * `end` - 新しい終了日時
    pub fn set_period_end(
        &mut self,
        documents: &[DocumentSnapshot],
        index: usize,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let period = self
            .periods
            .get_mut(index)
            .ok_or_else(|| AppError::not_found("指定された期間"))?;

        period.end = end;
        let id = period.id;
        let window = DateWindow {
            start: period.start,
            end: period.end,
        };

        let column = compute_column(documents, &self.category_names, &window);
        self.columns.insert(id, column);

        Ok(())
    }

    /// 棒グラフ表示用のテーブルを構築する
    ///
    /// # 戻り値
    /// 凡例とカテゴリごとの行からなるテーブル
    pub fn table(&self) -> ComparisonTable {
        let series = self
            .periods
            .iter()
            .map(|period| PeriodSeries {
                name: period.name.clone(),
                color: period.color.clone(),
            })
            .collect();

        let rows = self
            .category_names
            .iter()
            .enumerate()
            .map(|(category_index, category)| ComparisonRow {
                category: category.clone(),
                values: self
                    .periods
                    .iter()
                    .filter_map(|period| {
                        let column = self.columns.get(&period.id)?;
                        Some(PeriodValue {
                            period: period.name.clone(),
                            split: column.split[category_index],
                            combo: column.combo[category_index],
                        })
                    })
                    .collect(),
            })
            .collect();

        ComparisonTable { series, rows }
    }

    /// 期間を末尾に追加し、列を計算する（内部共通処理）
    fn push_period(
        &mut self,
        documents: &[DocumentSnapshot],
        name: String,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> u64 {
        let id = self.next_period_id;
        self.next_period_id += 1;

        // 色は追加時点の並び位置で決める（1始まり。削除で位置が詰まると再利用される）
        let color = chart_color(self.periods.len() + 1).to_string();

        let window = DateWindow { start, end };
        let column = compute_column(documents, &self.category_names, &window);

        self.periods.push(Period {
            id,
            name,
            color,
            start,
            end,
        });
        self.columns.insert(id, column);

        id
    }

    /// 現在のカスタム期間の数を数える
    fn custom_period_count(&self) -> usize {
        self.periods
            .iter()
            .filter(|period| period.name.starts_with(CUSTOM_PERIOD_PREFIX))
            .count()
    }

    /// カスタム期間の表示名を連番に振り直す
    fn renumber_custom_periods(&mut self) {
        let mut counter = 0;
        for period in &mut self.periods {
            if period.name.starts_with(CUSTOM_PERIOD_PREFIX) {
                counter += 1;
                period.name = format!("{CUSTOM_PERIOD_PREFIX} {counter}");
            }
        }
    }
}

/// 1期間分の集計列を計算する
fn compute_column(
    documents: &[DocumentSnapshot],
    category_names: &[String],
    window: &DateWindow,
) -> PeriodColumn {
    let totals = aggregate(documents, category_names, window);

    PeriodColumn {
        split: totals.split.iter().map(|&v| round_to_cents(v)).collect(),
        combo: totals.combo.iter().map(|&v| round_to_cents(v)).collect(),
    }
}
