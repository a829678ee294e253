use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// チャートの系列に割り当てる固定カラーパレット
///
/// カテゴリ・期間の並び順に従って循環的に割り当てる
pub const CHART_COLORS: [&str; 10] = [
    "#339af0", // blue-5
    "#ff6b6b", // red-5
    "#51cf66", // green-5
    "#fcc419", // yellow-5
    "#9775fa", // violet-5
    "#20c997", // teal-5
    "#f783ac", // pink-5
    "#748ffc", // indigo-5
    "#63e6be", // cyan-5
    "#ffa94d", // orange-5
];

/// 指定位置に対応するパレット色を取得する
pub fn chart_color(index: usize) -> &'static str {
    CHART_COLORS[index % CHART_COLORS.len()]
}

/// 集計対象となるドキュメントのスナップショット
///
/// データアクセス層で認可チェック済みのデータを写し取ったもの。
/// 集計系のモジュールはこの形式のみを入力として受け取る
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// ドキュメントの日時
    pub timestamp: DateTime<Utc>,
    /// 支出額
    pub amount: f64,
    /// 関連付けられたカテゴリ名の集合
    pub category_names: Vec<String>,
}

/// 集計の日付ウィンドウ（両端を含む、どちらの境界も省略可能）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateWindow {
    /// 開始日時（Noneの場合は無制限）
    pub start: Option<DateTime<Utc>>,
    /// 終了日時（Noneの場合は無制限）
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    /// 全期間を表すウィンドウを作成する
    pub fn all_time() -> Self {
        Self::default()
    }

    /// 開始日時のみ指定したウィンドウを作成する
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// 両端を指定したウィンドウを作成する
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// 日時がウィンドウに含まれるかどうか（指定された境界は含む）
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let after_start = self.start.map_or(true, |start| *timestamp >= start);
        let before_end = self.end.map_or(true, |end| *timestamp <= end);
        after_start && before_end
    }
}

/// カテゴリごとの集計結果（splitとcomboの並行アキュムレータ）
///
/// 値はカテゴリ名と同じ並び順のインデックスで対応する
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotals {
    /// カテゴリ名（入力と同じ並び順）
    pub names: Vec<String>,
    /// split集計: ドキュメントの金額をカテゴリ数で等分して加算
    pub split: Vec<f64>,
    /// combo集計: ドキュメントの金額を各カテゴリに全額加算
    pub combo: Vec<f64>,
}

impl CategoryTotals {
    /// カテゴリ名からsplit集計値を取得する（テスト・検証用）
    pub fn split_of(&self, name: &str) -> Option<f64> {
        let index = self.names.iter().position(|n| n == name)?;
        self.split.get(index).copied()
    }

    /// カテゴリ名からcombo集計値を取得する（テスト・検証用）
    pub fn combo_of(&self, name: &str) -> Option<f64> {
        let index = self.names.iter().position(|n| n == name)?;
        self.combo.get(index).copied()
    }
}

/// ドーナツチャートの1スライス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSlice {
    /// カテゴリ名
    pub name: String,
    /// 集計値（小数点以下2桁に丸め済み、0より大きい値のみ）
    pub value: f64,
    /// 割り当てられた色
    pub color: String,
}

/// split/combo両モードのチャートデータの組
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPair {
    pub split: Vec<ChartSlice>,
    pub combo: Vec<ChartSlice>,
}

/// 支出サマリー（固定ウィンドウ3種 + カスタムウィンドウ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingSummary {
    /// 直近7日間
    pub seven_day: ChartPair,
    /// 直近30日間
    pub thirty_day: ChartPair,
    /// 全期間
    pub all_time: ChartPair,
    /// ユーザー指定のカスタム期間（指定時のみ）
    pub custom: Option<ChartPair>,
}

/// 累積エリアチャートの1日分のデータ点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    /// 日付（時刻は無視した暦日）
    pub date: NaiveDate,
    /// 各カテゴリのその時点での累積値（カテゴリ名と同じ並び順）
    pub values: Vec<f64>,
}

/// 累積エリアチャートの系列一式
///
/// 支出のないカテゴリも累積値0のまま常に含まれる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    /// カテゴリ名（入力と同じ並び順）
    pub categories: Vec<String>,
    /// 各カテゴリに割り当てられた色
    pub colors: Vec<String>,
    /// 日付昇順のデータ点
    pub points: Vec<CumulativePoint>,
}
