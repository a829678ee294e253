/// 支出分析機能モジュール
///
/// このモジュールはチャート表示用の集計ロジックを提供します：
/// - カテゴリ別の支出集計（split/combo両モード、日付ウィンドウ指定可）
/// - カテゴリ別累積支出の時系列（エリアチャート用）
/// - 名前付き期間の比較テーブル（棒グラフ用）
///
/// すべて事前に取得済みのスナップショットに対する純粋な計算であり、
/// I/Oや認可チェックは呼び出し側の責務です
// サブモジュールの宣言
pub mod aggregator;
pub mod comparison;
pub mod models;
pub mod service;
pub mod timeseries;

// モデル
pub use models::{
    chart_color, CategoryTotals, ChartPair, ChartSlice, CumulativePoint, CumulativeSeries,
    DateWindow, DocumentSnapshot, SpendingSummary, CHART_COLORS,
};

// 集計
pub use aggregator::{aggregate, to_chart_pair};

// 時系列
pub use timeseries::cumulative_series;

// 期間比較
pub use comparison::{
    ComparisonRow, ComparisonTable, Period, PeriodComparison, PeriodSeries, PeriodValue,
};

// サービス
pub use service::{spending_summary, to_snapshots};
