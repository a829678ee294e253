use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OCRテキストから抽出されたフィールド一式
///
/// 各フィールドは独立して抽出され、抽出に失敗した場合は
/// 安全なデフォルト値（0.0 / 空文字列 / None）に退避する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// 抽出された金額（小数点以下2桁に丸め済み、未検出時は0.0）
    pub amount: f64,
    /// 抽出された会社名（未検出時は空文字列）
    pub company: String,
    /// 抽出された日付（時刻情報がない場合は深夜0時、未検出時はNone）
    pub date: Option<NaiveDateTime>,
}
