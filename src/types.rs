//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空白だけの文字列も空として扱います。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 値を文字列として取得（書式適用前）
    ///
    /// 整数値の数値は小数点なしで出力されます（`1200.0` → `"1200"`）。
    pub fn as_raw_string(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }

    /// 前後の空白を除いたテキスト。空なら`None`
    pub fn text(&self) -> Option<String> {
        let raw = self.as_raw_string();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// 重複した見出しから判定した列の役割
///
/// `label`は品目（ラベル）列、`amount`は金額列のインデックス。
/// 金額列がない場合、ラベル列のテキストからインライン抽出します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRole {
    /// ラベル列のインデックス
    pub label: usize,
    /// 金額列のインデックス（なければ`None`）
    pub amount: Option<usize>,
}

/// ロング形式の1レコード
///
/// `account`と`remark_item`は空でなく、`amount`は有限値です。
/// `period_end`はシートの報告月の末日です。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    /// 期末日（ISO形式 `YYYY-MM-DD` でシリアライズ）
    pub period_end: NaiveDate,
    /// 勘定科目
    pub account: String,
    /// 品目（備考のラベル）
    pub remark_item: String,
    /// 金額
    pub amount: f64,
}

impl FactRecord {
    /// レコードを生成する。不変条件を満たさない場合は`None`
    pub fn new(
        period_end: NaiveDate,
        account: &str,
        remark_item: &str,
        amount: f64,
    ) -> Option<Self> {
        let account = account.trim();
        let remark_item = remark_item.trim();
        if account.is_empty() || remark_item.is_empty() || !amount.is_finite() {
            return None;
        }
        Some(Self {
            period_end,
            account: account.to_string(),
            remark_item: remark_item.to_string(),
            amount,
        })
    }
}

/// 抽出をスキップしたシート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSheet {
    /// シート名
    pub sheet: String,
    /// スキップの理由（エラーメッセージ）
    pub reason: String,
}

/// ワークブック全体の抽出結果
///
/// `records`はシート順、シート内は行順です。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    /// 抽出されたレコード
    pub records: Vec<FactRecord>,
    /// スキップしたシート（シート順）
    pub skipped: Vec<SkippedSheet>,
}
