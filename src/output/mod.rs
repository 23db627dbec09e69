//! Output Format Module
//!
//! ロング形式レコードの書き出しと、書き出したファクトファイルの読み込み・マージを提供するモジュール。

mod facts;
mod formatters;

use std::io::Write;

use crate::api::OutputFormat;
use crate::error::XlsxToFactsError;
use crate::types::FactRecord;

pub use facts::{merge_facts, read_facts_csv, sort_facts};
use formatters::{CsvFormatter, JsonFormatter};
pub use formatters::{format_amount, CSV_HEADER, UTF8_BOM};

/// 出力フォーマッター
///
/// 各出力フォーマット（CSV, JSON）をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub enum OutputFormatter {
    Csv,
    Json,
}

impl OutputFormatter {
    /// 出力フォーマットからフォーマッターを生成
    pub fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => OutputFormatter::Csv,
            OutputFormat::Json => OutputFormatter::Json,
        }
    }

    /// レコードを指定されたフォーマットで出力する
    pub fn render<W: Write>(
        &self,
        records: &[FactRecord],
        writer: &mut W,
    ) -> Result<(), XlsxToFactsError> {
        match self {
            OutputFormatter::Csv => CsvFormatter.render(records, writer),
            OutputFormatter::Json => JsonFormatter.render(records, writer),
        }
    }
}

/// レコードを書き出す
///
/// ```
/// use xlsxfacts::{write_facts, OutputFormat};
///
/// let mut out = Vec::new();
/// write_facts(&[], &mut out, OutputFormat::Csv).unwrap();
/// assert!(out.starts_with(b"\xEF\xBB\xBFperiod_end,account,remark_item,amount"));
/// ```
pub fn write_facts<W: Write>(
    records: &[FactRecord],
    writer: &mut W,
    format: OutputFormat,
) -> Result<(), XlsxToFactsError> {
    OutputFormatter::from_format(format).render(records, writer)
}
