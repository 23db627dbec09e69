//! xlsxfacts - 月別収支ワークブックをロング形式のファクトに変換するツールキット
//!
//! This crate reads Japanese monthly revenue/expense workbooks (one sheet per month,
//! decorative title rows, duplicated 「備考」 columns, amounts such as `△1,200円`) and
//! flattens them into `(period_end, account, remark_item, amount)` records.
//! It also merges fact files and normalizes income/expense signs.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxfacts::{ExtractorBuilder, OutputFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create an extractor with default settings
//!     let extractor = ExtractorBuilder::new().with_fiscal_start_year(2023).build()?;
//!
//!     let input = File::open("令和5年度月別収支状況.xlsx")?;
//!     let output = File::create("facts_long.csv")?;
//!
//!     // Extract every sheet and write a BOM-prefixed CSV
//!     let report = extractor.extract_to_writer(input, output, OutputFormat::Csv)?;
//!     println!("{} records, {} sheets skipped", report.records.len(), report.skipped.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Single Sheet
//!
//! Each pipeline stage works on an in-memory grid, so a sheet can be processed
//! without a workbook:
//!
//! ```rust
//! use xlsxfacts::{ExtractorBuilder, RawGrid};
//!
//! # fn main() -> Result<(), xlsxfacts::XlsxToFactsError> {
//! let grid = RawGrid::from_strings(
//!     "2023-04",
//!     &[
//!         &["月別収支", "", ""],
//!         &["勘定科目", "備考", "備考"],
//!         &["通信費", "切手", "300"],
//!     ],
//! );
//! let records = ExtractorBuilder::new().build()?.extract_sheet(&grid)?;
//! assert_eq!(records[0].remark_item, "切手");
//! assert_eq!(records[0].amount, 300.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Merge and Sign
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxfacts::{merge_facts, read_facts_csv, DedupKey, SignNormalizer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let a = read_facts_csv(File::open("facts_long_1.csv")?)?;
//!     let b = read_facts_csv(File::open("facts_long_2.csv")?)?;
//!     let merged = merge_facts(vec![a, b], DedupKey::All);
//!
//!     let signs = SignNormalizer::new(["商品売上高（4111）", "手数料収入（4112）"]);
//!     let summary = signs.summarize(&merged);
//!     println!("net: {}", summary.net);
//!     Ok(())
//! }
//! ```

mod amount;
mod api;
mod builder;
mod columns;
mod error;
mod grid;
mod header;
mod inline;
pub mod normalize;
mod output;
mod parser;
pub mod period;
mod records;
mod security;
pub mod signs;
mod types;

// 公開API
pub use amount::AmountParser;
pub use api::{DedupKey, OutputFormat, SheetSelector};
pub use builder::{ExtractionConfig, Extractor, ExtractorBuilder, DEFAULT_MAX_HEADER_SCAN_ROWS};
pub use columns::{autodetect_columns, find_column, resolve_roles, score_roles, ColumnStats};
pub use error::XlsxToFactsError;
pub use grid::{LabeledTable, RawGrid};
pub use header::{build_table, load_table, locate_header};
pub use inline::{InlinePairExtractor, RegexPairExtractor};
pub use output::{
    format_amount, merge_facts, read_facts_csv, sort_facts, write_facts, CSV_HEADER, UTF8_BOM,
};
pub use period::PeriodResolver;
pub use records::{build_long_records, forward_fill};
pub use signs::{SignNormalizer, SignSummary};
pub use types::{CellValue, ColumnRole, ExtractionReport, FactRecord, SkippedSheet};
