//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use std::io::Write;

use crate::error::XlsxToFactsError;
use crate::types::FactRecord;

/// UTF-8のバイトオーダーマーク
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSVの見出し行
pub const CSV_HEADER: [&str; 4] = ["period_end", "account", "remark_item", "amount"];

/// 金額の文字列表現
///
/// 整数値は小数点なしで出力します（`1200.0` → `"1200"`）。`-0`は`0`に揃えます。
pub fn format_amount(amount: f64) -> String {
    if amount == 0.0 {
        "0".to_string()
    } else {
        amount.to_string()
    }
}

/// CSV形式のフォーマッター
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn render<W: Write>(
        &self,
        records: &[FactRecord],
        writer: &mut W,
    ) -> Result<(), XlsxToFactsError> {
        writer.write_all(UTF8_BOM)?;

        let mut csv_writer = csv::Writer::from_writer(&mut *writer);
        csv_writer.write_record(CSV_HEADER)?;
        for record in records {
            csv_writer.write_record([
                record.period_end.to_string(),
                record.account.clone(),
                record.remark_item.clone(),
                format_amount(record.amount),
            ])?;
        }
        csv_writer.flush()?;
        drop(csv_writer);

        writer.flush()?;
        Ok(())
    }
}

/// JSON形式のフォーマッター
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(
        &self,
        records: &[FactRecord],
        writer: &mut W,
    ) -> Result<(), XlsxToFactsError> {
        serde_json::to_writer_pretty(&mut *writer, records)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
