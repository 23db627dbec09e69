//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlsxfactsクレート全体で使用するエラー型
///
/// ワークブックの読み込み、見出し検出、列の判定、期間の解決、CSV入出力で
/// 発生するすべてのエラーを統一的に扱うために使用されます。
///
/// 金額セルの解析失敗はここには含まれません。解析できないセルは
/// `None`（値なし）として扱われ、インライン抽出へのフォールバックに回ります。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxfacts::XlsxToFactsError;
/// use std::fs::File;
///
/// fn open_ledger(path: &str) -> Result<(), XlsxToFactsError> {
///     let _file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxToFactsError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// CSVの読み書きで発生したエラー
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSONの読み書きで発生したエラー（設定ファイル、JSON出力）
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `ExtractorBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    ///
    /// ```rust,no_run
    /// use xlsxfacts::{ExtractorBuilder, XlsxToFactsError};
    ///
    /// let result = ExtractorBuilder::new()
    ///     .with_max_header_scan_rows(0)
    ///     .build();
    ///
    /// match result {
    ///     Err(XlsxToFactsError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 見出し行を検出できなかったエラー
    ///
    /// 走査範囲内に見出し語彙を2つ以上含む行がなかった場合に発生します。
    /// `preview`には走査範囲の先頭部分が固定幅のテキストで入ります。
    #[error("Header row not found in sheet '{sheet}'. Preview of the scanned rows:\n{preview}")]
    HeaderNotFound {
        /// シート名
        sheet: String,
        /// 走査範囲のプレビュー
        preview: String,
    },

    /// 必要な列（勘定科目・備考）が見つからなかったエラー
    #[error("Column not found in sheet '{sheet}': {}. Actual columns: {columns:?}", .missing.join(", "))]
    ColumnNotFound {
        /// シート名
        sheet: String,
        /// 見つからなかった列の種類
        missing: Vec<String>,
        /// 見出し検出後の実際の列名
        columns: Vec<String>,
    },

    /// シート名から報告月を特定できなかったエラー
    ///
    /// 呼び出し側はこのシートをスキップします。
    #[error("Could not resolve the reporting month from sheet name '{sheet}'")]
    PeriodUnresolved {
        /// シート名
        sheet: String,
    },

    /// ファクトCSVの行を解釈できなかったエラー
    #[error("Invalid fact row at line {line}: {message}")]
    InvalidFact {
        /// CSV上の行番号（1始まり、見出し行を含む）
        line: u64,
        /// 内容
        message: String,
    },

    /// 入力サイズ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl XlsxToFactsError {
    /// シート単位でスキップしてよいエラーかどうか
    ///
    /// `PeriodUnresolved`は常にスキップ対象、見出し・列のエラーは
    /// 設定でスキップを許可した場合のみスキップ対象になります。
    pub fn is_sheet_local(&self) -> bool {
        matches!(
            self,
            XlsxToFactsError::HeaderNotFound { .. }
                | XlsxToFactsError::ColumnNotFound { .. }
                | XlsxToFactsError::PeriodUnresolved { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: XlsxToFactsError = io_err.into();

        match error {
            XlsxToFactsError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_parse_error_display() {
        let error: XlsxToFactsError = calamine::Error::Msg("Corrupted file").into();
        let error_msg = error.to_string();
        assert!(error_msg.contains("Failed to parse Excel file"));
        assert!(error_msg.contains("Corrupted file"));
    }

    #[test]
    fn test_header_not_found_includes_preview() {
        let error = XlsxToFactsError::HeaderNotFound {
            sheet: "2022-04".to_string(),
            preview: "0 | 月別収支".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("2022-04"));
        assert!(msg.contains("月別収支"));
    }

    #[test]
    fn test_column_not_found_lists_columns() {
        let error = XlsxToFactsError::ColumnNotFound {
            sheet: "4月".to_string(),
            missing: vec!["勘定科目".to_string(), "備考".to_string()],
            columns: vec!["日付".to_string(), "金額".to_string()],
        };
        let msg = error.to_string();
        assert!(msg.contains("勘定科目, 備考"));
        assert!(msg.contains("金額"));
    }

    #[test]
    fn test_is_sheet_local() {
        assert!(XlsxToFactsError::PeriodUnresolved {
            sheet: "集計".to_string()
        }
        .is_sheet_local());
        assert!(!XlsxToFactsError::Config("x".to_string()).is_sheet_local());
        assert!(!XlsxToFactsError::SecurityViolation("x".to_string()).is_sheet_local());
    }

    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), XlsxToFactsError> {
            let _file = std::fs::File::open("nonexistent_file.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(XlsxToFactsError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }
}
