//! Workbook Parser
//!
//! calamineを使用したワークブックの読み込み。シートを見出し解釈前の`RawGrid`に変換します。

use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use tracing::debug;

use crate::api::SheetSelector;
use crate::error::XlsxToFactsError;
use crate::grid::RawGrid;
use crate::security::SecurityConfig;
use crate::types::CellValue;

/// ワークブックパーサー
///
/// calamineのラッパーとして、ワークブックレベルの操作を提供します。
/// 形式（xlsx / xlsm / xls / ods）は内容から自動判定します。
pub(crate) struct WorkbookParser {
    workbook: Sheets<Cursor<Vec<u8>>>,
}

impl WorkbookParser {
    /// ワークブックを開く
    ///
    /// 入力をサイズ制限つきでメモリに読み込んでから解析します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - 読み込みに成功した場合
    /// * `Err(XlsxToFactsError::SecurityViolation)` - 入力が大きすぎる場合
    /// * `Err(XlsxToFactsError::Parse)` - ワークブックとして読めない場合
    pub fn open<R: Read>(reader: R) -> Result<Self, XlsxToFactsError> {
        let buffer = SecurityConfig::default().read_limited(reader)?;
        debug!(bytes = buffer.len(), "opening workbook");
        let workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        Ok(Self { workbook })
    }

    /// すべてのシート名を取得（ワークブック内の順序）
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// シート選択方式に基づいてシートを選択
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<String>)` - 選択されたシート名のリスト（指定順）
    /// * `Err(XlsxToFactsError::Config)` - シートが見つからない、またはインデックスが範囲外の場合
    pub fn select_sheets(&self, selector: &SheetSelector) -> Result<Vec<String>, XlsxToFactsError> {
        select_sheet_names(&self.sheet_names(), selector)
    }

    /// シートを読み込んで`RawGrid`に変換
    ///
    /// calamineの範囲は最初の非空セルから始まるため、左上（A1）からの位置に揃えて埋めます。
    pub fn read_grid(&mut self, sheet_name: &str) -> Result<RawGrid, XlsxToFactsError> {
        let range = self.workbook.worksheet_range(sheet_name)?;
        Ok(range_to_grid(sheet_name, &range))
    }
}

/// シート名の一覧から選択する
pub(crate) fn select_sheet_names(
    all_sheet_names: &[String],
    selector: &SheetSelector,
) -> Result<Vec<String>, XlsxToFactsError> {
    let by_index = |index: usize| {
        all_sheet_names.get(index).cloned().ok_or_else(|| {
            XlsxToFactsError::Config(format!(
                "Sheet index {} is out of range (total: {})",
                index,
                all_sheet_names.len()
            ))
        })
    };
    let by_name = |name: &String| {
        if all_sheet_names.contains(name) {
            Ok(name.clone())
        } else {
            Err(XlsxToFactsError::Config(format!("Sheet '{}' not found", name)))
        }
    };

    match selector {
        SheetSelector::All => Ok(all_sheet_names.to_vec()),
        SheetSelector::Index(index) => Ok(vec![by_index(*index)?]),
        SheetSelector::Name(name) => Ok(vec![by_name(name)?]),
        SheetSelector::Indices(indices) => indices.iter().map(|&i| by_index(i)).collect(),
        SheetSelector::Names(names) => names.iter().map(by_name).collect(),
    }
}

/// calamineの範囲を`RawGrid`に変換
fn range_to_grid(sheet_name: &str, range: &Range<Data>) -> RawGrid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; col_offset];
        cells.extend(row.iter().map(convert_cell));
        rows.push(cells);
    }
    RawGrid::new(sheet_name, rows)
}

/// calamineのセル値を変換
///
/// 日付セルはExcelのシリアル値（数値）として扱います。
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        _ => CellValue::Empty,
    }
}
