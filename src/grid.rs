//! Grid Module
//!
//! シートの生グリッド（見出し解釈前）と、見出し検出後のラベル付きテーブルを提供するモジュール。

use unicode_width::UnicodeWidthStr;

use crate::types::CellValue;

/// シートの生グリッド（行 × 列）
///
/// ワークブックから読み込んだままのセル値を保持します。読み込み後は変更されません。
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    /// シート名
    name: String,

    /// グリッドデータ（行 × 列、すべての行は同じ長さ）
    cells: Vec<Vec<CellValue>>,

    /// 列数
    cols: usize,
}

impl RawGrid {
    /// 行データからグリッドを構築
    ///
    /// 行ごとの長さが異なる場合は、最長の行に合わせて`Empty`で埋めます。
    pub fn new(name: impl Into<String>, mut rows: Vec<Vec<CellValue>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(cols, CellValue::Empty);
        }
        Self {
            name: name.into(),
            cells: rows,
            cols,
        }
    }

    /// 文字列の2次元配列からグリッドを構築（空文字列は空セル）
    pub fn from_strings(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|s| CellValue::from(*s)).collect())
            .collect();
        Self::new(name, rows)
    }

    /// シート名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 行数
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// 列数
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 指定された行を取得
    pub fn row(&self, row_idx: usize) -> &[CellValue] {
        self.cells.get(row_idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 指定されたセルを取得
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// 先頭`max_rows`行 × `max_cols`列を固定幅のテキスト表として出力
    ///
    /// 見出しを検出できなかったときの診断用です。全角文字は表示幅2として揃えます。
    pub fn preview(&self, max_rows: usize, max_cols: usize) -> String {
        let rows = self.rows().min(max_rows);
        let cols = self.cols.min(max_cols);
        if rows == 0 || cols == 0 {
            return "(empty sheet)".to_string();
        }

        let index_width = (rows - 1).to_string().len();
        let contents: Vec<Vec<String>> = (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|c| {
                        self.cells[r][c]
                            .as_raw_string()
                            .replace(['\n', '\r'], " ")
                            .trim()
                            .to_string()
                    })
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = (0..cols).map(|c| column_letter(c).len()).collect();
        for row in &contents {
            for (c, cell) in row.iter().enumerate() {
                widths[c] = widths[c].max(cell.width());
            }
        }

        let mut lines = Vec::with_capacity(rows + 1);
        let header: Vec<String> = (0..cols)
            .map(|c| pad(&column_letter(c), widths[c]))
            .collect();
        lines.push(format!("{} | {}", " ".repeat(index_width), header.join(" | ")));
        for (r, row) in contents.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(c, cell)| pad(cell, widths[c]))
                .collect();
            lines.push(format!(
                "{:>width$} | {}",
                r,
                cells.join(" | "),
                width = index_width
            ));
        }
        lines
            .into_iter()
            .map(|l| l.trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 表示幅に基づいて右側をスペースで埋める
fn pad(content: &str, width: usize) -> String {
    let content_width = content.width();
    let mut padded = content.to_string();
    if content_width < width {
        padded.push_str(&" ".repeat(width - content_width));
    }
    padded
}

/// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
pub(crate) fn column_letter(mut col: usize) -> String {
    let mut result = String::new();
    loop {
        let remainder = col % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// 見出し検出後のテーブル
///
/// 列名は見出し行から取り、空の見出しは左隣の列名で前方埋めされます。
/// 同じ列名が複数現れることがあります（例: 「備考」が2列）。
/// セルは前後の空白を除いたテキストで、空セルは`None`です。
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<CellValue>>>,
}

impl LabeledTable {
    /// 見出し行の下からテーブルを構築
    ///
    /// すべてのセルが空の行は除外します。
    pub fn from_grid(grid: &RawGrid, header_row: usize) -> Self {
        let mut columns = Vec::with_capacity(grid.cols());
        let mut last = String::new();
        for cell in grid.row(header_row) {
            match cell.text() {
                Some(name) => {
                    last = name.clone();
                    columns.push(name);
                }
                None => columns.push(last.clone()),
            }
        }
        columns.resize(grid.cols(), last);

        let rows = ((header_row + 1)..grid.rows())
            .map(|r| {
                grid.row(r)
                    .iter()
                    .map(|cell| (!cell.is_empty()).then(|| trim_cell(cell)))
                    .collect::<Vec<_>>()
            })
            .filter(|row: &Vec<Option<CellValue>>| row.iter().any(Option::is_some))
            .collect();

        Self { columns, rows }
    }

    /// 列名の一覧（重複を含む）
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 行がないかどうか
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 指定された名前の列インデックス（出現順）
    pub fn column_indices(&self, name: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.as_str() == name)
            .map(|(i, _)| i)
            .collect()
    }

    /// 列の値を上から順に取得
    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<&CellValue>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).and_then(Option::as_ref))
    }

    /// 重複している列名（出現順、重複なし）
    pub fn duplicated_columns(&self) -> Vec<String> {
        let mut dups: Vec<String> = Vec::new();
        for name in &self.columns {
            if self.columns.iter().filter(|c| *c == name).count() > 1 && !dups.contains(name) {
                dups.push(name.clone());
            }
        }
        dups
    }
}

fn trim_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::String(s) => CellValue::String(s.trim().to_string()),
        other => other.clone(),
    }
}
