//! Header Module
//!
//! シート上部の飾り行・タイトル行を読み飛ばし、見出し行を自動検出するモジュール。

use tracing::debug;

use crate::error::XlsxToFactsError;
use crate::grid::{LabeledTable, RawGrid};
use crate::normalize::squash_spaces;

/// 見出しが見つからなかったときに表示するプレビューの行数
pub const PREVIEW_ROWS: usize = 60;

/// 見出しが見つからなかったときに表示するプレビューの列数
pub const PREVIEW_COLS: usize = 12;

/// 見出し行を検出する
///
/// 先頭から最大`max_rows`行を走査し、語彙のいずれかを（正規化後の部分文字列として）
/// 含むセルが2つ以上ある最初の行を返します。
/// 比較の前に、セルと語彙の両方から全角・半角のゆらぎと空白を取り除きます。
/// `勘定科目`と`勘　定　科　目`のように正規化後に同じになる語は1語として扱います。
///
/// # 戻り値
///
/// * `Ok(usize)` - 見出し行のインデックス
/// * `Err(XlsxToFactsError::HeaderNotFound)` - 走査範囲に該当行がない場合。
///   走査範囲のプレビューを含みます。
pub fn locate_header(
    grid: &RawGrid,
    vocabulary: &[String],
    max_rows: usize,
) -> Result<usize, XlsxToFactsError> {
    let mut terms: Vec<String> = vocabulary
        .iter()
        .map(|w| squash_spaces(w))
        .filter(|w| !w.is_empty())
        .collect();
    terms.sort();
    terms.dedup();

    let limit = grid.rows().min(max_rows);
    for row_idx in 0..limit {
        let cells: Vec<String> = grid
            .row(row_idx)
            .iter()
            .map(|c| squash_spaces(&c.as_raw_string()))
            .filter(|c| !c.is_empty())
            .collect();
        if cells.is_empty() {
            continue;
        }

        let hits = cells
            .iter()
            .filter(|cell| terms.iter().any(|term| cell.contains(term.as_str())))
            .count();
        if hits >= 2 {
            debug!(sheet = grid.name(), row = row_idx, hits, "header row detected");
            return Ok(row_idx);
        }
    }

    Err(XlsxToFactsError::HeaderNotFound {
        sheet: grid.name().to_string(),
        preview: grid.preview(PREVIEW_ROWS.min(limit.max(1)), PREVIEW_COLS),
    })
}

/// 見出し行の下からラベル付きテーブルを構築する
pub fn build_table(grid: &RawGrid, header_row: usize) -> LabeledTable {
    LabeledTable::from_grid(grid, header_row)
}

/// 見出し行を検出してラベル付きテーブルを構築する
pub fn load_table(
    grid: &RawGrid,
    vocabulary: &[String],
    max_rows: usize,
) -> Result<LabeledTable, XlsxToFactsError> {
    let header_row = locate_header(grid, vocabulary, max_rows)?;
    Ok(build_table(grid, header_row))
}
