//! Columns Module
//!
//! 見出しゆらぎを吸収した列の自動検出と、同名の重複列（例: 「備考」が2列）の
//! 役割判定（ラベル列 / 金額列）を提供するモジュール。

use tracing::debug;

use crate::amount::AmountParser;
use crate::error::XlsxToFactsError;
use crate::grid::LabeledTable;
use crate::normalize::squash_spaces;
use crate::types::ColumnRole;

/// 重複列1つ分の内容統計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnStats {
    /// 列インデックス
    pub index: usize,
    /// 金額として解析できるセルの数
    pub numeric_count: usize,
    /// 空でなく、金額として解析できないセルの数
    pub text_count: usize,
}

impl ColumnStats {
    /// 列の内容から統計を計算
    pub fn compute(table: &LabeledTable, index: usize, parser: &AmountParser) -> Self {
        let mut numeric_count = 0;
        let mut text_count = 0;
        for cell in table.column(index).flatten() {
            if parser.is_numeric_like(cell) {
                numeric_count += 1;
            } else if !cell.is_empty() {
                text_count += 1;
            }
        }
        Self {
            index,
            numeric_count,
            text_count,
        }
    }
}

/// 候補名から実際の列名を探す
///
/// 正規化後の完全一致を優先し、なければ部分一致（例: 「勘定科目名」「備考（内訳）」）。
/// 列の並び順で最初に一致した列名を返します。
pub fn find_column(table: &LabeledTable, candidates: &[String]) -> Option<String> {
    let wanted: Vec<String> = candidates
        .iter()
        .map(|c| squash_spaces(c))
        .filter(|c| !c.is_empty())
        .collect();
    let normalized: Vec<(&String, String)> = table
        .columns()
        .iter()
        .map(|c| (c, squash_spaces(c)))
        .collect();

    normalized
        .iter()
        .find(|(_, n)| wanted.iter().any(|w| w == n))
        .or_else(|| {
            normalized
                .iter()
                .find(|(_, n)| wanted.iter().any(|w| n.contains(w.as_str())))
        })
        .map(|(real, _)| (*real).clone())
}

/// 勘定科目列と備考列を自動検出する
///
/// # 戻り値
///
/// * `Ok((account, remark))` - 実際の列名のペア
/// * `Err(XlsxToFactsError::ColumnNotFound)` - どちらかが見つからない場合。
///   見つからなかった列と実際の列名の一覧を含みます。
pub fn autodetect_columns(
    sheet: &str,
    table: &LabeledTable,
    account_candidates: &[String],
    remark_candidates: &[String],
) -> Result<(String, String), XlsxToFactsError> {
    let account = find_column(table, account_candidates);
    let remark = find_column(table, remark_candidates);

    match (account, remark) {
        (Some(a), Some(r)) => {
            debug!(sheet, account = %a, remark = %r, "columns detected");
            Ok((a, r))
        }
        (a, r) => {
            let mut missing = Vec::new();
            if a.is_none() {
                missing.push("勘定科目".to_string());
            }
            if r.is_none() {
                missing.push("備考".to_string());
            }
            Err(XlsxToFactsError::ColumnNotFound {
                sheet: sheet.to_string(),
                missing,
                columns: table.columns().to_vec(),
            })
        }
    }
}

/// 同名列の役割（ラベル列 / 金額列）を判定する
///
/// * 0列: `ColumnNotFound`
/// * 1列: その列がラベル列、金額列なし
/// * 複数: [`score_roles`]で判定
pub fn resolve_roles(
    sheet: &str,
    table: &LabeledTable,
    name: &str,
    parser: &AmountParser,
) -> Result<ColumnRole, XlsxToFactsError> {
    let indices = table.column_indices(name);
    match indices.as_slice() {
        [] => Err(XlsxToFactsError::ColumnNotFound {
            sheet: sheet.to_string(),
            missing: vec![name.to_string()],
            columns: table.columns().to_vec(),
        }),
        [only] => Ok(ColumnRole {
            label: *only,
            amount: None,
        }),
        _ => {
            let stats: Vec<ColumnStats> = indices
                .iter()
                .map(|&i| ColumnStats::compute(table, i, parser))
                .collect();
            debug!(sheet, column = name, ?stats, "resolving duplicated columns");
            score_roles(&stats).ok_or_else(|| XlsxToFactsError::ColumnNotFound {
                sheet: sheet.to_string(),
                missing: vec![name.to_string()],
                columns: table.columns().to_vec(),
            })
        }
    }
}

/// 統計からラベル列と金額列を選ぶ
///
/// * ラベル列: `text_count`最大。同点なら`numeric_count`最小、さらに同点なら左の列
/// * 金額列: ラベル列以外で`numeric_count > 0`のうち`numeric_count`最大。
///   同点なら`text_count`最小、さらに同点なら左の列。該当なしなら`None`
///
/// `stats`が空なら`None`。
pub fn score_roles(stats: &[ColumnStats]) -> Option<ColumnRole> {
    let label = stats
        .iter()
        .min_by_key(|s| (std::cmp::Reverse(s.text_count), s.numeric_count, s.index))?;

    let amount = stats
        .iter()
        .filter(|s| s.index != label.index && s.numeric_count > 0)
        .min_by_key(|s| (std::cmp::Reverse(s.numeric_count), s.text_count, s.index))
        .map(|s| s.index);

    Some(ColumnRole {
        label: label.index,
        amount,
    })
}
