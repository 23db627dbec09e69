//! Records Module
//!
//! 勘定科目列と役割判定済みの備考列から、ロング形式の`FactRecord`を生成するモジュール。
//!
//! 2つのレイアウトに対応します。
//!
//! * 備考（ラベル）列 + 備考（金額）列が分かれている場合は行ごとにペア化し、
//!   金額が読めない行はラベルセルからインライン抽出を試みる
//! * 備考1列にラベルと金額が混在している場合はインライン抽出のみ

use chrono::NaiveDate;

use crate::amount::AmountParser;
use crate::grid::LabeledTable;
use crate::inline::InlinePairExtractor;
use crate::normalize::clean_text;
use crate::types::{CellValue, ColumnRole, FactRecord};

/// 勘定科目の値を前方埋めする（結合セル対策）
///
/// 先頭から空が続く間は`None`のままです。
pub fn forward_fill<'a, I>(values: I) -> Vec<Option<String>>
where
    I: IntoIterator<Item = Option<&'a CellValue>>,
{
    let mut last: Option<String> = None;
    values
        .into_iter()
        .map(|cell| {
            if let Some(text) = cell.and_then(|c| clean_text(&c.as_raw_string())) {
                last = Some(text);
            }
            last.clone()
        })
        .collect()
}

/// ロング形式のレコードを抽出する
///
/// # 引数
///
/// * `table` - 見出し検出後のテーブル
/// * `account_col` - 勘定科目列のインデックス
/// * `role` - 備考列の役割（ラベル列 / 金額列）
/// * `parser` - 金額パーサー
/// * `inline` - インライン抽出器
/// * `period_end` - シートの期末日
///
/// 勘定科目が未確定の行、ラベルが空の行は黙ってスキップします。
pub fn build_long_records(
    table: &LabeledTable,
    account_col: usize,
    role: ColumnRole,
    parser: &AmountParser,
    inline: &dyn InlinePairExtractor,
    period_end: NaiveDate,
) -> Vec<FactRecord> {
    let accounts = forward_fill(table.column(account_col));
    let labels: Vec<Option<&CellValue>> = table.column(role.label).collect();
    let amounts: Option<Vec<Option<&CellValue>>> =
        role.amount.map(|idx| table.column(idx).collect());

    let mut records = Vec::new();
    for (row_idx, (account, label_cell)) in accounts.iter().zip(labels.iter()).enumerate() {
        let Some(account) = account else {
            continue;
        };
        let Some(label_text) = label_cell.and_then(CellValue::text) else {
            continue;
        };

        let direct = amounts
            .as_ref()
            .and_then(|cells| cells[row_idx])
            .and_then(|cell| parser.parse_cell(cell));

        match direct {
            Some(amount) => {
                records.extend(FactRecord::new(period_end, account, &label_text, amount));
            }
            None => {
                for (item, amount) in inline.extract(&label_text) {
                    records.extend(FactRecord::new(period_end, account, &item, amount));
                }
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::RawGrid;
    use crate::inline::RegexPairExtractor;

    fn period() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 4, 30).unwrap()
    }

    fn table(rows: &[&[&str]]) -> LabeledTable {
        LabeledTable::from_grid(&RawGrid::from_strings("s", rows), 0)
    }

    fn triples(records: &[FactRecord]) -> Vec<(&str, &str, f64)> {
        records
            .iter()
            .map(|r| (r.account.as_str(), r.remark_item.as_str(), r.amount))
            .collect()
    }

    #[test]
    fn test_forward_fill() {
        let a = CellValue::from("A");
        let b = CellValue::from("B");
        let filled = forward_fill(vec![None, Some(&a), None, Some(&b), None]);
        assert_eq!(
            filled,
            vec![
                None,
                Some("A".to_string()),
                Some("A".to_string()),
                Some("B".to_string()),
                Some("B".to_string())
            ]
        );
    }

    #[test]
    fn test_split_columns_with_unparseable_amount() {
        let t = table(&[
            &["Account", "Remarks", "Remarks"],
            &["A", "x", "100"],
            &["", "y", ""],
            &["B", "z", "50"],
        ]);
        let parser = AmountParser::default();
        let records = build_long_records(
            &t,
            0,
            ColumnRole {
                label: 1,
                amount: Some(2),
            },
            &parser,
            &RegexPairExtractor::new(parser.clone()),
            period(),
        );
        assert_eq!(triples(&records), vec![("A", "x", 100.0), ("B", "z", 50.0)]);
        assert!(records.iter().all(|r| r.period_end == period()));
    }

    #[test]
    fn test_split_columns_fall_back_to_inline() {
        let t = table(&[
            &["勘定科目", "備考", "備考"],
            &["通信費", "切手 300円 はがき 63", ""],
        ]);
        let parser = AmountParser::default();
        let records = build_long_records(
            &t,
            0,
            ColumnRole {
                label: 1,
                amount: Some(2),
            },
            &parser,
            &RegexPairExtractor::new(parser.clone()),
            period(),
        );
        assert_eq!(
            triples(&records),
            vec![("通信費", "切手", 300.0), ("通信費", "はがき", 63.0)]
        );
    }

    #[test]
    fn test_single_column_inline_only() {
        let t = table(&[
            &["勘定科目", "備考"],
            &["消耗品費", "Supplies 1,200 Postage ¥3,000"],
            &["", "返金 △500"],
            &["雑費", "メモのみ"],
        ]);
        let parser = AmountParser::default();
        let records = build_long_records(
            &t,
            0,
            ColumnRole {
                label: 1,
                amount: None,
            },
            &parser,
            &RegexPairExtractor::new(parser.clone()),
            period(),
        );
        assert_eq!(
            triples(&records),
            vec![
                ("消耗品費", "Supplies", 1200.0),
                ("消耗品費", "Postage", 3000.0),
                ("消耗品費", "返金", -500.0),
            ]
        );
    }

    #[test]
    fn test_rows_before_first_account_are_skipped() {
        let t = table(&[
            &["勘定科目", "備考", "備考"],
            &["", "前書き", "999"],
            &["旅費", "電車", "△1,000"],
        ]);
        let parser = AmountParser::default();
        let records = build_long_records(
            &t,
            0,
            ColumnRole {
                label: 1,
                amount: Some(2),
            },
            &parser,
            &RegexPairExtractor::new(parser.clone()),
            period(),
        );
        assert_eq!(triples(&records), vec![("旅費", "電車", -1000.0)]);
    }

    #[test]
    fn test_zero_amount_is_kept() {
        let t = table(&[&["勘定科目", "備考", "備考"], &["雑費", "調整", "0"]]);
        let parser = AmountParser::default();
        let records = build_long_records(
            &t,
            0,
            ColumnRole {
                label: 1,
                amount: Some(2),
            },
            &parser,
            &RegexPairExtractor::new(parser.clone()),
            period(),
        );
        assert_eq!(triples(&records), vec![("雑費", "調整", 0.0)]);
    }
}
