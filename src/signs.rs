//! Signs Module
//!
//! 勘定科目名から収入・支出を判定し、金額の符号を揃える（収入は正、支出は負）モジュール。
//! 符号調整後のレコードから全体・月次の損益サマリーを集計します。

use std::collections::{BTreeMap, HashSet};

use chrono::Datelike;

use crate::types::FactRecord;

/// 勘定科目名を比較用に正規化する
///
/// 前後の空白を除き、全角括弧と全角数字を半角に寄せ、連続する空白を1つにまとめます。
///
/// ```
/// use xlsxfacts::signs::normalize_account;
///
/// assert_eq!(normalize_account(" 商品売上高（４１１１） "), "商品売上高(4111)");
/// ```
pub fn normalize_account(name: &str) -> String {
    let mapped: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            other => other,
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 収入科目の集合にもとづく符号調整器
#[derive(Debug, Clone, Default)]
pub struct SignNormalizer {
    income_accounts: HashSet<String>,
}

impl SignNormalizer {
    /// 収入として扱う勘定科目名から生成
    pub fn new<I, S>(income_accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            income_accounts: income_accounts
                .into_iter()
                .map(|name| normalize_account(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// 勘定科目が収入かどうか
    pub fn is_income(&self, account: &str) -> bool {
        self.income_accounts.contains(&normalize_account(account))
    }

    /// 符号を調整した金額（収入は`+|amount|`、それ以外は`-|amount|`）
    pub fn signed_amount(&self, record: &FactRecord) -> f64 {
        if self.is_income(&record.account) {
            record.amount.abs()
        } else {
            -record.amount.abs()
        }
    }

    /// 符号を調整したレコードを返す（順序は維持）
    pub fn apply(&self, records: &[FactRecord]) -> Vec<FactRecord> {
        records
            .iter()
            .map(|r| FactRecord {
                amount: self.signed_amount(r),
                ..r.clone()
            })
            .collect()
    }

    /// 符号調整後の損益サマリーを集計する
    pub fn summarize(&self, records: &[FactRecord]) -> SignSummary {
        let mut summary = SignSummary::default();
        let mut monthly: BTreeMap<(i32, u32), f64> = BTreeMap::new();

        for record in records {
            let amount = self.signed_amount(record);
            if self.is_income(&record.account) {
                summary.income += amount;
            } else {
                summary.expense += amount;
            }
            *monthly
                .entry((record.period_end.year(), record.period_end.month()))
                .or_insert(0.0) += amount;
        }

        summary.net = summary.income + summary.expense;
        summary.monthly = monthly
            .into_iter()
            .map(|((year, month), net)| (format!("{year:04}-{month:02}"), net))
            .collect();
        summary
    }
}

/// 損益サマリー
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignSummary {
    /// 収入合計（正）
    pub income: f64,
    /// 支出合計（負）
    pub expense: f64,
    /// 当期損益
    pub net: f64,
    /// 年月（`YYYY-MM`）ごとの損益。年月の昇順
    pub monthly: Vec<(String, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(y: i32, m: u32, d: u32, account: &str, amount: f64) -> FactRecord {
        FactRecord::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), account, "x", amount).unwrap()
    }

    fn normalizer() -> SignNormalizer {
        SignNormalizer::new(["商品売上高（4111）", "手数料収入（4112）"])
    }

    #[test]
    fn test_normalize_account() {
        assert_eq!(normalize_account("手数料収入（４１１２）"), "手数料収入(4112)");
        assert_eq!(normalize_account("  その他 　 の収入  "), "その他 の収入");
        assert_eq!(normalize_account(""), "");
    }

    #[test]
    fn test_income_matching_ignores_width_variants() {
        let n = normalizer();
        assert!(n.is_income("商品売上高(4111)"));
        assert!(n.is_income(" 商品売上高（４１１１）"));
        assert!(!n.is_income("通信費"));
    }

    #[test]
    fn test_apply_sets_signs() {
        let n = normalizer();
        let signed = n.apply(&[
            record(2023, 4, 30, "商品売上高(4111)", -1000.0),
            record(2023, 4, 30, "通信費", 300.0),
            record(2023, 4, 30, "旅費", -200.0),
        ]);
        let amounts: Vec<f64> = signed.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![1000.0, -300.0, -200.0]);
        assert_eq!(signed[1].account, "通信費");
    }

    #[test]
    fn test_summarize_totals_and_monthly() {
        let n = normalizer();
        let summary = n.summarize(&[
            record(2023, 5, 31, "商品売上高(4111)", 5000.0),
            record(2023, 4, 30, "手数料収入(4112)", 1000.0),
            record(2023, 4, 30, "通信費", 300.0),
            record(2023, 5, 31, "旅費", 700.0),
        ]);
        assert_eq!(summary.income, 6000.0);
        assert_eq!(summary.expense, -1000.0);
        assert_eq!(summary.net, 5000.0);
        assert_eq!(
            summary.monthly,
            vec![
                ("2023-04".to_string(), 700.0),
                ("2023-05".to_string(), 4300.0)
            ]
        );
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(normalizer().summarize(&[]), SignSummary::default());
    }
}
