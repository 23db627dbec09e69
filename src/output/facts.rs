//! ファクトCSVの読み込み、マージ、並べ替え

use std::collections::HashSet;
use std::io::Read;

use crate::amount::AmountParser;
use crate::api::DedupKey;
use crate::error::XlsxToFactsError;
use crate::period::repair_date;
use crate::types::FactRecord;

/// ファクトCSVを読み込む
///
/// 先頭4列を`期末日, 勘定科目, 品目, 金額`として位置で読みます（見出し名は問いません）。
/// BOMは読み飛ばし、存在しない日付（`2022-02-30`など）は月の範囲に丸めます。
/// 金額は台帳と同じ規則（桁区切り、`△`、括弧）で読み、`NaN`や指数表記は受け付けません。
/// 空行は無視します。
pub fn read_facts_csv<R: Read>(mut reader: R) -> Result<Vec<FactRecord>, XlsxToFactsError> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let parser = AmountParser::default();
    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if row.len() < 4 {
            return Err(XlsxToFactsError::InvalidFact {
                line,
                message: format!("expected 4 columns, found {}", row.len()),
            });
        }

        let period_end = repair_date(&row[0]).ok_or_else(|| XlsxToFactsError::InvalidFact {
            line,
            message: format!("invalid date '{}'", &row[0]),
        })?;
        let amount = parser
            .parse(&row[3])
            .ok_or_else(|| XlsxToFactsError::InvalidFact {
                line,
                message: format!("invalid amount '{}'", &row[3]),
            })?;
        let record = FactRecord::new(period_end, &row[1], &row[2], amount).ok_or_else(|| {
            XlsxToFactsError::InvalidFact {
                line,
                message: "account and remark item must not be empty".to_string(),
            }
        })?;
        records.push(record);
    }
    Ok(records)
}

/// 複数のレコード集合をマージする
///
/// 連結後、`period_end`の昇順に安定ソートし、重複は最初の1件を残します。
pub fn merge_facts<I>(sets: I, key: DedupKey) -> Vec<FactRecord>
where
    I: IntoIterator<Item = Vec<FactRecord>>,
{
    let mut merged: Vec<FactRecord> = sets.into_iter().flatten().collect();
    merged.sort_by_key(|r| r.period_end);

    let mut seen = HashSet::new();
    merged.retain(|r| {
        let amount_bits = match key {
            DedupKey::Item => None,
            DedupKey::All => Some(r.amount.to_bits()),
        };
        seen.insert((
            r.period_end,
            r.account.clone(),
            r.remark_item.clone(),
            amount_bits,
        ))
    });
    merged
}

/// `(period_end, account, remark_item)`の順に並べ替える
pub fn sort_facts(records: &mut [FactRecord]) {
    records.sort_by(|a, b| {
        (a.period_end, &a.account, &a.remark_item).cmp(&(b.period_end, &b.account, &b.remark_item))
    });
}
