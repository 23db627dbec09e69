//! Integration Tests for xlsxfacts
//!
//! rust_xlsxwriterでメモリ上に月別収支のワークブックを生成し、
//! 読み込みからCSV/JSONの書き出し、マージ、符号調整までを通しで検証します。

use chrono::NaiveDate;
use rust_xlsxwriter::*;
use std::fs::File;
use std::io::Cursor;
use xlsxfacts::{
    merge_facts, read_facts_csv, write_facts, DedupKey, ExtractorBuilder, FactRecord,
    OutputFormat, SheetSelector, SignNormalizer, XlsxToFactsError, UTF8_BOM,
};

// Helper module for generating ledger fixtures
mod fixtures {
    use super::*;

    /// 1か月分の収支シートを書き込む
    ///
    /// タイトル行と空行の下に見出し（全角スペース入り、備考は2列）があり、
    /// 勘定科目のセルは結合されています。
    pub fn write_ledger_sheet(worksheet: &mut Worksheet, name: &str) -> Result<(), XlsxError> {
        worksheet.set_name(name)?;
        worksheet.write_string(0, 0, "令和5年度 月別収支状況")?;

        worksheet.write_string(2, 0, "勘　定　科　目")?;
        worksheet.write_string(2, 1, "備　　　　　　　　考")?;
        worksheet.write_string(2, 2, "備　　　　　　　　考")?;

        worksheet.merge_range(3, 0, 4, 0, "通信費", &Format::new())?;
        worksheet.write_string(3, 1, "切手")?;
        worksheet.write_number(3, 2, 300.0)?;
        worksheet.write_string(4, 1, "はがき")?;
        worksheet.write_string(4, 2, "６３円")?;

        worksheet.write_string(5, 0, "消耗品費")?;
        worksheet.write_string(5, 1, "コピー用紙 1,200円 トナー ¥3,000")?;

        worksheet.write_string(6, 0, "雑収入")?;
        worksheet.write_string(6, 1, "返金")?;
        worksheet.write_string(6, 2, "△500")?;
        Ok(())
    }

    /// 1シートだけの収支ワークブック
    pub fn generate_single_month(name: &str) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        write_ledger_sheet(workbook.add_worksheet(), name)?;
        Ok(workbook.save_to_buffer()?)
    }

    /// 月のみのシート名（4月, 5月, 3月）と集計シートを含むワークブック
    pub fn generate_fiscal_year() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        write_ledger_sheet(workbook.add_worksheet(), "4月")?;
        write_ledger_sheet(workbook.add_worksheet(), "5月")?;

        let summary = workbook.add_worksheet();
        summary.set_name("集計")?;
        summary.write_string(0, 0, "年間合計")?;
        summary.write_number(0, 1, 123456.0)?;

        write_ledger_sheet(workbook.add_worksheet(), "3月")?;
        Ok(workbook.save_to_buffer()?)
    }

    /// 見出しのないシートを含むワークブック
    pub fn generate_with_headerless_sheet() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        write_ledger_sheet(workbook.add_worksheet(), "2023-04")?;

        let memo = workbook.add_worksheet();
        memo.set_name("2023-05")?;
        memo.write_string(0, 0, "今月は記帳なし")?;
        Ok(workbook.save_to_buffer()?)
    }

    /// 備考が1列で、ラベルと金額が混在しているシート
    pub fn generate_inline_only() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("R5-06")?;
        worksheet.write_string(0, 0, "勘定科目")?;
        worksheet.write_string(0, 1, "摘要")?;
        worksheet.write_string(1, 0, "旅費交通費")?;
        worksheet.write_string(1, 1, "電車 480円、タクシー（1,500）")?;
        worksheet.write_string(2, 0, "会議費")?;
        worksheet.write_string(2, 1, "お茶代：２，０００円")?;
        Ok(workbook.save_to_buffer()?)
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn triples(records: &[FactRecord]) -> Vec<(&str, &str, f64)> {
    records
        .iter()
        .map(|r| (r.account.as_str(), r.remark_item.as_str(), r.amount))
        .collect()
}

#[test]
fn test_extract_single_month() {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let data = fixtures::generate_single_month("2023-04").unwrap();

    let report = extractor.extract(Cursor::new(data)).unwrap();

    assert!(report.skipped.is_empty());
    assert_eq!(
        triples(&report.records),
        vec![
            ("通信費", "切手", 300.0),
            ("通信費", "はがき", 63.0),
            ("消耗品費", "コピー用紙", 1200.0),
            ("消耗品費", "トナー", 3000.0),
            ("雑収入", "返金", -500.0),
        ]
    );
    assert!(report
        .records
        .iter()
        .all(|r| r.period_end == date(2023, 4, 30)));
}

#[test]
fn test_extract_fiscal_year_workbook() {
    let extractor = ExtractorBuilder::new()
        .with_fiscal_start_year(2023)
        .build()
        .unwrap();
    let data = fixtures::generate_fiscal_year().unwrap();

    let report = extractor.extract(Cursor::new(data)).unwrap();

    // シート順（4月, 5月, 3月）に連結される
    let periods: Vec<NaiveDate> = report.records.iter().map(|r| r.period_end).collect();
    assert_eq!(periods.len(), 15);
    assert_eq!(periods[0], date(2023, 4, 30));
    assert_eq!(periods[5], date(2023, 5, 31));
    assert_eq!(periods[10], date(2024, 3, 31));

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].sheet, "集計");
}

#[test]
fn test_month_only_sheets_without_fiscal_year_are_skipped() {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let data = fixtures::generate_fiscal_year().unwrap();

    let report = extractor.extract(Cursor::new(data)).unwrap();

    assert!(report.records.is_empty());
    let skipped: Vec<&str> = report.skipped.iter().map(|s| s.sheet.as_str()).collect();
    assert_eq!(skipped, vec!["4月", "5月", "集計", "3月"]);
}

#[test]
fn test_fiscal_year_inferred_from_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("令和5年度月別収支状況.xlsx");
    std::fs::write(&path, fixtures::generate_fiscal_year().unwrap()).unwrap();

    let extractor = ExtractorBuilder::new().build().unwrap();
    let report = extractor.extract_path(&path).unwrap();

    assert_eq!(report.records.len(), 15);
    assert_eq!(report.records.last().unwrap().period_end, date(2024, 3, 31));
}

#[test]
fn test_sheet_selector() {
    let extractor = ExtractorBuilder::new()
        .with_fiscal_start_year(2023)
        .with_sheet_selector(SheetSelector::Names(vec!["3月".to_string()]))
        .build()
        .unwrap();
    let data = fixtures::generate_fiscal_year().unwrap();

    let report = extractor.extract(Cursor::new(data)).unwrap();
    assert_eq!(report.records.len(), 5);
    assert!(report
        .records
        .iter()
        .all(|r| r.period_end == date(2024, 3, 31)));

    let missing = ExtractorBuilder::new()
        .with_sheet_selector(SheetSelector::Name("6月".to_string()))
        .build()
        .unwrap();
    let data = fixtures::generate_fiscal_year().unwrap();
    assert!(matches!(
        missing.extract(Cursor::new(data)),
        Err(XlsxToFactsError::Config(_))
    ));
}

#[test]
fn test_headerless_sheet_skipped_or_fatal() {
    let lenient = ExtractorBuilder::new().build().unwrap();
    let report = lenient
        .extract(Cursor::new(fixtures::generate_with_headerless_sheet().unwrap()))
        .unwrap();
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.skipped[0].sheet, "2023-05");
    assert!(report.skipped[0].reason.contains("今月は記帳なし"));

    let strict = ExtractorBuilder::new().skip_failed_sheets(false).build().unwrap();
    match strict.extract(Cursor::new(fixtures::generate_with_headerless_sheet().unwrap())) {
        Err(XlsxToFactsError::HeaderNotFound { sheet, preview }) => {
            assert_eq!(sheet, "2023-05");
            assert!(preview.contains("今月は記帳なし"));
        }
        other => panic!("Expected HeaderNotFound, got {:?}", other),
    }
}

#[test]
fn test_inline_only_layout() {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let report = extractor
        .extract(Cursor::new(fixtures::generate_inline_only().unwrap()))
        .unwrap();

    assert_eq!(
        triples(&report.records),
        vec![
            ("旅費交通費", "電車", 480.0),
            ("旅費交通費", "タクシー", -1500.0),
            ("会議費", "お茶代", 2000.0),
        ]
    );
    assert!(report
        .records
        .iter()
        .all(|r| r.period_end == date(2023, 6, 30)));
}

#[test]
fn test_csv_output() {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let input = Cursor::new(fixtures::generate_single_month("2023-04").unwrap());
    let mut output = Vec::new();

    extractor
        .extract_to_writer(input, &mut output, OutputFormat::Csv)
        .unwrap();

    assert!(output.starts_with(UTF8_BOM));
    let text = String::from_utf8(output[UTF8_BOM.len()..].to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "period_end,account,remark_item,amount");
    assert_eq!(lines[1], "2023-04-30,通信費,切手,300");
    assert_eq!(lines[5], "2023-04-30,雑収入,返金,-500");
    assert_eq!(lines.len(), 6);
}

#[test]
fn test_json_output() {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let input = Cursor::new(fixtures::generate_single_month("2023-04").unwrap());
    let mut output = Vec::new();

    extractor
        .extract_to_writer(input, &mut output, OutputFormat::Json)
        .unwrap();

    let records: Vec<FactRecord> = serde_json::from_slice(&output).unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records[2].remark_item, "コピー用紙");
    assert_eq!(records[2].period_end, date(2023, 4, 30));
}

#[test]
fn test_rerun_is_byte_identical() {
    let extractor = ExtractorBuilder::new()
        .with_fiscal_start_year(2023)
        .build()
        .unwrap();
    let data = fixtures::generate_fiscal_year().unwrap();

    let mut first = Vec::new();
    extractor
        .extract_to_writer(Cursor::new(data.clone()), &mut first, OutputFormat::Csv)
        .unwrap();
    let mut second = Vec::new();
    extractor
        .extract_to_writer(Cursor::new(data), &mut second, OutputFormat::Csv)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_written_csv_reads_back() {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let report = extractor
        .extract(Cursor::new(fixtures::generate_single_month("2023-04").unwrap()))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("facts_long.csv");
    let mut file = File::create(&path).unwrap();
    write_facts(&report.records, &mut file, OutputFormat::Csv).unwrap();
    drop(file);

    let loaded = read_facts_csv(File::open(&path).unwrap()).unwrap();
    assert_eq!(loaded, report.records);
}

#[test]
fn test_merge_and_sign_pipeline() {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let april = extractor
        .extract(Cursor::new(fixtures::generate_single_month("2023-04").unwrap()))
        .unwrap()
        .records;
    let may = extractor
        .extract(Cursor::new(fixtures::generate_single_month("2023-05").unwrap()))
        .unwrap()
        .records;

    // 5月を先に渡しても期末日順に並ぶ。4月の重複は落ちる
    let merged = merge_facts(vec![may, april.clone(), april], DedupKey::All);
    assert_eq!(merged.len(), 10);
    assert_eq!(merged[0].period_end, date(2023, 4, 30));
    assert_eq!(merged[9].period_end, date(2023, 5, 31));

    let signs = SignNormalizer::new(["雑収入"]);
    let signed = signs.apply(&merged);
    assert_eq!(signed[4].account, "雑収入");
    assert_eq!(signed[4].amount, 500.0);
    assert_eq!(signed[0].amount, -300.0);

    let summary = signs.summarize(&merged);
    assert_eq!(summary.income, 1000.0);
    assert_eq!(summary.expense, -9126.0);
    assert_eq!(summary.net, -8126.0);
    assert_eq!(
        summary.monthly,
        vec![
            ("2023-04".to_string(), -4063.0),
            ("2023-05".to_string(), -4063.0)
        ]
    );
}
