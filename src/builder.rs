//! Builder Module
//!
//! Fluent Builder APIを提供し、`Extractor`インスタンスを段階的に構築する。

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::amount::{AmountParser, DEFAULT_CURRENCY_UNIT_MARKERS, DEFAULT_NEGATIVE_MARKERS};
use crate::api::{OutputFormat, SheetSelector};
use crate::columns::{autodetect_columns, resolve_roles};
use crate::error::XlsxToFactsError;
use crate::grid::RawGrid;
use crate::header::{build_table, locate_header};
use crate::inline::{InlinePairExtractor, RegexPairExtractor};
use crate::output::{sort_facts, write_facts};
use crate::parser::WorkbookParser;
use crate::period::{fiscal_year_from_filename, PeriodResolver};
use crate::records::build_long_records;
use crate::types::{ExtractionReport, FactRecord, SkippedSheet};

/// 見出し行を走査する最大行数のデフォルト
pub const DEFAULT_MAX_HEADER_SCAN_ROWS: usize = 150;

const DEFAULT_ACCOUNT_CANDIDATES: [&str; 6] =
    ["勘定科目", "勘　定　科　目", "科目", "項目名", "account", "Account"];

const DEFAULT_REMARK_CANDIDATES: [&str; 6] =
    ["備考", "備　　　　　　　　考", "摘要", "内訳", "remark", "Remarks"];

const DEFAULT_HEADER_VOCABULARY: [&str; 6] =
    ["勘定科目", "備考", "摘要", "内訳", "勘　定　科　目", "備　　　　　　　　考"];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 抽出処理の設定
///
/// すべての項目にデフォルト値があり、JSONの設定ファイルでは必要な項目だけを記述できます。
///
/// ```
/// use xlsxfacts::ExtractionConfig;
///
/// let json = r#"{ "fiscal_start_year": 2023, "max_header_scan_rows": 40 }"#;
/// let config = ExtractionConfig::from_json_reader(json.as_bytes()).unwrap();
/// assert_eq!(config.fiscal_start_year, Some(2023));
/// assert_eq!(config.max_header_scan_rows, 40);
/// assert!(config.skip_failed_sheets);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// 見出し行の検出に使う語彙
    pub header_vocabulary: Vec<String>,

    /// 勘定科目列の候補名
    pub account_candidates: Vec<String>,

    /// 備考列の候補名
    pub remark_candidates: Vec<String>,

    /// 見出し行を走査する最大行数
    pub max_header_scan_rows: usize,

    /// 金額から取り除く通貨記号・単位
    pub currency_unit_markers: Vec<String>,

    /// 負数を表す先頭記号
    pub negative_markers: Vec<String>,

    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// 会計年度の開始年（月のみのシート名に使用）
    pub fiscal_start_year: Option<i32>,

    /// 会計年度が不明な場合に月のみのシート名に使う年
    pub default_year: Option<i32>,

    /// 見出し・列が見つからないシートをスキップするか（`false`ならエラーで中断）
    pub skip_failed_sheets: bool,

    /// 出力前に`(period_end, account, remark_item)`の順に並べ替えるか
    pub sort_records: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_vocabulary: strings(&DEFAULT_HEADER_VOCABULARY),
            account_candidates: strings(&DEFAULT_ACCOUNT_CANDIDATES),
            remark_candidates: strings(&DEFAULT_REMARK_CANDIDATES),
            max_header_scan_rows: DEFAULT_MAX_HEADER_SCAN_ROWS,
            currency_unit_markers: strings(&DEFAULT_CURRENCY_UNIT_MARKERS),
            negative_markers: strings(&DEFAULT_NEGATIVE_MARKERS),
            sheet_selector: SheetSelector::All,
            fiscal_start_year: None,
            default_year: None,
            skip_failed_sheets: true,
            sort_records: false,
        }
    }
}

impl ExtractionConfig {
    /// JSONから設定を読み込む（省略した項目はデフォルト値）
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, XlsxToFactsError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// 設定を検証する
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 有効な設定
    /// * `Err(XlsxToFactsError::Config)` - 語彙が2語未満、走査行数が0、候補名が空の場合
    pub fn validate(&self) -> Result<(), XlsxToFactsError> {
        let non_blank = |items: &[String]| items.iter().filter(|s| !s.trim().is_empty()).count();

        if non_blank(&self.header_vocabulary) < 2 {
            return Err(XlsxToFactsError::Config(format!(
                "Header vocabulary must contain at least two terms (got {})",
                non_blank(&self.header_vocabulary)
            )));
        }
        if self.max_header_scan_rows == 0 {
            return Err(XlsxToFactsError::Config(
                "max_header_scan_rows must be greater than 0".to_string(),
            ));
        }
        if non_blank(&self.account_candidates) == 0 {
            return Err(XlsxToFactsError::Config(
                "Account column candidates must not be empty".to_string(),
            ));
        }
        if non_blank(&self.remark_candidates) == 0 {
            return Err(XlsxToFactsError::Config(
                "Remark column candidates must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Extractor`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxfacts::{ExtractorBuilder, SheetSelector};
///
/// # fn main() -> Result<(), xlsxfacts::XlsxToFactsError> {
/// let extractor = ExtractorBuilder::new()
///     .with_sheet_selector(SheetSelector::Names(vec!["4月".to_string(), "5月".to_string()]))
///     .with_fiscal_start_year(2023)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ExtractorBuilder {
    /// 内部設定（構築中）
    config: ExtractionConfig,

    /// インライン抽出器（未指定なら正規表現による既定の抽出器）
    inline: Option<Arc<dyn InlinePairExtractor>>,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExtractorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorBuilder")
            .field("config", &self.config)
            .field("custom_inline", &self.inline.is_some())
            .finish()
    }
}

impl ExtractorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: すべてのシート
    /// - 見出し走査: 先頭150行
    /// - 通貨記号: `円` `¥` `￥`、負数記号: `△` `▲`
    /// - 会計年度: 指定なし
    /// - 見出し・列が見つからないシート: スキップ
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
            inline: None,
        }
    }

    /// 設定全体を置き換える
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// 抽出対象のシートを選択する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// 見出し行の検出に使う語彙を指定する
    pub fn with_header_vocabulary<I, S>(mut self, vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.header_vocabulary = vocabulary.into_iter().map(Into::into).collect();
        self
    }

    /// 勘定科目列の候補名を指定する
    pub fn with_account_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.account_candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// 備考列の候補名を指定する
    pub fn with_remark_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.remark_candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// 見出し行を走査する最大行数を指定する
    pub fn with_max_header_scan_rows(mut self, rows: usize) -> Self {
        self.config.max_header_scan_rows = rows;
        self
    }

    /// 金額から取り除く通貨記号・単位を指定する
    pub fn with_currency_unit_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.currency_unit_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// 負数を表す先頭記号を指定する
    pub fn with_negative_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.negative_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// 会計年度の開始年を指定する
    ///
    /// 「4月」「3月」のような月のみのシート名は、4月〜12月がこの年、1月〜3月が翌年になります。
    pub fn with_fiscal_start_year(mut self, year: i32) -> Self {
        self.config.fiscal_start_year = Some(year);
        self
    }

    /// 会計年度が不明な場合に月のみのシート名に使う年を指定する
    pub fn with_default_year(mut self, year: i32) -> Self {
        self.config.default_year = Some(year);
        self
    }

    /// 見出し・列が見つからないシートをスキップするかどうか
    ///
    /// `false`の場合、最初に失敗したシートのエラーで抽出全体が中断します。
    /// 期間を特定できないシートはこの設定にかかわらずスキップされます。
    pub fn skip_failed_sheets(mut self, skip: bool) -> Self {
        self.config.skip_failed_sheets = skip;
        self
    }

    /// 抽出結果を`(period_end, account, remark_item)`の順に並べ替えるかどうか
    ///
    /// `false`（デフォルト）の場合はシート順・行順のままです。
    pub fn sort_records(mut self, sort: bool) -> Self {
        self.config.sort_records = sort;
        self
    }

    /// インライン抽出器を差し替える
    pub fn with_inline_extractor(mut self, extractor: Arc<dyn InlinePairExtractor>) -> Self {
        self.inline = Some(extractor);
        self
    }

    /// 設定を検証し、`Extractor`インスタンスを生成する
    ///
    /// # エラー
    ///
    /// 設定が無効な場合、`XlsxToFactsError::Config`を返します。
    pub fn build(self) -> Result<Extractor, XlsxToFactsError> {
        self.config.validate()?;

        let parser = AmountParser::new(
            self.config.currency_unit_markers.clone(),
            self.config.negative_markers.clone(),
        );
        let inline = self
            .inline
            .unwrap_or_else(|| Arc::new(RegexPairExtractor::new(parser.clone())));

        Ok(Extractor {
            config: self.config,
            parser,
            inline,
        })
    }
}

/// 抽出処理のファサード
///
/// 月別収支のワークブックからロング形式のレコードを抽出するメインエントリーポイントです。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use xlsxfacts::{ExtractorBuilder, OutputFormat};
///
/// # fn main() -> Result<(), xlsxfacts::XlsxToFactsError> {
/// let extractor = ExtractorBuilder::new().with_fiscal_start_year(2023).build()?;
/// let input = File::open("令和5年度月別収支状況.xlsx")?;
/// let output = File::create("facts_long.csv")?;
/// let report = extractor.extract_to_writer(input, output, OutputFormat::Csv)?;
/// for skipped in &report.skipped {
///     eprintln!("skipped {}: {}", skipped.sheet, skipped.reason);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Extractor {
    /// 抽出設定
    config: ExtractionConfig,

    /// 金額パーサー
    parser: AmountParser,

    /// インライン抽出器
    inline: Arc<dyn InlinePairExtractor>,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("config", &self.config)
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    /// 抽出設定
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// 設定にもとづく期間リゾルバー
    pub fn period_resolver(&self) -> PeriodResolver {
        PeriodResolver::new(self.config.fiscal_start_year, self.config.default_year)
    }

    /// 1シート分のグリッドからレコードを抽出する
    ///
    /// 期末日はシート名から求めます。
    ///
    /// # 処理フロー
    ///
    /// 1. シート名から期末日を特定
    /// 2. 見出し行の検出とテーブルの構築
    /// 3. 勘定科目列・備考列の検出
    /// 4. 備考列の役割（ラベル / 金額）の判定
    /// 5. レコードの生成
    pub fn extract_sheet(&self, grid: &RawGrid) -> Result<Vec<FactRecord>, XlsxToFactsError> {
        self.extract_sheet_with(grid, &self.period_resolver())
    }

    fn extract_sheet_with(
        &self,
        grid: &RawGrid,
        resolver: &PeriodResolver,
    ) -> Result<Vec<FactRecord>, XlsxToFactsError> {
        let sheet = grid.name();
        let period_end = resolver.resolve(sheet)?;

        let header_row = locate_header(
            grid,
            &self.config.header_vocabulary,
            self.config.max_header_scan_rows,
        )?;
        let table = build_table(grid, header_row);

        let duplicated = table.duplicated_columns();
        if !duplicated.is_empty() {
            debug!(sheet, ?duplicated, "duplicated header names");
        }

        let (account, remark) = autodetect_columns(
            sheet,
            &table,
            &self.config.account_candidates,
            &self.config.remark_candidates,
        )?;
        let account_col = table.column_indices(&account).first().copied().ok_or_else(|| {
            XlsxToFactsError::ColumnNotFound {
                sheet: sheet.to_string(),
                missing: vec![account.clone()],
                columns: table.columns().to_vec(),
            }
        })?;
        let role = resolve_roles(sheet, &table, &remark, &self.parser)?;
        debug!(sheet, label = role.label, amount = ?role.amount, "remark roles resolved");

        let records = build_long_records(
            &table,
            account_col,
            role,
            &self.parser,
            &*self.inline,
            period_end,
        );
        info!(sheet, %period_end, records = records.len(), "sheet extracted");
        if records.is_empty() {
            warn!(sheet, "no (item, amount) pairs found; check the item and amount columns");
        }
        Ok(records)
    }

    /// 複数シートのグリッドからレコードを抽出する
    ///
    /// シートは並列に処理され、結果はシート順に連結されます。
    pub fn extract_grids(&self, grids: &[RawGrid]) -> Result<ExtractionReport, XlsxToFactsError> {
        self.extract_grids_with(grids, &self.period_resolver())
    }

    fn extract_grids_with(
        &self,
        grids: &[RawGrid],
        resolver: &PeriodResolver,
    ) -> Result<ExtractionReport, XlsxToFactsError> {
        // par_iter + collect は入力順を保つ
        let results: Vec<Result<Vec<FactRecord>, XlsxToFactsError>> = grids
            .par_iter()
            .map(|grid| self.extract_sheet_with(grid, resolver))
            .collect();

        let mut report = ExtractionReport::default();
        for (grid, result) in grids.iter().zip(results) {
            match result {
                Ok(records) => report.records.extend(records),
                Err(err @ XlsxToFactsError::PeriodUnresolved { .. }) => {
                    warn!(sheet = grid.name(), "skipping sheet: {}", err);
                    report.skipped.push(SkippedSheet {
                        sheet: grid.name().to_string(),
                        reason: err.to_string(),
                    });
                }
                Err(err) if err.is_sheet_local() && self.config.skip_failed_sheets => {
                    warn!(sheet = grid.name(), "skipping sheet: {}", err);
                    report.skipped.push(SkippedSheet {
                        sheet: grid.name().to_string(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if self.config.sort_records {
            sort_facts(&mut report.records);
        }

        if report.records.is_empty() {
            warn!(
                sheets = grids.len(),
                skipped = report.skipped.len(),
                "no records extracted"
            );
        }
        Ok(report)
    }

    /// ワークブックからレコードを抽出する
    ///
    /// # 引数
    ///
    /// * `input` - ワークブックを読み込むためのリーダー
    ///
    /// # 戻り値
    ///
    /// * `Ok(ExtractionReport)` - 抽出結果とスキップしたシートの一覧
    /// * `Err(XlsxToFactsError)` - ワークブックを読めない場合、シート選択が無効な場合、
    ///   またはスキップを許可していないシート単位のエラー
    pub fn extract<R: Read>(&self, input: R) -> Result<ExtractionReport, XlsxToFactsError> {
        self.extract_with(input, &self.period_resolver())
    }

    fn extract_with<R: Read>(
        &self,
        input: R,
        resolver: &PeriodResolver,
    ) -> Result<ExtractionReport, XlsxToFactsError> {
        let mut workbook = WorkbookParser::open(input)?;
        let sheet_names = workbook.select_sheets(&self.config.sheet_selector)?;
        debug!(sheets = ?sheet_names, "sheets selected");

        // calamineのワークブックは可変借用が必要なため、読み込みは逐次
        let grids = sheet_names
            .iter()
            .map(|name| workbook.read_grid(name))
            .collect::<Result<Vec<_>, _>>()?;

        self.extract_grids_with(&grids, resolver)
    }

    /// ファイルパスを指定してワークブックからレコードを抽出する
    ///
    /// 会計年度が設定されていない場合は、ファイル名（例: `令和5年度月別収支状況.xlsx`）から推定します。
    pub fn extract_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<ExtractionReport, XlsxToFactsError> {
        let path = path.as_ref();
        let fiscal_start_year = self.config.fiscal_start_year.or_else(|| {
            let inferred = fiscal_year_from_filename(&path.to_string_lossy());
            if let Some(year) = inferred {
                debug!(path = %path.display(), year, "fiscal year inferred from file name");
            }
            inferred
        });
        let resolver = PeriodResolver::new(fiscal_start_year, self.config.default_year);
        self.extract_with(File::open(path)?, &resolver)
    }

    /// ワークブックからレコードを抽出し、指定されたフォーマットで書き出す
    ///
    /// 書き出しはレコードが0件でも行います（CSVなら見出し行のみ）。
    pub fn extract_to_writer<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
        format: OutputFormat,
    ) -> Result<ExtractionReport, XlsxToFactsError> {
        let report = self.extract(input)?;
        let mut writer = BufWriter::new(output);
        write_facts(&report.records, &mut writer, format)?;
        writer.flush()?;
        Ok(report)
    }
}
