//! Period Module
//!
//! シート名から報告月を特定し、その月の末日を返すモジュール。
//! 西暦（`2022-04`、`2023年4月`）、令和（`R5-04`、`令和5年4月`）、
//! 月のみ（`4月`、`4`）の表記に対応します。月のみの場合は会計年度（4月始まり）で年を補います。

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::XlsxToFactsError;
use crate::normalize::{squash_spaces, to_halfwidth};

/// 令和元年の前年（令和N年 = 2018 + N）
pub const REIWA_OFFSET: i32 = 2018;

/// 会計年度の開始月
pub const FISCAL_START_MONTH: u32 = 4;

struct Patterns {
    western_dash: Regex,
    western_kanji: Regex,
    reiwa_letter: Regex,
    era_kanji: Regex,
    month_only: Regex,
    bare_month: Regex,
    reiwa_fiscal_file: Regex,
    year_in_file: Regex,
    iso_like_date: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("period pattern is valid");
        Patterns {
            western_dash: re(r"^(20\d{2})[-/.](1[0-2]|0?[1-9])$"),
            western_kanji: re(r"(20\d{2})年(1[0-2]|0?[1-9])月"),
            reiwa_letter: re(r"[Rr](\d+)[./\-](1[0-2]|0?[1-9])"),
            era_kanji: re(r"(?:令和)?(\d{1,2})年(1[0-2]|0?[1-9])月"),
            month_only: re(r"(1[0-2]|0?[1-9])月"),
            bare_month: re(r"^(1[0-2]|0?[1-9])$"),
            reiwa_fiscal_file: re(r"令和\s*(\d+)\s*年度"),
            year_in_file: re(r"(20\d{2})"),
            iso_like_date: re(r"^\s*(\d{4})[-/](\d{1,2})[-/](\d{1,2})\s*$"),
        }
    })
}

/// シート名から期末日を求めるリゾルバー
///
/// `fiscal_start_year`は「令和5年度」のような会計年度の開始年（西暦）、
/// `default_year`は月のみのシート名で会計年度が不明な場合に使う年です。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodResolver {
    fiscal_start_year: Option<i32>,
    default_year: Option<i32>,
}

impl PeriodResolver {
    /// 新しいリゾルバーを生成
    pub fn new(fiscal_start_year: Option<i32>, default_year: Option<i32>) -> Self {
        Self {
            fiscal_start_year,
            default_year,
        }
    }

    /// ワークブックのファイル名から会計年度を推定してリゾルバーを生成
    pub fn from_workbook_name(file_name: &str) -> Self {
        Self::new(fiscal_year_from_filename(file_name), None)
    }

    /// 会計年度の開始年
    pub fn fiscal_start_year(&self) -> Option<i32> {
        self.fiscal_start_year
    }

    /// シート名から`(年, 月)`を特定する
    pub fn resolve_year_month(&self, sheet_name: &str) -> Option<(i32, u32)> {
        let p = patterns();
        let s = squash_spaces(&to_halfwidth(sheet_name));

        // 1. YYYY-MM / YYYY/M / YYYY.MM
        if let Some(found) = p.western_dash.captures(&s).and_then(year_month) {
            return Some(found);
        }
        // 2. YYYY年M月
        if let Some(found) = p.western_kanji.captures(&s).and_then(year_month) {
            return Some(found);
        }
        // 3. R5-04 / R05.4
        if let Some((reiwa, month)) = p.reiwa_letter.captures(&s).and_then(year_month) {
            return Some((REIWA_OFFSET + reiwa, month));
        }
        // 4. 令和5年4月 / 5年4月
        if let Some((reiwa, month)) = p.era_kanji.captures(&s).and_then(year_month) {
            return Some((REIWA_OFFSET + reiwa, month));
        }
        // 5. 4月 / 4（会計年度で年を補う）
        let month = p
            .month_only
            .captures(&s)
            .or_else(|| p.bare_month.captures(&s))
            .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())?;
        self.year_for_month(month).map(|year| (year, month))
    }

    /// シート名から期末日（その月の末日）を求める
    ///
    /// どの表記にも一致しない場合は`PeriodUnresolved`を返します。
    pub fn resolve(&self, sheet_name: &str) -> Result<NaiveDate, XlsxToFactsError> {
        self.resolve_year_month(sheet_name)
            .and_then(|(year, month)| last_day_of_month(year, month))
            .ok_or_else(|| XlsxToFactsError::PeriodUnresolved {
                sheet: sheet_name.to_string(),
            })
    }

    /// 月のみのシート名に対する年
    ///
    /// 会計年度が分かれば4月〜12月は開始年、1月〜3月は翌年。
    fn year_for_month(&self, month: u32) -> Option<i32> {
        match self.fiscal_start_year {
            Some(start) if month >= FISCAL_START_MONTH => Some(start),
            Some(start) => Some(start + 1),
            None => self.default_year,
        }
    }
}

fn year_month(caps: regex::Captures<'_>) -> Option<(i32, u32)> {
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some((year, month))
}

/// ファイル名から会計年度の開始年を推定する
///
/// `令和5年度` → 2023。なければファイル名中の`20xx`。
pub fn fiscal_year_from_filename(file_name: &str) -> Option<i32> {
    let p = patterns();
    let base = std::path::Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let base = to_halfwidth(&base);

    if let Some(n) = p
        .reiwa_fiscal_file
        .captures(&base)
        .and_then(|caps| caps.get(1)?.as_str().parse::<i32>().ok())
    {
        return Some(REIWA_OFFSET + n);
    }
    p.year_in_file
        .captures(&base)
        .and_then(|caps| caps.get(1)?.as_str().parse::<i32>().ok())
}

/// 月の末日
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt()
}

/// `YYYY-MM-DD` / `YYYY/MM/DD`形式の日付を読み取り、存在しない日はその月の範囲に丸める
///
/// `2022-02-30` → `2022-02-28`、`2022-04-00` → `2022-04-01`。月が範囲外なら`None`。
pub fn repair_date(text: &str) -> Option<NaiveDate> {
    let caps = patterns().iso_like_date.captures(text)?;
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = caps.get(2)?.as_str().parse::<u32>().ok()?;
    let day = caps.get(3)?.as_str().parse::<u32>().ok()?;
    let last = last_day_of_month(year, month)?;
    let day = day.clamp(1, last.day());
    NaiveDate::from_ymd_opt(year, month, day)
}
