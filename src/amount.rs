//! Amount Module
//!
//! 金額トークンの解析。全角数字、通貨単位、桁区切り、
//! 台帳で使われる負数記号（`△`、`▲`、括弧）を扱います。

use crate::normalize::to_halfwidth;
use crate::types::CellValue;

/// 既定の通貨単位記号
pub const DEFAULT_CURRENCY_UNIT_MARKERS: &[&str] = &["円", "¥", "￥"];

/// 既定の負数記号
pub const DEFAULT_NEGATIVE_MARKERS: &[&str] = &["△", "▲"];

/// 金額トークンパーサー
///
/// 1セル分のテキストを符号付きの数値に変換します。解析できない場合は`None`
/// （値なし）を返し、`"0"`は`Some(0.0)`として値なしと区別します。
///
/// # 解析手順
///
/// 1. 全角数字・カンマ・ピリオドを半角化
/// 2. 通貨単位記号を除去
/// 3. 桁区切りのカンマを除去
/// 4. 先頭の`-`または負数記号、あるいは全体の括弧囲みを負号として扱う
/// 5. 残りが10進数として読めなければ`None`
///
/// ```rust
/// use xlsxfacts::AmountParser;
///
/// let parser = AmountParser::default();
/// assert_eq!(parser.parse("(1,200)"), Some(-1200.0));
/// assert_eq!(parser.parse("△1200"), Some(-1200.0));
/// assert_eq!(parser.parse("１，２００円"), Some(1200.0));
/// assert_eq!(parser.parse(""), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountParser {
    currency_unit_markers: Vec<String>,
    negative_markers: Vec<String>,
}

impl Default for AmountParser {
    fn default() -> Self {
        Self::new(
            DEFAULT_CURRENCY_UNIT_MARKERS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_NEGATIVE_MARKERS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl AmountParser {
    /// 通貨単位記号と負数記号を指定してパーサーを生成
    pub fn new(currency_unit_markers: Vec<String>, negative_markers: Vec<String>) -> Self {
        Self {
            currency_unit_markers: currency_unit_markers
                .into_iter()
                .filter(|m| !m.is_empty())
                .collect(),
            negative_markers: negative_markers
                .into_iter()
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// 通貨単位記号の一覧
    pub fn currency_unit_markers(&self) -> &[String] {
        &self.currency_unit_markers
    }

    /// 負数記号の一覧
    pub fn negative_markers(&self) -> &[String] {
        &self.negative_markers
    }

    /// 金額テキストを解析する
    pub fn parse(&self, text: &str) -> Option<f64> {
        let mut s = to_halfwidth(text);
        for marker in &self.currency_unit_markers {
            s = s.replace(marker.as_str(), "");
        }
        let s = s.replace(',', "");
        let mut s = s.trim();

        let mut negative = false;
        if let Some(rest) = s.strip_prefix('-') {
            negative = true;
            s = rest.trim();
        } else {
            for marker in &self.negative_markers {
                if let Some(rest) = s.strip_prefix(marker.as_str()) {
                    negative = true;
                    s = rest.trim();
                    break;
                }
            }
        }

        if let Some(inner) = strip_parens(s) {
            negative = true;
            s = inner.trim();
        }

        let value = parse_plain_decimal(s)?;
        Some(if negative { -value } else { value })
    }

    /// セル値を解析する
    ///
    /// 数値セルは有限値ならそのまま返し、文字列セルは[`AmountParser::parse`]で解析します。
    pub fn parse_cell(&self, cell: &CellValue) -> Option<f64> {
        match cell {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::String(s) => self.parse(s),
            _ => None,
        }
    }

    /// 数値として読めるセルかどうか
    pub fn is_numeric_like(&self, cell: &CellValue) -> bool {
        self.parse_cell(cell).is_some()
    }
}

/// 全体が括弧（半角・全角）で囲まれていれば中身を返す
fn strip_parens(s: &str) -> Option<&str> {
    s.strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .or_else(|| s.strip_prefix('（').and_then(|rest| rest.strip_suffix('）')))
}

/// `digits[.digits]`または`.digits`形式の10進数だけを受け付ける
///
/// `f64::from_str`は`inf`や`1e5`も受け付けるため、先に文字種を検査します。
fn parse_plain_decimal(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in s.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
