//! Inline Pair Module
//!
//! 1つの備考セルに「ラベル + 金額」が連結されている場合の抽出
//! （例: `"消耗品 1,200 郵送料 ¥3,000"`）。
//!
//! 文法ではなくベストエフォートのヒューリスティックです。曖昧な入力では
//! 0件、一部のみ、または意味的に誤ったペアが返ることがあります。

use std::sync::OnceLock;

use regex::Regex;

use crate::amount::AmountParser;

/// ラベル・金額ペアの抽出器
///
/// 抽出規則を差し替えられるよう、レコード抽出はこのトレイト越しに呼び出します。
pub trait InlinePairExtractor: Send + Sync {
    /// テキストから`(ラベル, 金額)`のペアを左から順に抽出する
    fn extract(&self, text: &str) -> Vec<(String, f64)>;
}

/// ラベル・金額ペアの正規表現
///
/// ラベル: 数字・符号・括弧・コロン以外の最短の連なり。
/// その後に任意の区切り、任意の符号（`△ ▲ ( （`）、数字列、任意の`円`または閉じ括弧。
const PAIR_PATTERN: &str = r"(?x)
    (?P<label>[^0-9０-９△▲\-()（）:：]+?)
    [\s:：]*
    (?P<sign>△|▲|\(|（)?
    \s*
    (?P<num>[0-9０-９][0-9０-９,，.．]*)
    \s*
    (?:円|\)|）)?
";

/// ラベルの前後から落とす区切り記号
const LABEL_SEPARATORS: &[char] = &['、', '，', ',', '／', '/', '・'];

fn pair_regex() -> &'static Regex {
    static PAIR_RE: OnceLock<Regex> = OnceLock::new();
    PAIR_RE.get_or_init(|| Regex::new(PAIR_PATTERN).expect("inline pair pattern is valid"))
}

/// 正規表現による既定の抽出器
#[derive(Debug, Clone)]
pub struct RegexPairExtractor {
    parser: AmountParser,
}

impl RegexPairExtractor {
    /// 金額パーサーを指定して抽出器を生成
    pub fn new(parser: AmountParser) -> Self {
        Self { parser }
    }

    /// ラベルの前後の区切り記号・空白・通貨記号を除去
    fn trim_label<'a>(&self, label: &'a str) -> &'a str {
        let is_trimmable = |c: char| {
            c.is_whitespace()
                || LABEL_SEPARATORS.contains(&c)
                || self
                    .parser
                    .currency_unit_markers()
                    .iter()
                    .any(|m| m.chars().count() == 1 && m.starts_with(c))
        };
        label.trim_matches(is_trimmable)
    }
}

impl Default for RegexPairExtractor {
    fn default() -> Self {
        Self::new(AmountParser::default())
    }
}

impl InlinePairExtractor for RegexPairExtractor {
    fn extract(&self, text: &str) -> Vec<(String, f64)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut pairs = Vec::new();
        for caps in pair_regex().captures_iter(text) {
            let label = caps
                .name("label")
                .map(|m| self.trim_label(m.as_str()))
                .unwrap_or("");

            let sign = caps.name("sign").map(|m| m.as_str()).unwrap_or("");
            let num = caps.name("num").map(|m| m.as_str()).unwrap_or("");
            // 開き括弧の場合は閉じ括弧を補って括弧囲みの負数として解析する
            let raw = if sign == "(" {
                format!("({})", num)
            } else if sign == "（" {
                format!("（{}）", num)
            } else {
                format!("{}{}", sign, num)
            };

            if let Some(value) = self.parser.parse(&raw) {
                if !label.is_empty() {
                    pairs.push((label.to_string(), value));
                }
            }
        }
        pairs
    }
}
