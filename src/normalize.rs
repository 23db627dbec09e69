//! Normalize Module
//!
//! 全角・半角のゆらぎや空白の混入を吸収するテキスト正規化。
//! 見出しの比較、金額の解析、勘定科目の整形で共通に使用します。

/// 全角数字とカンマ・ピリオドを半角に変換する
///
/// ```rust
/// assert_eq!(xlsxfacts::normalize::to_halfwidth("１，２００．５"), "1,200.5");
/// ```
pub fn to_halfwidth(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '，' => ',',
            '．' => '.',
            _ => c,
        })
        .collect()
}

/// 全角英数記号（U+FF01〜U+FF5E）を半角に、全角スペースを半角スペースに畳み込む
///
/// 対象はこの2種類だけで、半角カナやその他の互換文字は変換しません。
pub fn fold_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}

/// 幅を畳み込んだうえで、すべての空白（全角スペース、U+2000〜U+200Bを含む）を除去する
///
/// `"勘　定　科　目"`と`"勘定科目"`は同じ文字列になります。
pub fn squash_spaces(s: &str) -> String {
    fold_width(s)
        .chars()
        .filter(|c| !c.is_whitespace() && !('\u{2000}'..='\u{200B}').contains(c))
        .collect()
}

/// セルのテキストを整形する
///
/// 全角スペースを除去し、連続する空白を1つにまとめ、制御文字を落として前後を除去します。
/// 結果が空なら`None`。
pub fn clean_text(s: &str) -> Option<String> {
    let without_ideographic = s.replace('\u{3000}', "");
    let collapsed = without_ideographic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let printable: String = collapsed.chars().filter(|c| !c.is_control()).collect();
    let trimmed = printable.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
