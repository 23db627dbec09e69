//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// シート選択方式
///
/// 抽出対象のシートを選択する方法を指定します。
/// 設定ファイルでは`"all"`、`{"names": ["4月", "5月"]}`のように記述します。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシートを抽出（デフォルト）
    #[default]
    All,

    /// インデックス指定（0始まり）
    ///
    /// 例: `SheetSelector::Index(0)` は最初のシートを選択
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("2022-04".to_string())`
    Name(String),

    /// 複数のインデックス指定
    Indices(Vec<usize>),

    /// 複数のシート名指定
    ///
    /// 例: `SheetSelector::Names(vec!["4月".to_string(), "5月".to_string()])`
    Names(Vec<String>),
}

/// 出力フォーマット
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutputFormat {
    /// CSV形式（デフォルト）
    ///
    /// UTF-8のBOM付きで、Excelでそのまま開けます。
    ///
    /// # 出力例
    ///
    /// ```csv
    /// period_end,account,remark_item,amount
    /// 2023-04-30,通信費,切手,300
    /// ```
    #[default]
    Csv,

    /// JSON形式
    ///
    /// レコードの配列として出力します。
    ///
    /// # 出力例
    ///
    /// ```json
    /// [
    ///   {
    ///     "period_end": "2023-04-30",
    ///     "account": "通信費",
    ///     "remark_item": "切手",
    ///     "amount": 300.0
    ///   }
    /// ]
    /// ```
    Json,
}

/// マージ時の重複判定キー
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum DedupKey {
    /// `(period_end, account, remark_item)`が一致すれば重複（デフォルト）
    #[default]
    Item,

    /// 金額も含めた4項目すべてが一致すれば重複
    All,
}
