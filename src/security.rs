//! Security Module
//!
//! 入力ファイルに対する制限を定義するモジュール。
//! ワークブックは全体をメモリに読み込んでから解析するため、読み込むサイズに上限を設けます。

use std::io::Read;

use crate::error::XlsxToFactsError;

/// セキュリティ設定
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 512MB (536_870_912 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_file_size: 536_870_912, // 512MB
        }
    }
}

impl SecurityConfig {
    /// 上限を超えない範囲で入力をすべて読み込む
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<u8>)` - 読み込んだバイト列
    /// * `Err(XlsxToFactsError::SecurityViolation)` - 上限を超えた場合
    pub fn read_limited<R: Read>(&self, reader: R) -> Result<Vec<u8>, XlsxToFactsError> {
        let mut buffer = Vec::new();
        // 上限+1バイトまで読めば超過を判定できる
        let bytes_read = reader
            .take(self.max_input_file_size.saturating_add(1))
            .read_to_end(&mut buffer)?;

        if bytes_read as u64 > self.max_input_file_size {
            return Err(XlsxToFactsError::SecurityViolation(format!(
                "Input file size exceeds maximum: more than {} bytes",
                self.max_input_file_size
            )));
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_within_limit() {
        let config = SecurityConfig {
            max_input_file_size: 4,
        };
        assert_eq!(config.read_limited(&b"abcd"[..]).unwrap(), b"abcd");
    }

    #[test]
    fn test_read_over_limit() {
        let config = SecurityConfig {
            max_input_file_size: 4,
        };
        assert!(matches!(
            config.read_limited(&b"abcde"[..]),
            Err(XlsxToFactsError::SecurityViolation(_))
        ));
    }
}
