//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// どの段階でもJSONオブジェクトを取り出せなかった
    #[error("{message}: {excerpt}")]
    Parse { message: String, excerpt: String },

    /// フィールドの型変換に失敗
    #[error("フィールド `{field}` が不正です: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parse() {
        let error = Error::Parse {
            message: "Unable to parse API response as JSON".to_string(),
            excerpt: "hello...".to_string(),
        };
        let display = format!("{}", error);
        assert_eq!(display, "Unable to parse API response as JSON: hello...");
    }

    #[test]
    fn test_error_display_invalid_field() {
        let error = Error::InvalidField {
            field: "confidence",
            reason: "数値ではありません: \"eighty\"".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("confidence"));
        assert!(display.contains("eighty"));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::InvalidField {
            field: "confidence",
            reason: "テスト".to_string(),
        };
        let debug = format!("{:?}", error);
        assert!(debug.contains("InvalidField"));
        assert!(debug.contains("テスト"));
    }
}
