//! 출력 형식 및 표 포맷 유틸리티.

use anyhow::{Context, Result};
use carteira_core::Fraction;
use rust_decimal::Decimal;
use serde::Serialize;

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// JSON 형식 출력.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize to JSON")
}

/// 숫자 셀 (소수 2자리, 없으면 `-`).
pub fn number(value: Option<Decimal>) -> String {
    value
        .map(|v| v.round_dp(2).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// 비율 셀 (`12.34%`, 없으면 `-`).
pub fn ratio(value: Option<Fraction>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// 문자열 자르기 (UTF-8 안전).
pub fn truncate(s: &str, max_len: usize) -> String {
    // 문자 수로 계산 (바이트가 아님)
    let char_count = s.chars().count();

    if char_count <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("table").unwrap(), OutputFormat::Table);
        assert!(OutputFormat::parse("csv").is_err());
    }

    #[test]
    fn test_cells() {
        assert_eq!(number(Some(dec!(8.456))), "8.46");
        assert_eq!(number(None), "-");
        assert_eq!(ratio(Some(Fraction::from_percent(dec!(12.5)))), "12.50%");
        assert_eq!(ratio(None), "-");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("Petróleo", 20), "Petróleo");
        assert_eq!(truncate("Energia Elétrica", 10), "Energia...");
    }
}
