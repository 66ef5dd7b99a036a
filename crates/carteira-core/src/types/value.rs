//! 공급자 원시 값 파서.
//!
//! 외부 공급자가 내려주는 문자열/숫자를 `Decimal` 또는 `None`으로 정규화합니다.
//!
//! - 브라질 표기법: `.`은 천 단위 구분자, `,`는 소수점 (예: `"1.234,56"`)
//! - `%` 기호, `R$` 통화 접두사, 공백(NBSP 포함) 제거
//! - `"-"`, `""`, `"N/A"` 등 미제공 표식은 `None`
//!
//! 어떤 입력에도 패닉하지 않으며, 해석할 수 없는 값은 `None`이 됩니다.
//! `Decimal`은 NaN/무한대를 표현할 수 없으므로 결과는 항상 유한한 수입니다.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// 값이 없음을 의미하는 표식 (소문자 비교).
const MISSING_MARKERS: &[&str] = &["-", "--", "n/a", "na", "none", "null", "nan"];

/// 지수 표기 해석을 허용할 최대 지수 자릿수.
const MAX_EXPONENT_DIGITS: usize = 2;

/// 원시 값을 `Decimal`로 해석할 수 있는 타입.
pub trait ParseValue {
    /// 값을 해석합니다. 해석할 수 없으면 `None`.
    fn parse_value(&self) -> Option<Decimal>;
}

/// 원시 값(문자열/숫자/null)을 해석합니다.
///
/// ```
/// use carteira_core::types::parse;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse("69,9%"), Some(dec!(69.9)));
/// assert_eq!(parse("1.234,56"), Some(dec!(1234.56)));
/// assert_eq!(parse("N/A"), None);
/// ```
pub fn parse<T: ParseValue + ?Sized>(raw: &T) -> Option<Decimal> {
    raw.parse_value()
}

/// 브라질 표기법 문자열을 해석합니다.
pub fn parse_text(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        return None;
    }

    let cleaned: String = trimmed
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%' && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    parse_number(&cleaned)
}

/// `.`을 소수점으로 쓰는 API 문자열을 해석합니다 (예: `"0.0523"`, `"1,234.5"`).
pub fn parse_plain(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%' && *c != ',')
        .collect();

    parse_number(&cleaned)
}

fn is_missing(trimmed: &str) -> bool {
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed.to_lowercase().as_str())
}

/// 정리된 숫자 문자열을 해석합니다. 지수 표기(`1e-5`)도 허용합니다.
fn parse_number(cleaned: &str) -> Option<Decimal> {
    let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(value) = Decimal::from_str(cleaned) {
        return Some(value.normalize());
    }

    // 지수부가 짧은 경우에만 지수 표기를 시도
    let (mantissa, exponent) = cleaned.split_once(['e', 'E'])?;
    let digits = exponent.trim_start_matches(['+', '-']);
    if mantissa.is_empty()
        || digits.is_empty()
        || digits.len() > MAX_EXPONENT_DIGITS
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let sign = if exponent.starts_with('-') { "-" } else { "" };
    Decimal::from_scientific(&format!("{mantissa}e{sign}{digits}"))
        .ok()
        .map(|v| v.normalize())
}

// ==================== ParseValue 구현 ====================

impl ParseValue for str {
    fn parse_value(&self) -> Option<Decimal> {
        parse_text(self)
    }
}

impl ParseValue for String {
    fn parse_value(&self) -> Option<Decimal> {
        parse_text(self)
    }
}

impl ParseValue for Decimal {
    fn parse_value(&self) -> Option<Decimal> {
        Some(*self)
    }
}

impl ParseValue for f64 {
    fn parse_value(&self) -> Option<Decimal> {
        if !self.is_finite() {
            return None;
        }
        Decimal::from_f64(*self).map(|v| v.normalize())
    }
}

impl ParseValue for i64 {
    fn parse_value(&self) -> Option<Decimal> {
        Some(Decimal::from(*self))
    }
}

impl ParseValue for Value {
    fn parse_value(&self) -> Option<Decimal> {
        match self {
            // JSON 숫자 표현을 그대로 읽어 이진 부동소수점 오차를 피함
            Value::Number(n) => parse_number(&n.to_string()),
            Value::String(s) => parse_text(s),
            _ => None,
        }
    }
}

impl<T: ParseValue> ParseValue for Option<T> {
    fn parse_value(&self) -> Option<Decimal> {
        self.as_ref().and_then(ParseValue::parse_value)
    }
}

impl<T: ParseValue + ?Sized> ParseValue for &T {
    fn parse_value(&self) -> Option<Decimal> {
        (**self).parse_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_brazilian_locale() {
        assert_eq!(parse_text("8,02"), Some(dec!(8.02)));
        assert_eq!(parse_text("1.234,56"), Some(dec!(1234.56)));
        assert_eq!(parse_text("69,9%"), Some(dec!(69.9)));
        assert_eq!(parse_text("-3,5%"), Some(dec!(-3.5)));
        assert_eq!(parse_text("R$ 36,80"), Some(dec!(36.80)));
        assert_eq!(parse_text("\u{a0}12,0\u{a0}"), Some(dec!(12)));
        assert_eq!(parse_text("514.218.000.000"), Some(dec!(514218000000)));
    }

    #[test]
    fn test_parse_missing_markers() {
        for raw in ["-", "", "   ", "N/A", "n/a", "None", "null", "--"] {
            assert_eq!(parse_text(raw), None, "{raw:?}는 None이어야 함");
        }
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_text("abc"), None);
        assert_eq!(parse_text("%"), None);
        assert_eq!(parse_text("1,2,3"), None);
        assert_eq!(parse_text("+"), None);
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_plain("0.0523"), Some(dec!(0.0523)));
        assert_eq!(parse_plain("1,234.5"), Some(dec!(1234.5)));
        assert_eq!(parse_plain("None"), None);
        assert_eq!(parse_plain("-"), None);
        assert_eq!(parse_plain("2.5E-3"), Some(dec!(0.0025)));
    }

    #[test]
    fn test_parse_json_values() {
        assert_eq!(parse(&json!(0.635)), Some(dec!(0.635)));
        assert_eq!(parse(&json!(12)), Some(dec!(12)));
        assert_eq!(parse(&json!(1e-7)), Some(dec!(0.0000001)));
        assert_eq!(parse(&json!("69,9%")), Some(dec!(69.9)));
        assert_eq!(parse(&json!(null)), None);
        assert_eq!(parse(&json!(true)), None);
        assert_eq!(parse(&json!([1, 2])), None);
        assert_eq!(parse(&json!({"raw": 1})), None);
    }

    #[test]
    fn test_parse_numbers_pass_through() {
        assert_eq!(parse(&dec!(0.699)), Some(dec!(0.699)));
        assert_eq!(parse(&1.5f64), Some(dec!(1.5)));
        assert_eq!(parse(&f64::NAN), None);
        assert_eq!(parse(&f64::INFINITY), None);
        assert_eq!(parse(&Some(42i64)), Some(dec!(42)));
        assert_eq!(parse(&None::<f64>), None);
    }

    #[test]
    fn test_parse_is_idempotent_for_numbers() {
        let once = parse("69,9%").unwrap();
        assert_eq!(parse(&once), Some(once));

        let from_json = parse(&json!(0.12)).unwrap();
        assert_eq!(parse(&from_json), Some(from_json));
    }

    #[test]
    fn test_huge_exponent_is_rejected() {
        assert_eq!(parse_plain("1e-4294967295"), None);
        assert_eq!(parse_plain("1e400"), None);
    }

    proptest! {
        #[test]
        fn prop_parse_text_never_panics(raw in "\\PC*") {
            let _ = parse_text(&raw);
            let _ = parse_plain(&raw);
        }

        #[test]
        fn prop_brazilian_format_round_trip(int_part in 0u32..1_000_000, frac in 0u32..100) {
            let expected = Decimal::from(int_part) + Decimal::new(frac as i64, 2);
            let formatted = format!("{},{:02}", group_thousands(int_part), frac);
            prop_assert_eq!(parse_text(&formatted), Some(expected.normalize()));
        }

        #[test]
        fn prop_number_parse_is_passthrough(v in -1_000_000i64..1_000_000, scale in 0u32..6) {
            let d = Decimal::new(v, scale);
            prop_assert_eq!(parse(&d), Some(d));
        }
    }

    fn group_thousands(value: u32) -> String {
        let digits = value.to_string();
        let mut out = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push('.');
            }
            out.push(c);
        }
        out
    }
}
