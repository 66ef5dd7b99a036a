//! JSON 응답 필드 매핑 헬퍼.
//!
//! 어댑터는 원시 필드마다 단위를 명시하는 함수로 값을 읽습니다:
//! - [`ratio`]: 배수/금액 등 변환 없는 값
//! - [`fraction`]: 이미 소수 비율인 값 (0.15)
//! - [`percent`]: 퍼센트 값 (15.0 → 0.15)
//!
//! 후보 키 목록 중 해석 가능한 첫 번째 값을 사용합니다.
//! 문자열은 브라질 표기법으로 해석하며, `.`을 소수점으로 쓰는 API는 [`plain`]을 사용합니다.

use carteira_core::{parse, parse_plain, Fraction};
use rust_decimal::Decimal;
use serde_json::Value;

/// 변환 없는 수치.
pub fn ratio(obj: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| obj.get(*key).and_then(|v| parse(v)))
}

/// 소수 비율 값.
pub fn fraction(obj: &Value, keys: &[&str]) -> Option<Fraction> {
    ratio(obj, keys).map(Fraction::from_fraction)
}

/// 퍼센트 값 (÷100).
pub fn percent(obj: &Value, keys: &[&str]) -> Option<Fraction> {
    ratio(obj, keys).map(Fraction::from_percent)
}

/// `.`을 소수점으로 쓰는 문자열 수치 (예: `"5.4321"`).
pub fn plain(obj: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) => parse_plain(s),
        other => parse(other),
    })
}

/// 문자열 값 (빈 문자열 제외).
pub fn text<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// 배열의 첫 번째 객체.
pub fn first<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .filter(|item| item.is_object())
}
