//! 단위가 고정된 지표 값.
//!
//! 수익성/배당 지표는 항상 소수 비율(0.15 = 15%)로 저장합니다.
//! 공급자마다 퍼센트(15.0)와 소수(0.15)를 섞어 내려주므로,
//! `Fraction`은 생성 시점에 원시 값의 단위를 반드시 명시하도록 강제합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// 소수 비율로 정규화된 값 (0.15 = 15%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fraction(Decimal);

impl Fraction {
    /// 이미 소수 비율인 원시 값 (예: 0.15).
    pub fn from_fraction(value: Decimal) -> Self {
        Self(value.normalize())
    }

    /// 퍼센트 단위 원시 값 (예: 15.0 → 0.15).
    pub fn from_percent(value: Decimal) -> Self {
        Self((value / HUNDRED).normalize())
    }

    /// 소수 비율 값.
    pub fn value(self) -> Decimal {
        self.0
    }

    /// 퍼센트 값 (0.15 → 15). `Decimal` 범위를 넘으면 `None`.
    pub fn as_percent(self) -> Option<Decimal> {
        self.0.checked_mul(HUNDRED).map(|v| v.normalize())
    }
}

impl From<Fraction> for Decimal {
    fn from(f: Fraction) -> Self {
        f.0
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_percent() {
            Some(pct) => write!(f, "{:.2}%", pct),
            None => write!(f, "{}", self.0),
        }
    }
}

/// 공급자 원시 필드의 단위.
///
/// 어댑터의 필드 매핑은 각 원시 필드가 어떤 단위인지 이 타입으로 선언합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawUnit {
    /// 소수 비율 (0.15)
    Fraction,
    /// 퍼센트 (15.0)
    Percent,
}

impl RawUnit {
    /// 원시 값을 `Fraction`으로 변환합니다.
    pub fn to_fraction(self, value: Decimal) -> Fraction {
        match self {
            RawUnit::Fraction => Fraction::from_fraction(value),
            RawUnit::Percent => Fraction::from_percent(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_conversion() {
        assert_eq!(Fraction::from_percent(dec!(69.9)).value(), dec!(0.699));
        assert_eq!(Fraction::from_fraction(dec!(0.12)).value(), dec!(0.12));
        assert_eq!(RawUnit::Percent.to_fraction(dec!(18)).value(), dec!(0.18));
        assert_eq!(RawUnit::Fraction.to_fraction(dec!(0.18)).value(), dec!(0.18));
    }

    #[test]
    fn test_display_as_percent() {
        assert_eq!(Fraction::from_fraction(dec!(0.1234)).to_string(), "12.34%");
        assert_eq!(Fraction::from_percent(dec!(8)).to_string(), "8.00%");
    }

    #[test]
    fn test_as_percent_out_of_range() {
        let huge = Fraction::from_fraction(Decimal::MAX);
        assert_eq!(huge.as_percent(), None);
        assert_eq!(huge.to_string(), Decimal::MAX.to_string());
        assert_eq!(Fraction::from_fraction(dec!(0.15)).as_percent(), Some(dec!(15)));
    }

    #[test]
    fn test_serde_is_transparent() {
        let f = Fraction::from_fraction(dec!(0.08));
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, "\"0.08\"");
        let back: Fraction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
        let from_number: Fraction = serde_json::from_str("0.08").unwrap();
        assert_eq!(from_number, f);
    }

    proptest! {
        #[test]
        fn prop_percent_is_hundredth(v in -100_000i64..100_000) {
            let raw = Decimal::new(v, 1);
            let f = Fraction::from_percent(raw);
            prop_assert_eq!(f.value() * dec!(100), raw);
            prop_assert_eq!(f.as_percent(), Some(raw.normalize()));
        }
    }
}
