//! 지표 추세 계산.
//!
//! 직전에 저장된 스냅샷과 새로 조회한 펀더멘털을 비교하여
//! 지표별 상승/하락 방향을 산출합니다.

use super::fundamentals::Fundamentals;
use crate::types::Fraction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// 추세 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// 상승
    Up,
    /// 하락
    Down,
}

/// 추세를 추적하는 지표.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    /// P/L
    Pe,
    /// ROE
    Roe,
    /// 배당수익률
    Dy,
}

/// 지표별 추세.
pub type Trends = BTreeMap<TrendMetric, Trend>;

/// 추세 비교용 축약 스냅샷.
///
/// 전체 캐시 항목과 별도로 저장되며, 성공적인 조회마다 덮어씁니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSnapshot {
    /// P/L
    pub price_earnings: Option<Decimal>,
    /// ROE (소수 비율)
    pub return_on_equity: Option<Decimal>,
    /// 배당수익률 (소수 비율)
    pub dividend_yield: Option<Decimal>,
    /// 저장 시각 (epoch ms)
    pub timestamp: i64,
}

/// 현재 값과 이전 스냅샷을 비교하여 추세를 계산합니다.
///
/// - 이전 스냅샷이 없으면 `None` (최초 조회)
/// - 현재 값이 더 크면 `Up`, 더 작으면 `Down`
/// - 값이 같거나 어느 한쪽이 비어 있으면 해당 지표는 생략
pub fn compute_trends(current: &Fundamentals, previous: Option<&TrendSnapshot>) -> Option<Trends> {
    let previous = previous?;

    let pairs = [
        (TrendMetric::Pe, current.price_earnings, previous.price_earnings),
        (
            TrendMetric::Roe,
            current.return_on_equity.map(Fraction::value),
            previous.return_on_equity,
        ),
        (
            TrendMetric::Dy,
            current.dividend_yield.map(Fraction::value),
            previous.dividend_yield,
        ),
    ];

    let trends = pairs
        .into_iter()
        .filter_map(|(metric, now, before)| {
            let direction = match now?.cmp(&before?) {
                Ordering::Greater => Trend::Up,
                Ordering::Less => Trend::Down,
                Ordering::Equal => return None,
            };
            Some((metric, direction))
        })
        .collect();

    Some(trends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ticker;
    use rust_decimal_macros::dec;

    fn current(pe: Option<Decimal>, roe: Option<Decimal>, dy: Option<Decimal>) -> Fundamentals {
        let mut f = Fundamentals::new(Ticker::parse("BBSE3").unwrap());
        f.price_earnings = pe;
        f.return_on_equity = roe.map(Fraction::from_fraction);
        f.dividend_yield = dy.map(Fraction::from_fraction);
        f
    }

    fn snapshot(pe: Option<Decimal>, roe: Option<Decimal>, dy: Option<Decimal>) -> TrendSnapshot {
        TrendSnapshot {
            price_earnings: pe,
            return_on_equity: roe,
            dividend_yield: dy,
            timestamp: 0,
        }
    }

    #[test]
    fn test_no_previous_snapshot() {
        let f = current(Some(dec!(8)), None, None);
        assert!(compute_trends(&f, None).is_none());
    }

    #[test]
    fn test_dividend_yield_up() {
        let f = current(None, None, Some(dec!(0.08)));
        let prev = snapshot(None, None, Some(dec!(0.05)));
        let trends = compute_trends(&f, Some(&prev)).unwrap();
        assert_eq!(trends.get(&TrendMetric::Dy), Some(&Trend::Up));
        assert_eq!(trends.len(), 1);
    }

    #[test]
    fn test_mixed_directions() {
        let f = current(Some(dec!(7.5)), Some(dec!(0.20)), Some(dec!(0.06)));
        let prev = snapshot(Some(dec!(8.0)), Some(dec!(0.18)), Some(dec!(0.06)));
        let trends = compute_trends(&f, Some(&prev)).unwrap();

        assert_eq!(trends.get(&TrendMetric::Pe), Some(&Trend::Down));
        assert_eq!(trends.get(&TrendMetric::Roe), Some(&Trend::Up));
        // 같은 값은 추세 없음
        assert_eq!(trends.get(&TrendMetric::Dy), None);
    }

    #[test]
    fn test_equal_values_produce_no_entry() {
        let f = current(Some(dec!(8.00)), Some(dec!(0.2)), Some(dec!(0.05)));
        let prev = snapshot(Some(dec!(8)), Some(dec!(0.20)), Some(dec!(0.050)));
        let trends = compute_trends(&f, Some(&prev)).unwrap();
        assert!(trends.is_empty());
    }

    #[test]
    fn test_missing_side_produces_no_entry() {
        let f = current(None, Some(dec!(0.2)), None);
        let prev = snapshot(Some(dec!(8)), None, Some(dec!(0.05)));
        let trends = compute_trends(&f, Some(&prev)).unwrap();
        assert!(trends.is_empty());
    }

    #[test]
    fn test_trends_serialize_as_short_names() {
        let f = current(Some(dec!(9)), None, Some(dec!(0.08)));
        let prev = snapshot(Some(dec!(8)), None, Some(dec!(0.05)));
        let trends = compute_trends(&f, Some(&prev)).unwrap();
        let json = serde_json::to_string(&trends).unwrap();
        assert_eq!(json, r#"{"pe":"up","dy":"up"}"#);
    }
}
