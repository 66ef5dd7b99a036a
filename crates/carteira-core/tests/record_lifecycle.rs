//! 공급자 원시 값 → 병합 → PEG/추세 계산까지의 레코드 흐름 테스트.

use carteira_core::{
    compute_trends, parse, DataSource, Fraction, Fundamentals, RawUnit, Ticker, Trend,
    TrendMetric,
};
use rust_decimal_macros::dec;
use serde_json::json;

fn primary(ticker: &Ticker) -> Fundamentals {
    // brapi 스타일: 소수 비율
    let payload = json!({ "pl": 8.5, "roe": "0.21", "pvp": null });
    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::Brapi);
    out.price_earnings = parse(&payload["pl"]);
    out.return_on_equity = parse(&payload["roe"]).map(|v| RawUnit::Fraction.to_fraction(v));
    out.price_to_book = parse(&payload["pvp"]);
    out
}

fn scraped(ticker: &Ticker) -> Fundamentals {
    // Fundamentus 스타일: 브라질 표기 퍼센트
    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::Fundamentus);
    out.price_earnings = parse("9,10");
    out.return_on_equity = parse("30,5%").map(|v| RawUnit::Percent.to_fraction(v));
    out.dividend_yield = parse("12,3%").map(|v| RawUnit::Percent.to_fraction(v));
    out.price_to_book = parse("1,35");
    out.earnings_growth = parse("17%").map(|v| RawUnit::Percent.to_fraction(v));
    out.set_sector(Some("Petróleo, Gás e Biocombustíveis"));
    out
}

#[test]
fn test_merge_keeps_primary_values_and_fills_gaps() {
    let ticker = Ticker::parse(" petr4 ").unwrap();
    let mut record = primary(&ticker);
    assert_eq!(record.missing_essentials(), vec!["dividendYield", "priceToBook"]);

    let filled = record.fill_gaps(&scraped(&ticker));

    // P/L, ROE는 1순위 값 유지
    assert_eq!(record.price_earnings, Some(dec!(8.5)));
    assert_eq!(record.return_on_equity, Some(Fraction::from_fraction(dec!(0.21))));
    assert_eq!(record.dividend_yield.map(Fraction::value), Some(dec!(0.123)));
    assert_eq!(record.price_to_book, Some(dec!(1.35)));
    assert_eq!(record.sector, "Petróleo, Gás e Biocombustíveis");
    assert_eq!(filled, 4);
    assert!(record.has_all_essentials());
    assert!(record.is_cache_complete());
}

#[test]
fn test_peg_uses_earnings_growth() {
    let ticker = Ticker::parse("PETR4").unwrap();
    let mut record = primary(&ticker);
    record.fill_gaps(&scraped(&ticker));

    record.derive_peg();
    // 8.5 / 17
    assert_eq!(record.peg_ratio, Some(dec!(0.5)));
}

#[test]
fn test_trends_against_previous_snapshot() {
    let ticker = Ticker::parse("PETR4").unwrap();
    let mut before = primary(&ticker);
    before.fill_gaps(&scraped(&ticker));
    let snapshot = before.snapshot();

    let mut after = before.clone();
    after.price_earnings = Some(dec!(7.9));
    after.dividend_yield = Some(Fraction::from_percent(dec!(13)));

    assert_eq!(compute_trends(&after, None), None);

    let trends = compute_trends(&after, Some(&snapshot)).unwrap();
    assert_eq!(trends.get(&TrendMetric::Pe), Some(&Trend::Down));
    assert_eq!(trends.get(&TrendMetric::Dy), Some(&Trend::Up));
    assert_eq!(trends.get(&TrendMetric::Roe), None);
}

#[test]
fn test_cache_json_round_trip() {
    let ticker = Ticker::parse("VALE3").unwrap();
    let mut record = primary(&ticker);
    record.fill_gaps(&scraped(&ticker));

    let stored = serde_json::to_string(&record).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert!(value.get("returnOnEquity").is_some());
    assert!(value.get("dividendYield").is_some());

    let restored: Fundamentals = serde_json::from_str(&stored).unwrap();
    assert_eq!(restored, record);
}

#[test]
fn test_unavailable_record_is_empty() {
    let record = Fundamentals::unavailable(Ticker::sanitized("  ab "));
    assert!(record.is_empty());
    assert!(!record.has_any_essential());
    assert_eq!(record.sector, "N/A");
    assert_eq!(record.industry, "N/A");
    assert!(record.source.is_none());
}
