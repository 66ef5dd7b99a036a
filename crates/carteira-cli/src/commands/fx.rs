//! 환율 조회 명령.

use super::output::number;
use anyhow::{Context, Result};
use carteira_core::ExchangeRate;
use carteira_data::DataService;

/// 기본 통화쌍.
pub const DEFAULT_PAIR: &str = "USD-BRL";

/// 환율을 조회하여 출력합니다.
pub async fn show_exchange_rate(service: &DataService, pair: &str) -> Result<ExchangeRate> {
    let rate = service
        .get_exchange_rate(pair)
        .await
        .with_context(|| format!("{} 환율을 찾을 수 없습니다", pair))?;

    println!(
        "{}  bid: {}  ask: {}  ({})",
        rate.pair,
        number(rate.bid),
        number(rate.ask),
        rate.source.map(|s| s.as_str()).unwrap_or("-"),
    );

    Ok(rate)
}
