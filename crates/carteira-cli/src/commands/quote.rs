//! 시세 조회 명령.

use super::output::{number, to_json};
use anyhow::{bail, Result};
use carteira_core::{AssetType, Quote, TickerDescriptor};
use carteira_data::DataService;

/// 시세를 조회하여 출력합니다.
///
/// 모든 공급자에서 가격을 얻지 못하면 실패합니다.
pub async fn show_quote(
    service: &DataService,
    ticker: &str,
    asset_type: AssetType,
    refresh: bool,
    json: bool,
) -> Result<Quote> {
    let descriptor = TickerDescriptor::new(ticker, asset_type);
    let quote = service.get_quote(&descriptor, refresh).await;

    if !quote.is_available() {
        bail!("{} ({}) 시세를 찾을 수 없습니다", quote.ticker, asset_type);
    }

    if json {
        println!("{}", to_json(&quote)?);
    } else {
        println!("{}", format_quote(&quote));
    }

    Ok(quote)
}

fn format_quote(quote: &Quote) -> String {
    let change = match (quote.change, quote.change_percent) {
        (Some(change), Some(pct)) => format!("{} ({}%)", change.round_dp(2), pct.round_dp(2)),
        (Some(change), None) => change.round_dp(2).to_string(),
        _ => "-".to_string(),
    };

    format!(
        "{} [{}] {} {}\n  change: {}  open: {}  high: {}  low: {}  prev: {}\n  source: {}",
        quote.ticker,
        quote.asset_type,
        quote.currency,
        number(quote.price),
        change,
        number(quote.open),
        number(quote.high),
        number(quote.low),
        number(quote.previous_close),
        quote.source.map(|s| s.as_str()).unwrap_or("-"),
    )
}
