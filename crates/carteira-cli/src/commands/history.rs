//! 가격 이력 조회 명령.

use super::output::{number, to_json};
use anyhow::{bail, Result};
use carteira_core::{history_range, PricePoint, HISTORY_RANGES};
use carteira_data::DataService;

/// 일별 종가 이력을 조회하여 출력합니다.
pub async fn show_history(
    service: &DataService,
    ticker: &str,
    range: &str,
    json: bool,
) -> Result<Vec<PricePoint>> {
    if history_range(range).is_none() {
        bail!("Invalid range: {}. Use: {}", range, HISTORY_RANGES.join(", "));
    }

    let points = service.get_price_history(ticker, range).await;
    if points.is_empty() {
        bail!("{} 가격 이력을 찾을 수 없습니다", ticker);
    }

    if json {
        println!("{}", to_json(&points)?);
    } else {
        for point in &points {
            println!("{}", format_point(point));
        }
    }

    Ok(points)
}

fn format_point(point: &PricePoint) -> String {
    format!(
        "{}  {:>12}  {:>16}",
        point.date.format("%Y-%m-%d"),
        point.price.round_dp(2),
        number(point.volume),
    )
}
