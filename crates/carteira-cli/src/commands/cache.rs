//! 캐시 관리 명령.

use anyhow::{Context, Result};
use carteira_data::DataService;
use tracing::info;

/// 종목들의 펀더멘털 캐시를 삭제합니다.
pub async fn invalidate(service: &DataService, tickers: &[String]) -> Result<usize> {
    for ticker in tickers {
        service
            .invalidate_fundamentals(ticker)
            .await
            .with_context(|| format!("Failed to invalidate cache for {}", ticker))?;
        info!(ticker = %ticker, "캐시 삭제");
    }

    println!("캐시 삭제 완료: {} 종목", tickers.len());
    Ok(tickers.len())
}
