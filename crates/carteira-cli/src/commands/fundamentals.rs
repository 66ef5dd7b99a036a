//! 펀더멘털 조회 명령.

use super::output::{number, ratio, to_json, truncate, OutputFormat};
use anyhow::Result;
use carteira_core::{Fundamentals, Trend, TrendMetric};
use carteira_data::DataService;
use tracing::info;

/// 펀더멘털 조회 설정.
#[derive(Debug)]
pub struct FundamentalsConfig {
    /// 조회할 티커 목록
    pub tickers: Vec<String>,
    /// 캐시 무시 여부
    pub refresh: bool,
    /// 출력 형식
    pub format: OutputFormat,
}

/// 펀더멘털을 조회하여 출력합니다. 데이터를 찾은 종목 수를 반환합니다.
pub async fn show_fundamentals(service: &DataService, config: FundamentalsConfig) -> Result<usize> {
    let records = if config.refresh {
        let mut records = Vec::with_capacity(config.tickers.len());
        for ticker in &config.tickers {
            records.push(service.refresh_fundamentals(ticker).await);
        }
        records
    } else {
        service.get_fundamentals_batch(&config.tickers).await
    };

    let found = records.iter().filter(|r| !r.is_empty()).count();
    info!(requested = records.len(), found, "펀더멘털 조회 완료");

    let content = match config.format {
        OutputFormat::Table => format_table(&records),
        OutputFormat::Json => to_json(&records)?,
    };
    println!("{}", content);

    Ok(found)
}

/// 테이블 형식 출력.
fn format_table(records: &[Fundamentals]) -> String {
    let mut output = String::new();

    // 헤더
    output.push_str(&format!(
        "{:<8} {:>8} {:>8} {:>9} {:>9} {:>8} {:<28} {:<14} {:<12}\n",
        "TICKER", "P/L", "P/VP", "ROE", "DY", "PEG", "SECTOR", "SOURCE", "TREND"
    ));
    output.push_str(&"-".repeat(110));
    output.push('\n');

    // 데이터
    for record in records {
        output.push_str(&format!(
            "{:<8} {:>8} {:>8} {:>9} {:>9} {:>8} {:<28} {:<14} {:<12}\n",
            record.ticker.as_str(),
            number(record.price_earnings),
            number(record.price_to_book),
            ratio(record.return_on_equity),
            ratio(record.dividend_yield),
            number(record.peg_ratio),
            truncate(&record.sector, 28),
            record.source.map(|s| s.as_str()).unwrap_or("-"),
            trend_cell(record),
        ));
    }

    let missing = records.iter().filter(|r| r.is_empty()).count();
    output.push('\n');
    output.push_str(&format!("Total: {} tickers", records.len()));
    if missing > 0 {
        output.push_str(&format!(" ({} unavailable)", missing));
    }

    output
}

/// 추세 셀 (예: `pe↓ dy↑`).
fn trend_cell(record: &Fundamentals) -> String {
    let Some(trends) = &record.trends else {
        return "-".to_string();
    };
    if trends.is_empty() {
        return "=".to_string();
    }

    trends
        .iter()
        .map(|(metric, trend)| {
            let arrow = match trend {
                Trend::Up => '↑',
                Trend::Down => '↓',
            };
            format!("{}{}", metric_label(*metric), arrow)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn metric_label(metric: TrendMetric) -> &'static str {
    match metric {
        TrendMetric::Pe => "pe",
        TrendMetric::Roe => "roe",
        TrendMetric::Dy => "dy",
    }
}
