//! 펀더멘털 집계 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 펀더멘털 조회 (캐시 우선)
//! carteira fundamentals PETR4 VALE3 ITUB4
//!
//! # 캐시를 무시하고 JSON으로 출력
//! carteira fundamentals PETR4 --refresh --format json
//!
//! # 시세 조회
//! carteira quote HGLG11 --type FII
//! carteira quote BTC --type Crypto
//!
//! # 가격 이력 조회
//! carteira history PETR4 --range 6mo
//!
//! # 환율 조회
//! carteira fx --pair EUR-BRL
//!
//! # 캐시 삭제
//! carteira cache invalidate PETR4
//! ```

use anyhow::{anyhow, Context, Result};
use carteira_cli::commands::fundamentals::{show_fundamentals, FundamentalsConfig};
use carteira_cli::commands::{cache, fx, history, quote};
use carteira_cli::OutputFormat;
use carteira_core::{init_logging, AppConfig, AssetType, DEFAULT_HISTORY_RANGE};
use carteira_data::DataService;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "carteira")]
#[command(about = "Carteira CLI - 브라질 종목 펀더멘털/시세 집계", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (기본: config/default.toml, 없으면 기본값)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// 로그 레벨 (예: info, debug, carteira_data=trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 펀더멘털 조회 (brapi → Fundamentus → HG Brasil → Yahoo → Alpha Vantage → FMP)
    Fundamentals {
        /// 티커 목록 (예: PETR4 VALE3)
        #[arg(required = true)]
        tickers: Vec<String>,

        /// 캐시를 무시하고 다시 조회
        #[arg(long, default_value = "false")]
        refresh: bool,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 시세 조회
    Quote {
        /// 티커 (예: PETR4, BTC)
        ticker: String,

        /// 자산 유형 (Ação, FII, ETF, BDR, Crypto)
        #[arg(short = 't', long = "type", default_value = "Ação")]
        asset_type: String,

        /// 캐시를 무시하고 다시 조회
        #[arg(long, default_value = "false")]
        refresh: bool,

        /// JSON으로 출력
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// 일별 가격 이력 조회 (brapi)
    History {
        /// 티커 (예: PETR4)
        ticker: String,

        /// 기간 (1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)
        #[arg(short, long, default_value = DEFAULT_HISTORY_RANGE)]
        range: String,

        /// JSON으로 출력
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// 환율 조회
    Fx {
        /// 통화쌍
        #[arg(short, long, default_value = fx::DEFAULT_PAIR)]
        pair: String,
    },

    /// 캐시 관리
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// 펀더멘털 캐시 삭제
    Invalidate {
        /// 티커 목록
        #[arg(required = true)]
        tickers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => AppConfig::load_default().context("Failed to load default config")?,
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // 트레이싱 초기화
    init_logging(config.logging.to_log_config())
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let service = DataService::from_config(&config)
        .await
        .context("Failed to initialize data service")?;

    match cli.command {
        Commands::Fundamentals {
            tickers,
            refresh,
            format,
        } => {
            let format = OutputFormat::parse(&format)?;
            let found = show_fundamentals(
                &service,
                FundamentalsConfig {
                    tickers,
                    refresh,
                    format,
                },
            )
            .await?;
            info!(found, "펀더멘털 출력 완료");
        }

        Commands::Quote {
            ticker,
            asset_type,
            refresh,
            json,
        } => {
            let asset_type = AssetType::from_label(&asset_type);
            quote::show_quote(&service, &ticker, asset_type, refresh, json).await?;
        }

        Commands::History {
            ticker,
            range,
            json,
        } => {
            let points = history::show_history(&service, &ticker, &range, json).await?;
            info!(points = points.len(), "가격 이력 출력 완료");
        }

        Commands::Fx { pair } => {
            fx::show_exchange_rate(&service, &pair).await?;
        }

        Commands::Cache { action } => match action {
            CacheAction::Invalidate { tickers } => {
                cache::invalidate(&service, &tickers).await?;
            }
        },
    }

    Ok(())
}
