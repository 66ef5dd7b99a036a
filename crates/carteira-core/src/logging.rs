//! 구조화 로깅 초기화.
//!
//! 공급자 호출마다 `provider`, `ticker` 필드를 남기므로 출력 형식을 용도에 맞게 고릅니다:
//! - **pretty**: 터미널에서 읽기 좋은 여러 줄 형식
//! - **json**: 수집기로 보내는 한 줄 JSON
//! - **compact**: 필드만 간결하게 나열
//!
//! HTTP/HTML 파서 계열 crate는 별도 지시자가 없으면 `warn` 이상만 기록합니다.

use crate::error::CoreError;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// 설정 파일보다 우선하는 필터 환경 변수.
pub const LOG_LEVEL_ENV: &str = "CARTEIRA_LOG";

/// 기본으로 낮추는 외부 crate 대상.
const NOISY_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "html5ever", "selectors"];

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 여러 줄, 색상 포함
    #[default]
    Pretty,
    /// 한 줄 JSON
    Json,
    /// 한 줄 간결 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(CoreError::InvalidInput(format!("알 수 없는 로그 형식: {}", s))),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 필터 지시자 (예: "info", "carteira_data=debug")
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
    /// span 진입/종료 기록 (공급자 호출 소요 시간 확인용)
    pub with_span_events: bool,
    /// 파일명/줄 번호
    pub with_file: bool,
    /// 모듈 경로
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_span_events: false,
            with_file: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    /// 외부 crate 기본 지시자를 덧붙인 필터 문자열.
    ///
    /// 사용자가 이미 지정한 대상은 건드리지 않습니다.
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![self.level.trim().to_string()];
        for target in NOISY_TARGETS {
            let prefix = format!("{}=", target);
            if !self.level.split(',').any(|d| d.trim().starts_with(&prefix)) {
                directives.push(format!("{}warn", prefix));
            }
        }
        directives.retain(|d| !d.is_empty());
        directives.join(",")
    }
}

/// 로깅 시스템을 초기화합니다.
///
/// 표/JSON 결과가 stdout으로 나가므로 로그는 stderr에 기록합니다.
/// `CARTEIRA_LOG`가 설정되어 있으면 설정 파일의 레벨보다 우선합니다.
///
/// ```no_run
/// use carteira_core::logging::{init_logging, LogConfig, LogFormat};
///
/// let config = LogConfig::new("carteira_data=debug").with_format(LogFormat::Json);
/// init_logging(config).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let directives = std::env::var(LOG_LEVEL_ENV)
        .map(|level| LogConfig::new(level).filter_directives())
        .unwrap_or_else(|_| config.filter_directives());
    let env_filter = EnvFilter::try_new(&directives)?;

    let span_events = if config.with_span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.with_file)
        .with_line_number(config.with_file)
        .with_target(config.with_target)
        .with_span_events(span_events);

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    tracing::debug!(format = ?config.format, filter = %directives, "로깅 초기화");
    Ok(())
}

/// 공급자 호출 컨텍스트 필드가 포함된 span을 생성하는 매크로.
#[macro_export]
macro_rules! provider_span {
    ($name:expr, $provider:expr, $ticker:expr) => {
        tracing::debug_span!($name, provider = %$provider, ticker = %$ticker)
    };
}
