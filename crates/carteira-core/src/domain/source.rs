//! 데이터 공급자 식별자.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 데이터를 제공한 외부 공급자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// brapi.dev (1차 공급자)
    Brapi,
    /// fundamentus.com.br (HTML 스크래핑)
    Fundamentus,
    /// HG Brasil Finance
    HgBrasil,
    /// Yahoo Finance
    Yahoo,
    /// Alpha Vantage
    AlphaVantage,
    /// Financial Modeling Prep
    Fmp,
}

impl DataSource {
    /// 공급자 식별 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brapi => "brapi",
            Self::Fundamentus => "fundamentus",
            Self::HgBrasil => "hg_brasil",
            Self::Yahoo => "yahoo",
            Self::AlphaVantage => "alpha_vantage",
            Self::Fmp => "fmp",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "brapi" => Ok(Self::Brapi),
            "fundamentus" => Ok(Self::Fundamentus),
            "hg_brasil" | "hgbrasil" | "hg" => Ok(Self::HgBrasil),
            "yahoo" => Ok(Self::Yahoo),
            "alpha_vantage" | "alphavantage" => Ok(Self::AlphaVantage),
            "fmp" => Ok(Self::Fmp),
            _ => Err(CoreError::InvalidInput(format!("알 수 없는 공급자: {}", s))),
        }
    }
}
