//! 공급자 공용 HTTP 헬퍼.

use crate::error::ProviderError;
use reqwest::{header, Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Fundamentus 등 HTML 소스용 데스크톱 브라우저 User-Agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 타임아웃과 User-Agent가 설정된 HTTP 클라이언트를 생성합니다.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, ProviderError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// JSON GET 요청.
///
/// 2xx 상태와 `application/json` Content-Type을 요구합니다.
/// 쿼리 문자열(API 키 포함)은 로그에 남기지 않습니다.
pub async fn get_json(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Value, ProviderError> {
    debug!(url = %url, "JSON 요청");

    let response = client
        .get(url)
        .header(header::ACCEPT, "application/json")
        .query(query)
        .send()
        .await?;

    let response = check_status(response)?;
    check_content_type(&response, "application/json")?;

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// HTML GET 요청. `text/html` Content-Type을 요구합니다.
pub async fn get_html(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<String, ProviderError> {
    debug!(url = %url, "HTML 요청");

    let response = client
        .get(url)
        .header(header::USER_AGENT, BROWSER_USER_AGENT)
        .header(header::ACCEPT, "text/html")
        .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9")
        .query(query)
        .send()
        .await?;

    let response = check_status(response)?;
    check_content_type(&response, "text/html")?;

    Ok(response.text().await?)
}

fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status(status.as_u16()))
    }
}

fn check_content_type(response: &Response, expected: &str) -> Result<(), ProviderError> {
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.to_ascii_lowercase().contains(expected) {
        Ok(())
    } else {
        Err(ProviderError::ContentType(content_type.to_string()))
    }
}
