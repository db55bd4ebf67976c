// src/session/http.rs
// =============================================================================
// The real transport: a reqwest::Client with a fixed header set.
//
// Every request from a session carries the same User-Agent, Accept,
// Accept-Language and Referer. Connections are kept alive and pooled inside
// the client, so a session reused by one worker keeps its sockets warm.
//
// Only status 200 bodies are downloaded; for anything else we just report the
// status and let the connection go.
// =============================================================================

use super::{Page, RetryPolicy, Session, SessionFactory};
use crate::config::ProbeSettings;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_ZH: &str = "zh-CN,zh;q=0.9";

/// Builds one `HttpSession` per call to `open`.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    headers: HeaderMap,
    retry: RetryPolicy,
}

impl HttpSessionFactory {
    pub fn new(settings: &ProbeSettings) -> Result<Self, FetchError> {
        Ok(Self {
            headers: default_headers(settings.template.referer())?,
            retry: RetryPolicy::with_retries(settings.max_retries),
        })
    }
}

impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    fn open(&self) -> Result<HttpSession, FetchError> {
        let client = Client::builder()
            .default_headers(self.headers.clone())
            .tcp_keepalive(Duration::from_secs(60))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(HttpSession {
            client,
            retry: self.retry.clone(),
        })
    }
}

fn default_headers(referer: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_ZH));
    headers.insert(
        REFERER,
        HeaderValue::from_str(referer).map_err(|e| FetchError::Session(e.to_string()))?,
    );
    Ok(headers)
}

/// A pooled HTTP client plus the retry budget applied to each GET.
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    retry: RetryPolicy,
}

impl HttpSession {
    async fn get_once(&self, url: &str, timeout: Duration) -> Result<Page, FetchError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();

        let body = if status == StatusCode::OK {
            response.text().await?
        } else {
            String::new()
        };

        Ok(Page {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Page, FetchError> {
        self.retry.run(move || self.get_once(url, timeout)).await
    }
}
