// src/session/mod.rs
// =============================================================================
// This module builds the transport sessions that probes fetch pages with.
//
// Submodules:
// - http: the real session, a reqwest::Client with fixed headers
// - retry: bounded retry with exponential backoff for transient failures
// - fake: a scripted in-memory session used by the tests
//
// The probe and the scheduler only see the two traits below, so a test can
// swap the network out for a deterministic fake.
// =============================================================================

mod http;
mod retry;

#[cfg(test)]
pub mod fake;

pub use http::HttpSessionFactory;
pub use retry::RetryPolicy;

use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// What came back from one GET.
///
/// `body` is only filled in for status 200; nothing downstream looks at the
/// body of any other response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

/// A client that can fetch candidate URLs. Dropping it releases its
/// connection pool.
#[async_trait]
pub trait Session: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Page, FetchError>;
}

/// Hands out sessions, either one per probe or one per worker.
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session + 'static;

    fn open(&self) -> Result<Self::Session, FetchError>;
}
