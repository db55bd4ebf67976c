// src/session/fake.rs
// =============================================================================
// Scripted in-memory sessions for tests.
//
// A FakeFactory maps each candidate id (the last path segment of the URL) to
// a canned Reply and records everything the code under test does with it:
// which ids were requested, how many sessions are alive, and how many gets
// were in flight at the same time.
// =============================================================================

use super::{Page, Session, SessionFactory};
use crate::error::FetchError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Fail(FetchError),
    Panic,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Status(200, body.into())
    }

    pub fn titled(title: &str) -> Self {
        Reply::ok(format!("<html><head><title>{title}</title></head><body></body></html>"))
    }
}

#[derive(Default)]
struct Counters {
    requested: Mutex<Vec<u64>>,
    opened: AtomicUsize,
    live: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeFactory {
    script: Arc<dyn Fn(u64) -> Reply + Send + Sync>,
    delay: Duration,
    fail_open: bool,
    counters: Arc<Counters>,
}

impl FakeFactory {
    pub fn new(script: impl Fn(u64) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            script: Arc::new(script),
            delay: Duration::ZERO,
            fail_open: false,
            counters: Arc::default(),
        }
    }

    /// Makes each get hold its slot for `delay`, so concurrency is observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn requested(&self) -> Vec<u64> {
        self.counters.requested.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }
}

impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    fn open(&self) -> Result<FakeSession, FetchError> {
        if self.fail_open {
            return Err(FetchError::Session("fake factory refuses to open".into()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            factory: self.clone(),
        })
    }
}

pub struct FakeSession {
    factory: FakeFactory,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.factory.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// Decrements the in-flight gauge even when the reply panics
struct InFlight<'a>(&'a Counters);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<Page, FetchError> {
        let counters = &self.factory.counters;
        let id: u64 = url
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
            .expect("fake urls end in a numeric id");
        counters.requested.lock().unwrap().push(id);

        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _slot = InFlight(counters);

        if self.factory.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.factory.delay).await;
        }

        match (self.factory.script)(id) {
            Reply::Status(status, body) => Ok(Page { status, body }),
            Reply::Fail(err) => Err(err),
            Reply::Panic => panic!("scripted panic for id {id}"),
        }
    }
}
