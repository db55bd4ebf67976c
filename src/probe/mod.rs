// src/probe/mod.rs
// =============================================================================
// This module probes a single candidate id.
//
// One probe:
// 1. Builds the candidate URL from the template
// 2. Issues one GET (the session may retry transient failures internally)
// 3. Classifies what came back as Found, NotFound or Error
//
// A probe never returns an error to its caller. Whatever goes wrong on the
// wire ends up inside Outcome::Error, so the scheduler can keep going.
// =============================================================================

mod title;

pub use title::extract_title;

use crate::config::ProbeSettings;
use crate::error::FetchError;
use crate::session::{Page, Session, SessionFactory};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use tracing::{debug, info, trace};

/// A live page. One row of the output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub id: u64,
    pub title: String,
    pub url: String,
}

/// The three ways a probe can end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Status 200 with a usable title
    Found(ProbeResult),
    /// Anything else the server answered with
    NotFound,
    /// The request never produced a response
    Error(FetchError),
}

impl Outcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }
}

// Either a session the caller lent us, or one we opened and must drop
enum SessionGuard<'a, S> {
    Borrowed(&'a S),
    Owned(S),
}

impl<S> Deref for SessionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        match self {
            SessionGuard::Borrowed(session) => session,
            SessionGuard::Owned(session) => session,
        }
    }
}

/// Probes `id`, using `session` if given or a fresh one from `factory`.
///
/// A session opened here is dropped before returning, on every path.
pub async fn probe<F: SessionFactory>(
    id: u64,
    settings: &ProbeSettings,
    factory: &F,
    session: Option<&F::Session>,
) -> Outcome {
    let url = settings.template.url_for(id);

    let session = match session {
        Some(shared) => SessionGuard::Borrowed(shared),
        None => match factory.open() {
            Ok(own) => SessionGuard::Owned(own),
            Err(err) => {
                debug!(id, error = %err, "could not open session");
                return Outcome::Error(err);
            }
        },
    };

    match session.get(&url, settings.timeout).await {
        Ok(page) => classify(id, url, page, &settings.exclusion_marker),
        Err(err) => {
            debug!(id, %url, error = %err, "probe failed");
            Outcome::Error(err)
        }
    }
}

/// Decides Found / NotFound for a response that did come back.
pub fn classify(id: u64, url: String, page: Page, exclusion_marker: &str) -> Outcome {
    if page.status != 200 {
        trace!(id, status = page.status, "not found");
        return Outcome::NotFound;
    }

    let Some(title) = extract_title(&page.body) else {
        trace!(id, "no title");
        return Outcome::NotFound;
    };

    if title.contains(exclusion_marker) {
        trace!(id, %title, "excluded title");
        return Outcome::NotFound;
    }

    info!(id, %title, "found page");
    Outcome::Found(ProbeResult { id, title, url })
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does probe() return Outcome instead of Result?
//    - A failed candidate is an expected, everyday event in a sweep
//    - Returning a plain value means the caller cannot forget to handle it
//      and there is no error to accidentally propagate with ?
//
// 2. What is SessionGuard for?
//    - Sometimes the caller lends us a session, sometimes we open our own
//    - The guard derefs to the session either way
//    - When it holds an owned session, dropping the guard closes it, on the
//      success path, the early returns, and even during a panic
// -----------------------------------------------------------------------------
