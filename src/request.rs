use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use leptos::{RwSignal, SignalGetUntracked, SignalSet};
use serde::de::DeserializeOwned;
use tracing::warn;
use urlencoding::encode;

use crate::config::{AppConfig, ALARM_LIMIT};
use crate::datetime::add_days;
use crate::types::{Alarm, Reading, Thresholds};

pub const RECENT_LIMIT: u32 = 1000;
pub const DAY_LIMIT: u32 = 2000;

/// Read-only client for the telemetry backend, owned by the dashboard.
///
/// Every operation is an idempotent GET that degrades to a fallback value on
/// transport, HTTP, or decode failure; nothing here retries. The injected
/// `healthy` signal drives the API badge in the header.
#[derive(Clone)]
pub struct ApiClient {
    base: String,
    tz: Tz,
    thresholds: ThresholdsCache,
    healthy: RwSignal<bool>,
}

impl ApiClient {
    pub fn new(config: &AppConfig, healthy: RwSignal<bool>) -> Self {
        Self {
            base: config.api_base.clone(),
            tz: config.display_tz,
            thresholds: ThresholdsCache::default(),
            healthy,
        }
    }

    /// Threshold set, fetched at most once per page session. A failed fetch
    /// is not cached, so the next call retries; `None` means the caller
    /// should fall back to `Thresholds::default()`.
    pub async fn thresholds(&self) -> Option<Thresholds> {
        self.thresholds
            .get_or_load(|| async { self.get_or_fallback("/api/thresholds").await })
            .await
    }

    pub fn invalidate_thresholds(&self) {
        self.thresholds.invalidate();
    }

    pub async fn latest(&self, pozo: &str) -> Option<Reading> {
        self.get_or_fallback(&latest_query(pozo)).await
    }

    pub async fn recent(&self, query: &RecentQuery) -> Vec<Reading> {
        self.get_or_fallback(&recent_query(query)).await
    }

    pub async fn alarms(&self, filter: &AlarmFilter) -> Vec<Alarm> {
        self.get_or_fallback(&alarms_query(filter, ALARM_LIMIT, self.tz))
            .await
    }

    async fn get_or_fallback<T>(&self, path_and_query: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.get_json(path_and_query).await {
            Ok(value) => {
                self.mark_healthy(true);
                value
            }
            Err(err) => {
                warn!("backend request failed: {err:#}");
                self.mark_healthy(false);
                T::default()
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{path_and_query}", self.base);
        let response = reqwest::Client::new()
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        response.json().await.context("decoding response body")
    }

    fn mark_healthy(&self, ok: bool) {
        if self.healthy.get_untracked() != ok {
            self.healthy.set(ok);
        }
    }
}

/// Memoized threshold set with an explicit lifecycle: populated on the first
/// successful load, readable for the rest of the session, invalidated only
/// at teardown.
#[derive(Clone, Default)]
pub struct ThresholdsCache(Rc<RefCell<Option<Thresholds>>>);

impl ThresholdsCache {
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Option<Thresholds>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Thresholds>>,
    {
        if let Some(cached) = *self.0.borrow() {
            return Some(cached);
        }
        let loaded = load().await;
        if let Some(thresholds) = loaded {
            *self.0.borrow_mut() = Some(thresholds);
        }
        loaded
    }

    pub fn invalidate(&self) {
        self.0.borrow_mut().take();
    }
}

/// Monotonic tickets for fetch rounds. In-flight requests are never
/// cancelled, so a slow response from a superseded round must be dropped
/// instead of overwriting fresher data.
#[derive(Clone, Default)]
pub struct RequestSeq(Rc<Cell<u64>>);

impl RequestSeq {
    pub fn begin(&self) -> u64 {
        let ticket = self.0.get() + 1;
        self.0.set(ticket);
        ticket
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.get() == ticket
    }
}

pub fn latest_query(pozo: &str) -> String {
    format!("/api/latest?pozo={}", encode(pozo))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentQuery {
    pub pozo: String,
    pub limit: u32,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub fn recent_query(query: &RecentQuery) -> String {
    let mut url = format!(
        "/api/recent?pozo={}&limit={}",
        encode(&query.pozo),
        query.limit
    );
    if let Some(start) = &query.start {
        url.push_str(&format!("&start={}", encode(start)));
    }
    if let Some(end) = &query.end {
        url.push_str(&format!("&end={}", encode(end)));
    }
    url
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlarmFilter {
    pub pozo: Option<String>,
    pub day: Option<String>,
}

/// A single calendar day expands to the half-open range `[day, day+1)`
/// before being sent.
pub fn alarms_query(filter: &AlarmFilter, limit: u32, tz: Tz) -> String {
    let mut url = format!("/api/alarms?limit={limit}");
    if let Some(pozo) = &filter.pozo {
        url.push_str(&format!("&pozo={}", encode(pozo)));
    }
    if let Some(day) = &filter.day {
        if let Some(end) = add_days(day, 1, tz) {
            url.push_str(&format!("&start={day}&end={end}"));
        } else {
            warn!(%day, "ignoring unparseable alarm day filter");
        }
    }
    url
}
