//! Pageloads View
//!
//! Holds the events for the current date range and turns them into
//! something to draw. Changing the range dispatches a fetch on a tokio
//! task; the response is applied when it arrives.
//!
//! Every dispatch gets a sequence number. A response is applied only if no
//! later dispatch has happened since, so a slow response for an old range
//! can never overwrite a newer one. In-flight fetches are not cancelled.
//!
//! Fetch failures are logged and leave the held events untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use crate::events::{aggregate, DailyBucket, DateRange, Event};
use crate::source::{EventSource, SourceError};

/// What the view shows right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendering {
    /// Nothing to chart for the current range
    NoData,
    /// Daily series, ordered by day
    Chart(Vec<DailyBucket>),
}

/// Outcome of one dispatched fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The response replaced the held events
    Replaced { events: usize },
    /// A later dispatch superseded this one; response dropped
    Stale,
    /// The fetch failed; held events unchanged
    Failed,
}

/// Component state for the visitor chart
pub struct PageloadsView<S: EventSource + 'static> {
    source: Arc<S>,
    events: Arc<RwLock<Vec<Event>>>,
    latest_seq: Arc<AtomicU64>,
    range: Option<DateRange>,
    updates: watch::Sender<u64>,
}

impl<S: EventSource + 'static> PageloadsView<S> {
    /// Create an empty view backed by `source`
    pub fn new(source: Arc<S>) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            source,
            events: Arc::new(RwLock::new(Vec::new())),
            latest_seq: Arc::new(AtomicU64::new(0)),
            range: None,
            updates,
        }
    }

    /// The range most recently requested
    pub fn range(&self) -> Option<&DateRange> {
        self.range.as_ref()
    }

    /// Change the query window
    ///
    /// Returns `None` when `range` equals the current one, since nothing
    /// needs fetching. Otherwise the fetch runs in the background and the
    /// handle resolves once its response has been applied or dropped.
    pub fn set_range(&mut self, range: DateRange) -> Option<JoinHandle<Applied>> {
        if self.range.as_ref() == Some(&range) {
            return None;
        }
        self.range = Some(range.clone());
        Some(self.dispatch(range))
    }

    /// Set the range and wait for its response, fetching even if unchanged
    pub async fn refresh(&mut self, range: DateRange) -> Applied {
        self.range = Some(range.clone());
        match self.dispatch(range).await {
            Ok(applied) => applied,
            Err(e) => {
                tracing::error!(error = %e, "Pageloads fetch task did not complete");
                Applied::Failed
            }
        }
    }

    /// Receiver that ticks with the applied sequence number after each update
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// Copy of the held events
    pub async fn events(&self) -> Vec<Event> {
        self.events.read().await.clone()
    }

    /// Held events bucketed by local day
    pub async fn buckets(&self) -> Vec<DailyBucket> {
        aggregate(&self.events.read().await)
    }

    /// Recompute what to show from the held events
    pub async fn render(&self) -> Rendering {
        let buckets = self.buckets().await;
        if buckets.is_empty() {
            Rendering::NoData
        } else {
            Rendering::Chart(buckets)
        }
    }

    fn dispatch(&self, range: DateRange) -> JoinHandle<Applied> {
        let seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let source = Arc::clone(&self.source);
        let held = Arc::clone(&self.events);
        let latest_seq = Arc::clone(&self.latest_seq);
        let updates = self.updates.clone();

        tracing::debug!(seq, range = %range, source = source.name(), "Dispatching pageloads fetch");

        tokio::spawn(async move {
            let result = source.fetch(&range).await;
            apply(&held, &latest_seq, &updates, seq, &range, result).await
        })
    }
}

async fn apply(
    held: &RwLock<Vec<Event>>,
    latest_seq: &AtomicU64,
    updates: &watch::Sender<u64>,
    seq: u64,
    range: &DateRange,
    result: Result<Vec<Event>, SourceError>,
) -> Applied {
    let events = match result {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(seq, range = %range, error = %e, "Failed to fetch pageloads");
            return Applied::Failed;
        }
    };

    let mut held = held.write().await;
    let latest = latest_seq.load(Ordering::SeqCst);
    if seq != latest {
        tracing::debug!(seq, latest, range = %range, "Dropping superseded pageloads response");
        return Applied::Stale;
    }

    let count = events.len();
    *held = events;
    drop(held);

    tracing::debug!(seq, events = count, range = %range, "Applied pageloads response");
    updates.send_replace(seq);

    Applied::Replaced { events: count }
}
