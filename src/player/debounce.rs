// Query debouncer: collapses a burst of keystrokes into one search.
//
// Each accepted submit aborts the previously scheduled search task and
// schedules a new one after the quiescence window. Only one task handle is
// ever alive. Results are not returned to the caller; they arrive later as
// `SearchEvent::Completed` on the channel the UI loop drains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::youtube::search::{SearchProvider, SearchResult};

#[derive(Debug)]
pub enum SearchEvent {
    /// Sent synchronously from `submit`, before the window elapses.
    Loading { query: String },
    Completed {
        query: String,
        outcome: Result<Vec<SearchResult>, SearchError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Scheduled,
    Ignored(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyQuery,
    InFlight,
}

pub struct QueryDebouncer {
    provider: Arc<dyn SearchProvider>,
    delay: Duration,
    events: mpsc::UnboundedSender<SearchEvent>,
    pending: Option<JoinHandle<()>>,
    in_flight: Arc<AtomicBool>,
}

// Clears the in-flight flag however the task ends, abort included.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        InFlightGuard(Arc::clone(flag))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl QueryDebouncer {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        delay: Duration,
        events: mpsc::UnboundedSender<SearchEvent>,
    ) -> Self {
        QueryDebouncer {
            provider,
            delay,
            events,
            pending: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Schedules a search for `query` after the quiescence window,
    /// superseding any search that has not fired yet.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, query: &str) -> Submission {
        let query = query.trim();
        if query.is_empty() {
            return Submission::Ignored(SkipReason::EmptyQuery);
        }
        if self.is_in_flight() {
            debug!(query, "search in flight, dropping submit");
            return Submission::Ignored(SkipReason::InFlight);
        }

        self.cancel();

        let query = query.to_string();
        if self.events.send(SearchEvent::Loading { query: query.clone() }).is_err() {
            warn!("search event receiver dropped");
        }

        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let guard = InFlightGuard::acquire(&in_flight);
            debug!(query = %query, provider = provider.name(), "dispatching search");
            let outcome = provider.search(&query).await;
            drop(guard);

            if events.send(SearchEvent::Completed { query, outcome }).is_err() {
                warn!("search event receiver dropped, discarding results");
            }
        }));

        Submission::Scheduled
    }

    /// Aborts the scheduled (or running) search, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// True while a submitted query is waiting out the window or running.
    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for QueryDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    const WINDOW: Duration = Duration::from_millis(200);

    #[derive(Default)]
    struct RecordingProvider {
        queries: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchProvider for RecordingProvider {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(vec![SearchResult::new(query, query, "")])
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    // Blocks every search until a permit is added.
    struct GatedProvider {
        gate: Semaphore,
    }

    #[async_trait]
    impl SearchProvider for GatedProvider {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
            let _permit = self.gate.acquire().await.unwrap();
            Ok(vec![SearchResult::new(query, query, "")])
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    async fn next_completed(rx: &mut mpsc::UnboundedReceiver<SearchEvent>) -> String {
        loop {
            match rx.recv().await.expect("channel closed") {
                SearchEvent::Completed { query, .. } => return query,
                SearchEvent::Loading { .. } => continue,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_latest_query_in_window_is_dispatched() {
        let provider = Arc::new(RecordingProvider::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = QueryDebouncer::new(provider.clone(), WINDOW, tx);

        assert_eq!(debouncer.submit("a"), Submission::Scheduled);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(debouncer.submit("ab"), Submission::Scheduled);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(provider.queries(), vec!["ab".to_string()]);
        assert_eq!(next_completed(&mut rx).await, "ab");
    }

    #[tokio::test(start_paused = true)]
    async fn loading_is_signalled_before_the_window() {
        let provider = Arc::new(RecordingProvider::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = QueryDebouncer::new(provider.clone(), WINDOW, tx);

        debouncer.submit("  lofi beats ");
        match rx.try_recv() {
            Ok(SearchEvent::Loading { query }) => assert_eq!(query, "lofi beats"),
            other => panic!("expected Loading, got {:?}", other),
        }
        assert!(debouncer.has_pending());
        assert!(provider.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_is_ignored() {
        let provider = Arc::new(RecordingProvider::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = QueryDebouncer::new(provider.clone(), WINDOW, tx);

        assert_eq!(
            debouncer.submit("   "),
            Submission::Ignored(SkipReason::EmptyQuery)
        );
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_while_in_flight_is_ignored() {
        let provider = Arc::new(GatedProvider {
            gate: Semaphore::new(0),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = QueryDebouncer::new(provider.clone(), WINDOW, tx);

        debouncer.submit("first");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(debouncer.is_in_flight());
        assert_eq!(
            debouncer.submit("second"),
            Submission::Ignored(SkipReason::InFlight)
        );

        provider.gate.add_permits(1);
        assert_eq!(next_completed(&mut rx).await, "first");
        assert!(!debouncer.is_in_flight());
        assert_eq!(debouncer.submit("third"), Submission::Scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_scheduled_search() {
        let provider = Arc::new(RecordingProvider::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut debouncer = QueryDebouncer::new(provider.clone(), WINDOW, tx);

        debouncer.submit("x");
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(provider.queries().is_empty());
        assert!(!debouncer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_search_releases_in_flight() {
        let provider = Arc::new(GatedProvider {
            gate: Semaphore::new(0),
        });
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut debouncer = QueryDebouncer::new(provider, WINDOW, tx);

        debouncer.submit("stuck");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(debouncer.is_in_flight());

        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!debouncer.is_in_flight());
    }
    #[tokio::test(start_paused = true)]
    async fn completion_with_receiver_gone_still_finishes() {
        let provider = Arc::new(RecordingProvider::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debouncer = QueryDebouncer::new(provider.clone(), WINDOW, tx);

        debouncer.submit("orphan");
        drop(rx);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(provider.queries(), vec!["orphan".to_string()]);
        assert!(!debouncer.is_in_flight());
        assert!(!debouncer.has_pending());
    }
}
