use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use super::{is_searchable, search_games, ScoredCandidate, SearchProvider};

/// Updates emitted by [`SearchController`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The debounce elapsed and the provider is being queried.
    Started {
        /// Request the event belongs to.
        generation: u64,
        /// Query being searched.
        query: String,
    },
    /// Ranked results for a request.
    Finished {
        /// Request the event belongs to.
        generation: u64,
        /// Query that was searched.
        query: String,
        /// Ranked candidates, possibly empty.
        results: Vec<ScoredCandidate>,
    },
    /// The query became too short and any shown results should be hidden.
    Cleared {
        /// Request the event belongs to.
        generation: u64,
    },
}

impl SearchEvent {
    /// Request the event belongs to.
    pub fn generation(&self) -> u64 {
        match self {
            SearchEvent::Started { generation, .. }
            | SearchEvent::Finished { generation, .. }
            | SearchEvent::Cleared { generation } => *generation,
        }
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    generation: u64,
    query: String,
}

/// Debounces search queries and makes sure only the latest one is applied.
///
/// Each call to [`SearchController::submit`] starts a new generation and
/// aborts the pending task of the previous one. Events carry their
/// generation; consumers drop events for which [`SearchController::is_current`]
/// is false, since a task may finish right before being superseded.
pub struct SearchController {
    provider: Arc<dyn SearchProvider>,
    debounce: Duration,
    sender: mpsc::UnboundedSender<SearchEvent>,
    state: Arc<Mutex<ControllerState>>,
    pending: Option<JoinHandle<()>>,
}

impl SearchController {
    /// Create a controller publishing events on `sender`.
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        debounce: Duration,
        sender: mpsc::UnboundedSender<SearchEvent>,
    ) -> Self {
        Self {
            provider,
            debounce,
            sender,
            state: Arc::new(Mutex::new(ControllerState::default())),
            pending: None,
        }
    }

    /// Schedule a search for `query`, superseding any earlier request.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self, query: impl Into<String>) -> u64 {
        let query = query.into();
        let generation = self.advance(&query);

        if !is_searchable(&query) {
            let _ = self.sender.send(SearchEvent::Cleared { generation });
            return generation;
        }

        let provider = Arc::clone(&self.provider);
        let sender = self.sender.clone();
        let state = Arc::clone(&self.state);
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if state.lock().generation != generation {
                return;
            }
            let _ = sender.send(SearchEvent::Started {
                generation,
                query: query.clone(),
            });

            let results = search_games(provider.as_ref(), &query).await;
            if state.lock().generation != generation {
                debug!(generation, query = %query, "Discarding superseded search results");
                return;
            }
            let _ = sender.send(SearchEvent::Finished {
                generation,
                query,
                results,
            });
        }));
        generation
    }

    /// Drop any pending request without starting a new one.
    pub fn cancel(&mut self) {
        self.advance("");
    }

    /// Whether an event still belongs to the latest request.
    pub fn is_current(&self, event: &SearchEvent) -> bool {
        self.state.lock().generation == event.generation()
    }

    /// Query of the latest request.
    pub fn current_query(&self) -> String {
        self.state.lock().query.clone()
    }

    fn advance(&mut self, query: &str) -> u64 {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let mut state = self.state.lock();
        state.generation += 1;
        state.query = query.to_string();
        state.generation
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tests::FakeProvider;
    use crate::search::SearchCandidate;

    const DEBOUNCE: Duration = Duration::from_millis(20);

    fn controller(
        provider: Arc<FakeProvider>,
    ) -> (SearchController, mpsc::UnboundedReceiver<SearchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SearchController::new(provider, DEBOUNCE, tx), rx)
    }

    async fn next_finished(
        rx: &mut mpsc::UnboundedReceiver<SearchEvent>,
    ) -> Option<SearchEvent> {
        while let Some(event) = rx.recv().await {
            if matches!(event, SearchEvent::Finished { .. }) {
                return Some(event);
            }
        }
        None
    }

    #[tokio::test]
    async fn rapid_typing_triggers_a_single_search() {
        let provider = Arc::new(FakeProvider::ok(vec![SearchCandidate::named("Zelda")]));
        let (mut search, mut rx) = controller(Arc::clone(&provider));

        search.submit("ze");
        search.submit("zel");
        let last = search.submit("zelda");

        let event = tokio::time::timeout(Duration::from_secs(2), next_finished(&mut rx))
            .await
            .expect("search did not finish")
            .expect("channel closed");
        assert_eq!(event.generation(), last);
        assert!(search.is_current(&event));
        match event {
            SearchEvent::Finished { query, results, .. } => {
                assert_eq!(query, "zelda");
                assert_eq!(results.len(), 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn short_query_clears_without_network() {
        let provider = Arc::new(FakeProvider::ok(vec![SearchCandidate::named("Zelda")]));
        let (mut search, mut rx) = controller(Arc::clone(&provider));

        search.submit("zelda");
        let generation = search.submit("z");

        let event = rx.recv().await.expect("channel closed");
        assert_eq!(event, SearchEvent::Cleared { generation });

        tokio::time::sleep(DEBOUNCE * 4).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn search_in_flight_is_superseded_by_a_newer_query() {
        let provider = Arc::new(FakeProvider::slow(
            vec![SearchCandidate::named("Hades"), SearchCandidate::named("Celeste")],
            DEBOUNCE * 5,
        ));
        let (mut search, mut rx) = controller(Arc::clone(&provider));

        let first = search.submit("hades");
        tokio::time::sleep(DEBOUNCE * 2).await;
        assert_eq!(provider.calls(), 1);
        let second = search.submit("celeste");

        let mut seen = Vec::new();
        let finished = tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(event) = rx.recv().await {
                let done = matches!(event, SearchEvent::Finished { .. });
                seen.push((event.generation(), search.is_current(&event)));
                if done {
                    return Some(event);
                }
            }
            None
        })
        .await
        .expect("search did not finish")
        .expect("channel closed");

        assert_eq!(finished.generation(), second);
        assert!(search.is_current(&finished));
        assert!(seen
            .iter()
            .filter(|(generation, _)| *generation == first)
            .all(|(_, current)| !current));

        tokio::time::sleep(DEBOUNCE * 8).await;
        while let Ok(event) = rx.try_recv() {
            assert!(
                !matches!(event, SearchEvent::Finished { generation, .. } if generation == first),
                "superseded search delivered results"
            );
        }
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn stale_events_are_not_current() {
        let provider = Arc::new(FakeProvider::ok(Vec::new()));
        let (mut search, _rx) = controller(provider);

        let first = search.submit("hades");
        let stale = SearchEvent::Finished {
            generation: first,
            query: "hades".to_string(),
            results: Vec::new(),
        };
        search.submit("hades ii");
        assert!(!search.is_current(&stale));
        assert_eq!(search.current_query(), "hades ii");

        search.cancel();
        assert_eq!(search.current_query(), "");
    }
}
