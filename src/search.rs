use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::warn;

use crate::recipes::dto::{Pagination, Recipe};
use crate::recipes::service::RecipeSearch;

/// Quiescence window before a typed query is dispatched.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// What the search view currently shows. Replaced wholesale whenever a
/// query resolves; cleared when the input is emptied.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub query: Option<String>,
    pub recipes: Vec<Recipe>,
    pub pagination: Option<Pagination>,
}

/// Turns raw keystrokes into at most one facade call per quiescent
/// period. Each dispatched query gets a generation number; a response is
/// published only while its generation is still the newest, and the
/// superseded in-flight task is aborted outright.
pub struct SearchPipeline {
    input_tx: mpsc::UnboundedSender<String>,
    results_rx: watch::Receiver<SearchResults>,
    dispatcher: JoinHandle<()>,
}

impl SearchPipeline {
    pub fn spawn(service: Arc<dyn RecipeSearch>, page_size: usize) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = watch::channel(SearchResults::default());
        let dispatcher = tokio::spawn(run_dispatcher(
            service,
            page_size,
            input_rx,
            Arc::new(results_tx),
        ));
        Self {
            input_tx,
            results_rx,
            dispatcher,
        }
    }

    /// Feed the current content of the search box. Safe to call on every
    /// edit; the dispatcher owns the debounce timer.
    pub fn input(&self, text: impl Into<String>) {
        let _ = self.input_tx.send(text.into());
    }

    pub fn results(&self) -> watch::Receiver<SearchResults> {
        self.results_rx.clone()
    }
}

impl Drop for SearchPipeline {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

async fn run_dispatcher(
    service: Arc<dyn RecipeSearch>,
    page_size: usize,
    mut input_rx: mpsc::UnboundedReceiver<String>,
    results_tx: Arc<watch::Sender<SearchResults>>,
) {
    let generation = Arc::new(AtomicU64::new(0));
    let mut pending: Option<String> = None;
    let mut last_issued: Option<String> = None;
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            received = input_rx.recv() => {
                match received {
                    // Restarts the debounce sleep below on the next turn.
                    Some(text) => pending = Some(text),
                    None => break,
                }
            }
            _ = sleep(DEBOUNCE), if pending.is_some() => {
                let raw = pending.take().unwrap_or_default();
                let query = raw.trim().to_string();

                if query.is_empty() {
                    // No request for blank input; the visible results are
                    // cleared and any slow response is invalidated.
                    last_issued = None;
                    generation.fetch_add(1, Ordering::SeqCst);
                    if let Some(task) = in_flight.take() {
                        task.abort();
                    }
                    let _ = results_tx.send(SearchResults::default());
                    continue;
                }
                if last_issued.as_deref() == Some(query.as_str()) {
                    continue;
                }
                last_issued = Some(query.clone());

                let my_generation = generation.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(task) = in_flight.take() {
                    task.abort();
                }
                in_flight = Some(tokio::spawn(issue_query(
                    Arc::clone(&service),
                    query,
                    page_size,
                    my_generation,
                    Arc::clone(&generation),
                    Arc::clone(&results_tx),
                )));
            }
        }
    }
}

async fn issue_query(
    service: Arc<dyn RecipeSearch>,
    query: String,
    page_size: usize,
    my_generation: u64,
    generation: Arc<AtomicU64>,
    results_tx: Arc<watch::Sender<SearchResults>>,
) {
    let outcome = service.search_by_name(&query, 0, page_size).await;

    // A newer query has been dispatched while this one was on the wire.
    if generation.load(Ordering::SeqCst) != my_generation {
        return;
    }

    let results = match outcome {
        Ok(envelope) => SearchResults {
            query: Some(query),
            recipes: envelope.data,
            pagination: Some(envelope.pagination),
        },
        Err(e) => {
            warn!(error = %e, %query, "search request failed");
            SearchResults {
                query: Some(query),
                recipes: Vec::new(),
                pagination: None,
            }
        }
    };
    let _ = results_tx.send(results);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::recipes::dto::{Difficulty, Envelope, RecipeFilters};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct FakeSearch {
        calls: Mutex<Vec<String>>,
        // per-query artificial latency, for overtaking scenarios
        delays: Vec<(&'static str, Duration)>,
        fail: bool,
    }

    impl FakeSearch {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                delays: Vec::new(),
                fail: false,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn recipe(name: &str) -> Recipe {
            Recipe {
                id: Uuid::new_v4(),
                name: name.into(),
                user: None,
                instructions: "Combine everything and cook until done.".into(),
                image_url: None,
                prep_time_minutes: 5,
                cook_time_minutes: 20,
                difficulty: Difficulty::Easy,
                estimated_calories: 300,
                average_rating: None,
                created_at: None,
                updated_at: None,
                tags: vec![],
                ingredients: vec![],
                ratings: vec![],
                allergies: vec![],
            }
        }
    }

    #[async_trait]
    impl RecipeSearch for FakeSearch {
        async fn search_by_name(
            &self,
            name: &str,
            page: usize,
            size: usize,
        ) -> Result<Envelope<Vec<Recipe>>, ApiError> {
            self.calls.lock().unwrap().push(name.to_string());
            if let Some((_, delay)) = self.delays.iter().find(|(q, _)| *q == name) {
                sleep(*delay).await;
            }
            if self.fail {
                return Err(ApiError::Decode("boom".into()));
            }
            Ok(Envelope {
                data: vec![Self::recipe(&format!("{name} stew"))],
                pagination: Pagination {
                    page,
                    last_page: 0,
                    page_size: size,
                },
            })
        }

        async fn find_by_filter(
            &self,
            _filters: &RecipeFilters,
            _pagination: &Pagination,
        ) -> Result<Envelope<Vec<Recipe>>, ApiError> {
            unreachable!("search pipeline never hits the filter path")
        }
    }

    async fn settle() {
        // well past the debounce window plus any fake latency
        sleep(Duration::from_secs(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_issue_one_request_for_final_value() {
        let fake = Arc::new(FakeSearch::new());
        let pipeline = SearchPipeline::spawn(fake.clone(), 10);

        pipeline.input("chick");
        sleep(Duration::from_millis(100)).await;
        pipeline.input("chicken");
        settle().await;

        assert_eq!(fake.calls(), vec!["chicken".to_string()]);
        let results = pipeline.results().borrow().clone();
        assert_eq!(results.query.as_deref(), Some("chicken"));
        assert_eq!(results.recipes.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn identical_consecutive_queries_are_deduplicated() {
        let fake = Arc::new(FakeSearch::new());
        let pipeline = SearchPipeline::spawn(fake.clone(), 10);

        pipeline.input("pasta");
        settle().await;
        pipeline.input("pasta");
        settle().await;
        // surrounding whitespace must not defeat the dedup
        pipeline.input("  pasta  ");
        settle().await;

        assert_eq!(fake.calls(), vec!["pasta".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_issues_no_request_and_clears_results() {
        let fake = Arc::new(FakeSearch::new());
        let pipeline = SearchPipeline::spawn(fake.clone(), 10);

        pipeline.input("soup");
        settle().await;
        assert_eq!(pipeline.results().borrow().recipes.len(), 1);

        pipeline.input("   ");
        settle().await;

        assert_eq!(fake.calls(), vec!["soup".to_string()]);
        let results = pipeline.results().borrow().clone();
        assert!(results.query.is_none());
        assert!(results.recipes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_never_overwrites_newer_query() {
        let mut fake = FakeSearch::new();
        fake.delays = vec![("ramen", Duration::from_secs(2))];
        let fake = Arc::new(fake);
        let pipeline = SearchPipeline::spawn(fake.clone(), 10);

        pipeline.input("ramen");
        sleep(Duration::from_millis(400)).await; // dispatched, still in flight
        pipeline.input("udon");
        settle().await;

        assert_eq!(fake.calls(), vec!["ramen".to_string(), "udon".to_string()]);
        let results = pipeline.results().borrow().clone();
        assert_eq!(results.query.as_deref(), Some("udon"));
    }

    #[tokio::test(start_paused = true)]
    async fn facade_error_surfaces_as_empty_results() {
        let mut fake = FakeSearch::new();
        fake.fail = true;
        let fake = Arc::new(fake);
        let pipeline = SearchPipeline::spawn(fake.clone(), 10);

        pipeline.input("burnt toast");
        settle().await;

        let results = pipeline.results().borrow().clone();
        assert_eq!(results.query.as_deref(), Some("burnt toast"));
        assert!(results.recipes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn requeried_after_clear_fires_again() {
        let fake = Arc::new(FakeSearch::new());
        let pipeline = SearchPipeline::spawn(fake.clone(), 10);

        pipeline.input("pho");
        settle().await;
        pipeline.input("");
        settle().await;
        pipeline.input("pho");
        settle().await;

        assert_eq!(fake.calls(), vec!["pho".to_string(), "pho".to_string()]);
    }
}
