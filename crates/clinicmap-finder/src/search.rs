//! Debounced clinic search.
//!
//! [`SearchCoordinator`] runs as a tokio task that owns the [`SearchState`].
//! Callers send keystrokes and commands through a cloneable [`SearchHandle`]
//! and observe state through a `watch` channel.
//!
//! Every search is tagged with a sequence number. Only the completion of the
//! most recently issued search is applied; anything older is dropped, so a
//! slow response can never overwrite a newer one.

use std::sync::Arc;
use std::time::Duration;

use clinicmap_api::{ApiError, ClinicSearch};
use clinicmap_core::Clinic;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

/// Quiet period after the last keystroke before an automatic search fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// User-facing search failures. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Please enter a search term.")]
    EmptyQuery,

    #[error("No clinics found matching your search. Try different keywords.")]
    NoResults,

    #[error("Received an unexpected response from the server. Please try again.")]
    InvalidResponse,

    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    #[error("The clinic search service is having problems. Please try again later.")]
    ServerError,

    #[error("Clinic search is currently unavailable.")]
    ServiceUnavailable,

    #[error("You appear to be offline. Check your internet connection and try again.")]
    Offline,

    #[error("Failed to search clinics. Please try again.")]
    Failed,
}

impl SearchError {
    /// Buckets a transport/API failure into the message the user sees.
    #[must_use]
    pub fn classify(err: &ApiError) -> Self {
        if err.is_connectivity() {
            return SearchError::Offline;
        }
        match err.status() {
            Some(429) => return SearchError::RateLimited,
            Some(s) if s >= 500 => return SearchError::ServerError,
            Some(404) => return SearchError::ServiceUnavailable,
            _ => {}
        }
        match err {
            ApiError::UnexpectedShape { .. } | ApiError::Deserialize { .. } => {
                SearchError::InvalidResponse
            }
            _ => SearchError::Failed,
        }
    }
}

/// Snapshot of the search UI state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Text as typed.
    pub raw_keywords: String,
    /// Last value that survived the debounce window (or was searched manually).
    pub debounced_keywords: String,
    pub clinics: Vec<Clinic>,
    pub loading: bool,
    pub error: Option<SearchError>,
    /// Keywords of the last search whose response was applied.
    pub last_searched: Option<String>,
}

impl SearchState {
    #[must_use]
    pub fn has_results(&self) -> bool {
        !self.clinics.is_empty()
    }

    /// `true` once a search has completed and matched nothing. A failed
    /// search is an error, not an empty result.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.loading
            && self.last_searched.is_some()
            && self.clinics.is_empty()
            && matches!(self.error, None | Some(SearchError::NoResults))
    }
}

#[derive(Debug)]
enum Command {
    SetKeywords(String),
    Search,
    ClearResults,
    Reset,
}

struct Completion {
    seq: u64,
    keywords: String,
    result: Result<Option<Vec<Clinic>>, ApiError>,
}

/// Cloneable front end to a running [`SearchCoordinator`].
///
/// Commands are queued and applied in order. Once every handle is dropped
/// the coordinator task exits.
#[derive(Clone)]
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SearchState>,
}

impl SearchHandle {
    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("search coordinator has stopped; command dropped");
        }
    }

    /// Records a keystroke and restarts the debounce timer.
    pub fn set_search_keywords(&self, keywords: impl Into<String>) {
        self.send(Command::SetKeywords(keywords.into()));
    }

    /// Searches the current keywords immediately, skipping the debounce.
    pub fn handle_search(&self) {
        self.send(Command::Search);
    }

    /// Enter triggers an immediate search; other keys are ignored.
    pub fn handle_key_press(&self, key: &str) {
        if key == "Enter" {
            self.handle_search();
        }
    }

    /// Drops results and error, keeping the typed keywords.
    pub fn clear_results(&self) {
        self.send(Command::ClearResults);
    }

    /// Returns to the initial empty state.
    pub fn reset_search(&self) {
        self.send(Command::Reset);
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    /// Waits until the published state satisfies `predicate`.
    ///
    /// Returns `None` if the coordinator stops first.
    pub async fn wait_for<F>(&self, predicate: F) -> Option<SearchState>
    where
        F: FnMut(&SearchState) -> bool,
    {
        let mut rx = self.state.clone();
        rx.wait_for(predicate).await.ok().map(|state| state.clone())
    }
}

/// Owns the search state and drives debounce, dispatch and completion.
pub struct SearchCoordinator<C> {
    client: Arc<C>,
    debounce: Duration,
    state: SearchState,
    publisher: watch::Sender<SearchState>,
    deadline: Option<Instant>,
    issued: u64,
    completions: mpsc::UnboundedSender<Completion>,
}

impl<C> SearchCoordinator<C>
where
    C: ClinicSearch + 'static,
{
    /// Spawns the coordinator on the current tokio runtime.
    #[must_use]
    pub fn spawn(client: Arc<C>, debounce: Duration) -> SearchHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (publisher, state_rx) = watch::channel(SearchState::default());

        let coordinator = Self {
            client,
            debounce,
            state: SearchState::default(),
            publisher,
            deadline: None,
            issued: 0,
            completions: completion_tx,
        };
        tokio::spawn(coordinator.run(command_rx, completion_rx));

        SearchHandle {
            commands: command_tx,
            state: state_rx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                () = sleep_until_deadline(deadline), if deadline.is_some() => {
                    self.fire_debounce();
                }
                Some(completion) = completions.recv() => self.finish(completion),
            }
        }
        tracing::debug!("search coordinator stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetKeywords(keywords) => {
                self.state.raw_keywords = keywords;
                self.deadline = Some(Instant::now() + self.debounce);
                self.publish();
            }
            Command::Search => self.search_now(),
            Command::ClearResults => {
                self.invalidate_in_flight();
                self.state.clinics.clear();
                self.state.error = None;
                self.state.loading = false;
                self.state.last_searched = None;
                self.publish();
            }
            Command::Reset => {
                self.invalidate_in_flight();
                self.deadline = None;
                self.state = SearchState::default();
                self.publish();
            }
        }
    }

    fn search_now(&mut self) {
        self.deadline = None;
        self.state.debounced_keywords.clone_from(&self.state.raw_keywords);
        let keywords = self.state.raw_keywords.trim().to_string();
        if keywords.is_empty() {
            self.invalidate_in_flight();
            self.state.clinics.clear();
            self.state.loading = false;
            self.state.error = Some(SearchError::EmptyQuery);
            self.publish();
            return;
        }
        self.issue(keywords);
    }

    fn fire_debounce(&mut self) {
        self.deadline = None;
        if self.state.debounced_keywords == self.state.raw_keywords {
            return;
        }
        self.state.debounced_keywords.clone_from(&self.state.raw_keywords);
        let keywords = self.state.debounced_keywords.trim().to_string();
        tracing::debug!(keywords, "debounce window elapsed");

        if keywords.is_empty() {
            self.invalidate_in_flight();
            self.state.clinics.clear();
            self.state.error = None;
            self.state.loading = false;
            self.state.last_searched = None;
            self.publish();
            return;
        }
        self.issue(keywords);
    }

    fn issue(&mut self, keywords: String) {
        self.issued += 1;
        let seq = self.issued;
        self.state.loading = true;
        self.state.error = None;
        self.publish();

        tracing::debug!(seq, keywords, "dispatching clinic search");
        let client = Arc::clone(&self.client);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = client.search_clinics(&keywords).await;
            // The coordinator may already be gone; nothing to report to.
            let _ = completions.send(Completion {
                seq,
                keywords,
                result,
            });
        });
    }

    /// Makes every outstanding request stale.
    fn invalidate_in_flight(&mut self) {
        self.issued += 1;
    }

    fn finish(&mut self, completion: Completion) {
        if completion.seq != self.issued {
            tracing::debug!(
                seq = completion.seq,
                latest = self.issued,
                keywords = completion.keywords,
                "discarding stale search response"
            );
            return;
        }

        self.state.loading = false;
        match completion.result {
            Ok(Some(clinics)) if !clinics.is_empty() => {
                tracing::info!(
                    keywords = completion.keywords,
                    count = clinics.len(),
                    "clinic search completed"
                );
                self.state.clinics = clinics;
                self.state.error = None;
            }
            Ok(_) => {
                tracing::info!(keywords = completion.keywords, "clinic search found nothing");
                self.state.clinics.clear();
                self.state.error = Some(SearchError::NoResults);
            }
            Err(err) => {
                let classified = SearchError::classify(&err);
                tracing::warn!(
                    keywords = completion.keywords,
                    error = %err,
                    classified = ?classified,
                    "clinic search failed"
                );
                self.state.clinics.clear();
                self.state.error = Some(classified);
            }
        }
        self.state.last_searched = Some(completion.keywords);
        self.publish();
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    if let Some(deadline) = deadline {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
