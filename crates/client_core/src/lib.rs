use std::sync::Arc;

use shared::domain::{CharacterDetail, CharacterId, CharacterSummary};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub mod error;
pub mod source;

pub use error::DataSourceError;
pub use source::{
    CharacterDataSource, HttpCharacterSource, MissingCharacterSource, DEFAULT_API_BASE_URL,
};

/// Session state of one list surface. Owned exclusively by a
/// [`ListController`]; rendering layers receive cloned snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    /// Server response order, accumulated across pages. Duplicate ids
    /// across pages are kept as-is.
    pub items: Vec<CharacterSummary>,
    /// Current search text; empty means unfiltered.
    pub query: String,
    /// Last successfully fetched page number.
    pub page: u32,
    /// True until the data source reports no further page or a fetch fails.
    pub has_more: bool,
    /// True strictly while one fetch is outstanding.
    pub loading: bool,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            query: String::new(),
            page: 1,
            has_more: true,
            loading: false,
        }
    }
}

/// Owns the paginated, searchable character collection and the sole
/// concurrency invariant of the system: at most one outstanding fetch.
pub struct ListController {
    source: Arc<dyn CharacterDataSource>,
    state: Mutex<ListState>,
}

impl ListController {
    pub fn new(source: Arc<dyn CharacterDataSource>) -> Self {
        Self {
            source,
            state: Mutex::new(ListState::default()),
        }
    }

    /// Fetches one page and merges it into the session state. A call made
    /// while another fetch is in flight is a no-op. Page 1 replaces the
    /// items; later pages append. A failure stops pagination
    /// (`has_more = false`) and leaves the items untouched; it is logged,
    /// never surfaced.
    pub async fn fetch_page(&self, page: u32, query: &str) {
        {
            let mut state = self.state.lock().await;
            if state.loading {
                debug!(page, query, "list fetch skipped: fetch already in flight");
                return;
            }
            state.loading = true;
        }

        let result = self.source.list_characters(page, query).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(fetched) => {
                debug!(
                    page,
                    query,
                    results = fetched.results.len(),
                    has_next = fetched.has_next,
                    "list page fetched"
                );
                if page == 1 {
                    state.items = fetched.results;
                } else {
                    state.items.extend(fetched.results);
                }
                state.has_more = fetched.has_next;
                state.page = page;
                state.query = query.to_string();
            }
            Err(err) => {
                // Terminal for pagination; the user recovers with a new search.
                warn!(page, query, "list fetch failed: {err}");
                state.has_more = false;
            }
        }
        state.loading = false;
    }

    /// Restarts from page 1 with the given filter, replacing the current
    /// items even when the query text is unchanged.
    pub async fn search(&self, query: &str) {
        self.fetch_page(1, query).await;
    }

    /// Fetches the next page if one exists and nothing is in flight.
    /// Safe to invoke repeatedly as the scroll position nears the end.
    pub async fn load_more(&self) {
        let (page, query) = {
            let state = self.state.lock().await;
            if !state.has_more || state.loading {
                return;
            }
            (state.page + 1, state.query.clone())
        };
        self.fetch_page(page, &query).await;
    }

    pub async fn state(&self) -> ListState {
        self.state.lock().await.clone()
    }
}

/// Session state of one detail surface, created per navigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub character: Option<CharacterDetail>,
    pub loading: bool,
    /// Set when the last load errored. The rendering surface shows the
    /// same not-found view for a failure and a true 404.
    pub failed: bool,
}

/// Fetches a single character per navigation. No in-flight guard and no
/// cancellation: overlapping loads race and the last writer wins.
pub struct DetailFetcher {
    source: Arc<dyn CharacterDataSource>,
    state: Mutex<DetailState>,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn CharacterDataSource>) -> Self {
        Self {
            source,
            state: Mutex::new(DetailState::default()),
        }
    }

    pub async fn load(&self, id: CharacterId) {
        {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.failed = false;
        }

        let result = self.source.get_character(id).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(character) => {
                debug!(id = id.0, "character detail fetched");
                state.character = Some(character);
            }
            Err(err) => {
                warn!(id = id.0, "character detail fetch failed: {err}");
                state.failed = true;
            }
        }
        state.loading = false;
    }

    pub async fn state(&self) -> DetailState {
        self.state.lock().await.clone()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
