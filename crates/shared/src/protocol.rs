use serde::{Deserialize, Serialize};

use crate::domain::CharacterSummary;

/// Pagination block of the upstream list response. Only the presence of
/// `next` matters to the client; the URL itself is never followed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: u64,
    pub pages: u64,
    pub next: Option<String>,
    pub prev: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterListResponse {
    pub info: PageInfo,
    pub results: Vec<CharacterSummary>,
}

/// Error body the upstream API attaches to non-success statuses,
/// e.g. `{"error": "There is nothing here"}` for a filter with no matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Abstracted page handed to the list controller: the fetched characters
/// plus whether a further page exists.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterPage {
    pub results: Vec<CharacterSummary>,
    pub has_next: bool,
}

impl From<CharacterListResponse> for CharacterPage {
    fn from(response: CharacterListResponse) -> Self {
        Self {
            has_next: response.info.next.is_some(),
            results: response.results,
        }
    }
}
