use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{CharacterDetail, CharacterId},
    protocol::{CharacterListResponse, CharacterPage},
};

use crate::error::DataSourceError;

pub const DEFAULT_API_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// Contract consumed by the controllers. Request shaping and response
/// decoding live behind this seam; the controllers only see pages,
/// details, and [`DataSourceError`].
#[async_trait]
pub trait CharacterDataSource: Send + Sync {
    async fn list_characters(
        &self,
        page: u32,
        name_filter: &str,
    ) -> Result<CharacterPage, DataSourceError>;

    async fn get_character(&self, id: CharacterId) -> Result<CharacterDetail, DataSourceError>;
}

/// Data source backed by the public REST API.
pub struct HttpCharacterSource {
    http: Client,
    base_url: String,
}

impl HttpCharacterSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for HttpCharacterSource {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

#[async_trait]
impl CharacterDataSource for HttpCharacterSource {
    async fn list_characters(
        &self,
        page: u32,
        name_filter: &str,
    ) -> Result<CharacterPage, DataSourceError> {
        let mut request = self
            .http
            .get(format!("{}/character", self.base_url))
            .query(&[("page", page.to_string())]);
        // The upstream API treats `name=` differently from no filter.
        if !name_filter.is_empty() {
            request = request.query(&[("name", name_filter)]);
        }

        let response: CharacterListResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.into())
    }

    async fn get_character(&self, id: CharacterId) -> Result<CharacterDetail, DataSourceError> {
        let detail: CharacterDetail = self
            .http
            .get(format!("{}/character/{}", self.base_url, id.0))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(detail)
    }
}

/// Placeholder collaborator for surfaces constructed before a real data
/// source is available. Every call fails.
pub struct MissingCharacterSource;

#[async_trait]
impl CharacterDataSource for MissingCharacterSource {
    async fn list_characters(
        &self,
        page: u32,
        _name_filter: &str,
    ) -> Result<CharacterPage, DataSourceError> {
        Err(DataSourceError::new(format!(
            "character data source unavailable (page {page})"
        )))
    }

    async fn get_character(&self, id: CharacterId) -> Result<CharacterDetail, DataSourceError> {
        Err(DataSourceError::new(format!(
            "character data source unavailable (character {})",
            id.0
        )))
    }
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
