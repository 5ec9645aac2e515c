use std::{fs, path::PathBuf};

use client_core::DEFAULT_API_BASE_URL;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub entry_sound: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            entry_sound: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    entry_sound: Option<PathBuf>,
}

/// Defaults, then `rickdex.toml` in the working directory, then environment
/// variables. Later layers win.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("rickdex.toml") {
        if let Ok(file_cfg) = toml::from_str::<FileSettings>(&raw) {
            if let Some(v) = file_cfg.api_base_url {
                settings.api_base_url = v;
            }
            if let Some(v) = file_cfg.entry_sound {
                settings.entry_sound = Some(v);
            }
        }
    }

    if let Ok(v) = std::env::var("RICKDEX_API_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("RICKDEX_ENTRY_SOUND") {
        settings.entry_sound = Some(PathBuf::from(v));
    }

    settings.api_base_url = normalize_api_base_url(&settings.api_base_url);
    settings
}

pub fn normalize_api_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');

    if trimmed.is_empty() {
        return DEFAULT_API_BASE_URL.to_string();
    }

    match url::Url::parse(trimmed) {
        Ok(_) => trimmed.to_string(),
        Err(err) => {
            warn!("ignoring invalid api base url '{trimmed}': {err}");
            DEFAULT_API_BASE_URL.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(
            normalize_api_base_url("http://127.0.0.1:9000/api/"),
            "http://127.0.0.1:9000/api"
        );
    }

    #[test]
    fn falls_back_on_unparseable_url() {
        assert_eq!(normalize_api_base_url("not a url"), DEFAULT_API_BASE_URL);
        assert_eq!(normalize_api_base_url("   "), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn keeps_valid_url_untouched() {
        assert_eq!(
            normalize_api_base_url("https://rickandmortyapi.com/api"),
            "https://rickandmortyapi.com/api"
        );
    }
}
