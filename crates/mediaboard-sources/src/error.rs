use thiserror::Error;

/// Failures at the metadata-provider and storage boundaries
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure, non-2xx response or malformed JSON from the metadata provider
    #[error("fetch failed for {endpoint}{}: {message}", status_suffix(.status))]
    Fetch {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// Catalog read failure
    #[error("failed to load {table}: {message}")]
    Load { table: String, message: String },

    /// Catalog write failure
    #[error("failed to write {table}: {message}")]
    Persist { table: String, message: String },

    /// Missing or unusable credentials/endpoints
    #[error("configuration error: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().trim_start_matches('/').to_string())
            .unwrap_or_else(|| "unknown".to_string());
        SourceError::Fetch {
            endpoint,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl SourceError {
    pub fn fetch(endpoint: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        SourceError::Fetch {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    pub fn load(table: impl Into<String>, message: impl Into<String>) -> Self {
        SourceError::Load {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn persist(table: impl Into<String>, message: impl Into<String>) -> Self {
        SourceError::Persist {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, SourceError::Fetch { .. })
    }

    pub fn is_persist(&self) -> bool {
        matches!(self, SourceError::Persist { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_includes_status() {
        let err = SourceError::fetch("tv/1399", Some(404), "not found");
        assert_eq!(err.to_string(), "fetch failed for tv/1399 (HTTP 404): not found");
        assert!(err.is_fetch());
    }

    #[test]
    fn test_fetch_error_display_without_status() {
        let err = SourceError::fetch("movie/1", None, "timed out");
        assert_eq!(err.to_string(), "fetch failed for movie/1: timed out");
    }

    #[test]
    fn test_persist_error() {
        let err = SourceError::persist("tv_shows", "HTTP 500");
        assert!(err.is_persist());
        assert_eq!(err.to_string(), "failed to write tv_shows: HTTP 500");
    }
}
