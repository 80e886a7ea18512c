use crate::error::SourceError;
use crate::tmdb::api::{self, TmdbMovieDetail, TmdbSearchResponse, TmdbSeasonDetail, TmdbShowDetail};
use crate::traits::MetadataProvider;
use async_trait::async_trait;
use mediaboard_config::TmdbConfig;
use mediaboard_models::{MediaKind, ProviderMovie, ProviderSeason, ProviderShow, SearchResult};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// How requests reach the metadata API
#[derive(Debug, Clone)]
enum Access {
    /// Call the API directly, passing the key as a query parameter
    Direct { api_key: String },
    /// Call a relay that injects the key server-side; the API path travels as `endpoint`
    Proxy { endpoint: String, token: Option<String> },
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    image_base_url: String,
    access: Access,
}

impl TmdbClient {
    /// Build a client from config. A direct API key wins over a proxy endpoint.
    pub fn new(config: &TmdbConfig) -> Result<Self, SourceError> {
        let access = if let Some(api_key) = config.usable_api_key() {
            Access::Direct {
                api_key: api_key.to_string(),
            }
        } else if let Some(endpoint) = config.usable_proxy_endpoint() {
            Access::Proxy {
                endpoint: endpoint.to_string(),
                token: config.proxy_token.clone().filter(|t| !t.trim().is_empty()),
            }
        } else {
            return Err(SourceError::Config(
                "TMDB requires either an API key or a proxy endpoint".to_string(),
            ));
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.clone(),
            access,
        })
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self.access, Access::Proxy { .. })
    }

    fn request(&self, path: &str, params: &[(&str, String)]) -> RequestBuilder {
        match &self.access {
            Access::Direct { api_key } => self
                .client
                .get(format!("{}/{}", self.base_url, path))
                .query(&[("api_key", api_key.as_str())])
                .query(params),
            Access::Proxy { endpoint, token } => {
                let request = self
                    .client
                    .get(endpoint.as_str())
                    .query(&[("endpoint", path)])
                    .query(params);
                match token {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T, SourceError> {
        debug!(endpoint = %path, proxied = self.is_proxied(), "TMDB request");

        let response = self
            .request(path, params)
            .send()
            .await
            .map_err(|e| SourceError::fetch(path, e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::fetch(path, Some(status.as_u16()), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::fetch(path, Some(status.as_u16()), e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| SourceError::fetch(path, Some(status.as_u16()), format!("invalid response body: {}", e)))
    }
}

fn detail_params() -> [(&'static str, String); 1] {
    [("append_to_response", api::APPEND_WATCH_PROVIDERS.to_string())]
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    fn provider_name(&self) -> &str {
        "tmdb"
    }

    async fn fetch_show_detail(&self, tmdb_id: u32) -> Result<ProviderShow, SourceError> {
        let path = format!("tv/{}", tmdb_id);
        let detail: TmdbShowDetail = self.get_json(&path, &detail_params()).await?;
        detail
            .into_show()
            .map_err(|message| SourceError::fetch(path, None, message))
    }

    async fn fetch_movie_detail(&self, tmdb_id: u32) -> Result<ProviderMovie, SourceError> {
        let path = format!("movie/{}", tmdb_id);
        let detail: TmdbMovieDetail = self.get_json(&path, &detail_params()).await?;
        detail
            .into_movie()
            .map_err(|message| SourceError::fetch(path, None, message))
    }

    async fn fetch_season_detail(&self, tmdb_id: u32, season_number: u32) -> Result<ProviderSeason, SourceError> {
        let path = format!("tv/{}/season/{}", tmdb_id, season_number);
        let detail: TmdbSeasonDetail = self.get_json(&path, &[]).await?;
        Ok(detail.into_season(season_number))
    }

    async fn search(&self, kind: MediaKind, query: &str, year: Option<i32>) -> Result<Vec<SearchResult>, SourceError> {
        let path = format!("search/{}", kind.provider_path());
        let mut params = vec![("query", query.to_string())];
        if let Some(year) = year {
            params.push((api::year_param(kind), year.to_string()));
        }

        let response: TmdbSearchResponse = self.get_json(&path, &params).await?;
        Ok(response.into_results(kind, &self.image_base_url))
    }
}
