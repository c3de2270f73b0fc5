//! HTTP client for a Prismic-style REST API

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::{ContentSource, Predicate, Query};
use crate::config::SiteConfig;
use crate::content::schema::ApiInfo;
use crate::content::{ApiDocument, SearchResponse};
use crate::error::ContentError;

/// Content API handle built from the site configuration
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl PrismicClient {
    pub fn new(config: &SiteConfig) -> Result<Self, ContentError> {
        let endpoint = Url::parse(config.api_endpoint.trim_end_matches('/'))
            .map_err(|e| ContentError::InvalidEndpoint(format!("{}: {}", config.api_endpoint, e)))?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("headless-blog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/documents/search", self.endpoint.as_str().trim_end_matches('/'))
    }

    /// Resolve the ref of the currently published content
    ///
    /// Looked up on every query so newly published documents are visible to
    /// a long-running server.
    async fn master_ref(&self) -> Result<String, ContentError> {
        let mut request = self.http.get(self.endpoint.clone());
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token)]);
        }
        let info: ApiInfo = send_json(request, self.endpoint.as_str()).await?;
        info.master_ref()
            .map(str::to_string)
            .ok_or(ContentError::MissingMasterRef)
    }

    /// Accept only cursors that point back at the configured API
    pub fn validate_cursor(&self, cursor: &str) -> Result<Url, ContentError> {
        let url = Url::parse(cursor).map_err(|_| ContentError::InvalidCursor(cursor.to_string()))?;

        let same_origin = url.scheme() == self.endpoint.scheme()
            && url.host_str() == self.endpoint.host_str()
            && url.port_or_known_default() == self.endpoint.port_or_known_default();
        if !same_origin {
            return Err(ContentError::InvalidCursor(cursor.to_string()));
        }

        Ok(url)
    }
}

impl ContentSource for PrismicClient {
    async fn query(&self, query: &Query) -> Result<SearchResponse, ContentError> {
        let master_ref = self.master_ref().await?;
        let url = self.search_url();

        let mut params: Vec<(&str, String)> = vec![
            ("ref", master_ref),
            ("q", query.q()),
            ("pageSize", query.page_size_param().to_string()),
        ];
        if let Some(fetch) = query.fetch_param() {
            params.push(("fetch", fetch));
        }
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        tracing::debug!("Querying {} with q={}", url, query.q());
        send_json(self.http.get(&url).query(&params), &url).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, ContentError> {
        let mut url = self.validate_cursor(cursor)?;
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }

        tracing::debug!("Fetching page {}", cursor);
        send_json(self.http.get(url), cursor).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<ApiDocument, ContentError> {
        let query = Query::new(Predicate::at("document.type", document_type))
            .and(Predicate::at(&format!("my.{}.uid", document_type), uid))
            .page_size(1);
        let response = self.query(&query).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::NotFound {
                uid: uid.to_string(),
            })
    }
}

/// Send a request and decode its JSON body
async fn send_json<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> Result<T, ContentError> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ContentError::Status {
            status,
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
