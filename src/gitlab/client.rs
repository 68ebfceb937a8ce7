//! REST client for the GitLab v4 API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::config::GitlabConfig;
use crate::constants::{APP_NAME, GITLAB_TOKEN_HEADER, VERSION};
use crate::models::diff::DiffFile;

use super::types::{Discussion, DiscussionRequest, MrVersion};
use super::{DiffSource, DiscussionPoster, GitlabError, MrRef};

/// Page size for paginated list endpoints (GitLab's maximum).
const PER_PAGE: u32 = 100;

/// Safety stop for runaway pagination.
const MAX_PAGES: u32 = 100;

/// GitLab API client authenticated with a private token.
pub struct GitlabClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl std::fmt::Debug for GitlabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabClient")
            .field("base", &self.base.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GitlabClient {
    /// Build a client from config. Fails without a token.
    pub fn from_config(config: &GitlabConfig) -> Result<Self, GitlabError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(GitlabError::MissingToken)?;
        Self::new(&config.url, token, Duration::from_secs(config.timeout_secs))
    }

    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, GitlabError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| GitlabError::InvalidApiUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(GitlabError::InvalidApiUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("{APP_NAME}/{VERSION}"))
            .build()?;
        Ok(Self { http, base, token })
    }

    /// `…/projects/<encoded project>/merge_requests/<iid>/<tail>`.
    ///
    /// The project goes in as a single path segment so a full path such as
    /// `group/project` is sent as `group%2Fproject`.
    fn mr_url(&self, mr: &MrRef, tail: &str) -> Result<Url, GitlabError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GitlabError::InvalidApiUrl(self.base.to_string()))?;
            segments
                .pop_if_empty()
                .push("projects")
                .push(&mr.project)
                .push("merge_requests")
                .push(&mr.iid.to_string())
                .push(tail);
        }
        Ok(url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(GITLAB_TOKEN_HEADER, &self.token)
            .header("Accept", "application/json")
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, endpoint: &str) -> Result<T, GitlabError> {
        tracing::debug!(%url, "GET");
        let response = self.authed(self.http.get(url)).send().await?;
        let response = check(response, endpoint).await?;
        Ok(response.json().await?)
    }
}

/// Turn a non-success response into [`GitlabError::Api`] with its body.
async fn check(response: Response, endpoint: &str) -> Result<Response, GitlabError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(GitlabError::Api {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}

#[async_trait]
impl DiffSource for GitlabClient {
    async fn fetch_versions(&self, mr: &MrRef) -> Result<Vec<MrVersion>, GitlabError> {
        let url = self.mr_url(mr, "versions")?;
        self.get_json(url, "merge request versions").await
    }

    async fn fetch_diffs(&self, mr: &MrRef) -> Result<Vec<DiffFile>, GitlabError> {
        let mut files = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.mr_url(mr, "diffs")?;
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &PER_PAGE.to_string());

            tracing::debug!(%url, page, "GET");
            let response = self.authed(self.http.get(url)).send().await?;
            let response = check(response, "merge request diffs").await?;
            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());

            let batch: Vec<DiffFile> = response.json().await?;
            let batch_len = batch.len();
            files.extend(batch);

            match next_page {
                Some(next) if next > page && page < MAX_PAGES => page = next,
                None if batch_len as u32 == PER_PAGE && page < MAX_PAGES => page += 1,
                _ => break,
            }
        }

        tracing::debug!(mr = %mr, files = files.len(), "fetched diffs");
        Ok(files)
    }
}

#[async_trait]
impl DiscussionPoster for GitlabClient {
    async fn create_discussion(
        &self,
        mr: &MrRef,
        request: &DiscussionRequest,
    ) -> Result<Discussion, GitlabError> {
        let url = self.mr_url(mr, "discussions")?;
        tracing::debug!(%url, path = %request.position.new_path, "POST discussion");
        let response = self
            .authed(self.http.post(url))
            .json(request)
            .send()
            .await?;
        let response = check(response, "create discussion").await?;
        Ok(response.json().await?)
    }
}
