//! Merge request URL parsing.
//!
//! `https://gitlab.example.com/group/sub/project/-/merge_requests/123`
//! yields host, full project path `group/sub/project`, and iid `123`.

use reqwest::Url;

use super::GitlabError;

/// Components of a merge request web URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMrUrl {
    /// `scheme://host[:port]` of the GitLab instance.
    pub origin: String,
    /// Namespace path without the project, e.g. `group/sub`.
    pub group_path: String,
    /// Full project path including namespace, e.g. `group/sub/project`.
    pub project_path: String,
    /// Merge request iid (project-scoped number).
    pub iid: u64,
}

impl ParsedMrUrl {
    /// REST API base for the instance the URL points at.
    pub fn api_base(&self) -> String {
        format!("{}/api/v4", self.origin)
    }
}

/// Parse a merge request web URL.
pub fn parse_mr_url(raw: &str) -> Result<ParsedMrUrl, GitlabError> {
    let invalid = |reason: &str| GitlabError::InvalidMrUrl(format!("{reason}: {raw}"));

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    let origin = match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    };

    let parts: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let dash = parts
        .windows(2)
        .position(|w| w[0] == "-" && w[1] == "merge_requests")
        .ok_or_else(|| invalid("expected /-/merge_requests/<iid>"))?;

    let iid = parts
        .get(dash + 2)
        .ok_or_else(|| invalid("missing merge request iid"))?
        .parse::<u64>()
        .map_err(|_| invalid("merge request iid is not a number"))?;

    // At least one namespace segment plus the project itself.
    if dash < 2 {
        return Err(invalid("cannot determine project path"));
    }

    Ok(ParsedMrUrl {
        origin,
        group_path: parts[..dash - 1].join("/"),
        project_path: parts[..dash].join("/"),
        iid,
    })
}
