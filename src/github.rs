// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// GitHub access shared by the listers, the logo locator and the icon
/// collector.
///
/// Every request is bounded by [`REQUEST_TIMEOUT`] and issued once; callers
/// decide whether a failure degrades to "not found" or ends their step.
use std::time::Duration;

use async_trait::async_trait;
use http_body_util::BodyExt;
use masterror::AppError;
use octocrab::Octocrab;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::time::timeout;
use tracing::debug;

use crate::locator::{ContentEntry, ContentSource};

/// Bytes escaped in a route segment: everything but RFC 3986 unreserved
/// characters.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-',).remove(b'.',).remove(b'_',).remove(b'~',);

/// Upper bound of a single HTTP exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30,);

/// Builds a GitHub client, authenticated when a non-empty token is supplied.
///
/// # Errors
///
/// Returns [`AppError`] when the client cannot be initialized.
pub fn build_client(token: Option<&str,>,) -> Result<Octocrab, AppError,>
{
    let builder = Octocrab::builder();
    let builder = match token.map(str::trim,).filter(|value| !value.is_empty(),) {
        Some(token,) => builder.personal_token(token.to_owned(),),
        None => builder,
    };

    builder.build().map_err(|e| {
        AppError::unauthorized(format!("failed to initialize GitHub client: {e}"),)
    },)
}

/// Issues a GET against a GitHub API route and decodes the JSON response.
///
/// # Errors
///
/// Returns [`AppError`] on timeout, transport failure, non-success status or
/// a response that does not decode into `T`.
pub async fn get_json<T, P,>(
    client: &Octocrab,
    route: &str,
    parameters: Option<&P,>,
) -> Result<T, AppError,>
where
    T: DeserializeOwned,
    P: Serialize + ?Sized,
{
    debug!("GET {}", route);
    timeout(REQUEST_TIMEOUT, client.get(route, parameters,),)
        .await
        .map_err(|_| AppError::service(format!("GET {route} timed out"),),)?
        .map_err(|e| AppError::service(format!("GET {route} failed: {e}"),),)
}

/// Downloads the body of an absolute URL.
///
/// # Errors
///
/// Returns [`AppError`] on timeout, transport failure or non-success status.
pub async fn fetch_bytes(client: &Octocrab, url: &str,) -> Result<Vec<u8,>, AppError,>
{
    debug!("Downloading {}", url);
    let response = timeout(REQUEST_TIMEOUT, client._get(url,),)
        .await
        .map_err(|_| AppError::service(format!("GET {url} timed out"),),)?
        .map_err(|e| AppError::service(format!("GET {url} failed: {e}"),),)?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::service(format!("GET {url} returned {status}"),),);
    }

    let collected = timeout(REQUEST_TIMEOUT, response.into_body().collect(),)
        .await
        .map_err(|_| AppError::service(format!("reading {url} timed out"),),)?
        .map_err(|e| AppError::service(format!("reading {url} failed: {e}"),),)?;

    Ok(collected.to_bytes().to_vec(),)
}

/// Downloads an absolute URL as text, replacing invalid UTF-8 sequences.
///
/// # Errors
///
/// See [`fetch_bytes`].
pub async fn fetch_text(client: &Octocrab, url: &str,) -> Result<String, AppError,>
{
    let bytes = fetch_bytes(client, url,).await?;
    Ok(String::from_utf8_lossy(&bytes,).into_owned(),)
}

/// Contents API route of `path`, each segment percent-encoded.
fn contents_route(owner: &str, repo: &str, path: &str,) -> String
{
    let segments: Vec<String,> = path
        .split('/',)
        .filter(|segment| !segment.is_empty(),)
        .map(|segment| utf8_percent_encode(segment, SEGMENT,).to_string(),)
        .collect();
    format!(
        "/repos/{}/{}/contents/{}",
        utf8_percent_encode(owner, SEGMENT,),
        utf8_percent_encode(repo, SEGMENT,),
        segments.join("/",)
    )
}

/// Repository contents served by the GitHub contents API.
#[derive(Debug, Clone,)]
pub struct GitHubContents
{
    client: Octocrab,
}

impl GitHubContents
{
    pub fn new(client: Octocrab,) -> Self
    {
        Self {
            client,
        }
    }

    async fn contents(&self, owner: &str, repo: &str, path: &str,) -> Option<serde_json::Value,>
    {
        let route = contents_route(owner, repo, path,);
        match get_json::<serde_json::Value, (),>(&self.client, &route, None,).await {
            Ok(value,) => Some(value,),
            Err(error,) => {
                debug!("No contents at {}/{}:{}: {}", owner, repo, path, error.render_message());
                None
            }
        }
    }
}

#[async_trait]
impl ContentSource for GitHubContents
{
    async fn fetch_file(&self, owner: &str, repo: &str, path: &str,) -> Option<Vec<u8,>,>
    {
        let value = self.contents(owner, repo, path,).await?;
        let entry: ContentEntry = serde_json::from_value(value,).ok()?;
        if !entry.is_file() {
            return None;
        }

        let download_url = entry.download_url?;
        match fetch_bytes(&self.client, &download_url,).await {
            Ok(bytes,) => Some(bytes,),
            Err(error,) => {
                debug!("Download of {}/{}:{} failed: {}", owner, repo, path, error.render_message());
                None
            }
        }
    }

    async fn list_directory(&self, owner: &str, repo: &str, path: &str,) -> Vec<ContentEntry,>
    {
        let Some(value,) = self.contents(owner, repo, path,).await else {
            return Vec::new();
        };

        if !value.is_array() {
            return Vec::new();
        }

        serde_json::from_value(value,).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[tokio::test]
    async fn builds_anonymous_client_for_blank_token()
    {
        assert!(build_client(Some("   "),).is_ok());
        assert!(build_client(None,).is_ok());
    }

    #[tokio::test]
    async fn builds_authenticated_client()
    {
        assert!(build_client(Some("ghp_example"),).is_ok());
    }

    #[test]
    fn contents_route_encodes_each_segment()
    {
        assert_eq!(
            contents_route("acme", "widget", "assets/My Logo.png",),
            "/repos/acme/widget/contents/assets/My%20Logo.png"
        );
        assert_eq!(
            contents_route("acme", "widget", "/docs/l\u{f6}go#1.svg",),
            "/repos/acme/widget/contents/docs/l%C3%B6go%231.svg"
        );
    }

    #[test]
    fn contents_route_of_root_is_empty_path()
    {
        assert_eq!(contents_route("acme", "my.repo", "",), "/repos/acme/my.repo/contents/");
        assert_eq!(contents_route("acme", "widget", "logo.svg",), "/repos/acme/widget/contents/logo.svg");
    }
}
