// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Lists the most-starred repositories through the GitHub Search API.
///
/// Pages are requested sequentially with a fixed pause between them. A page
/// that fails is logged and skipped after a longer pause; the listing never
/// fails as a whole.
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    config::{StarredSettings, millis},
    github,
    progress::batch_bar,
    record::{RepositoryRecord, RepositorySource},
};

const SEARCH_ROUTE: &str = "/search/repositories";

#[derive(Debug, Serialize,)]
struct SearchQuery<'a,>
{
    q:        &'a str,
    sort:     &'static str,
    order:    &'static str,
    per_page: usize,
    page:     usize,
}

#[derive(Debug, Deserialize,)]
struct SearchResponse
{
    #[serde(default)]
    items: Vec<SearchItem,>,
}

#[derive(Debug, Deserialize,)]
struct SearchOwner
{
    login:      String,
    #[serde(default)]
    avatar_url: Option<String,>,
}

/// Subset of a repository search result used by the pipeline.
#[derive(Debug, Deserialize,)]
pub struct SearchItem
{
    name:             String,
    owner:            SearchOwner,
    full_name:        String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    description:      Option<String,>,
    html_url:         String,
    #[serde(default)]
    language:         Option<String,>,
}

impl From<SearchItem,> for RepositoryRecord
{
    fn from(item: SearchItem,) -> Self
    {
        let mut record = RepositoryRecord::new(item.owner.login, item.name,);
        record.full_name = item.full_name;
        record.stars = item.stargazers_count;
        record.description = item.description;
        record.url = item.html_url;
        record.avatar_url = item.owner.avatar_url;
        if let Some(language,) = item.language {
            record.language = language;
        }
        record.source = Some(RepositorySource::Starred,);
        record
    }
}

/// `(per_page, page)` pairs covering the first `limit` search results.
///
/// The page size stays constant since GitHub offsets page `n` by
/// `(n - 1) * per_page`; the surplus of the last page is truncated by the
/// caller.
fn page_plan(limit: usize, per_page: usize,) -> Vec<(usize, usize,),>
{
    if per_page == 0 {
        return Vec::new();
    }
    (1..=limit.div_ceil(per_page,)).map(|page| (per_page, page,),).collect()
}

/// Lists up to `settings.limit` repositories matching `settings.query`,
/// sorted by stars in descending order.
pub async fn fetch_starred(client: &Octocrab, settings: &StarredSettings,) -> Vec<RepositoryRecord,>
{
    let plan = page_plan(settings.limit, usize::from(settings.per_page,),);
    let bar = batch_bar(plan.len(), "Fetching starred repos",);
    let mut repositories = Vec::with_capacity(settings.limit,);

    for (per_page, page,) in plan {
        bar.inc(1,);
        let query = SearchQuery {
            q: &settings.query,
            sort: "stars",
            order: "desc",
            per_page,
            page,
        };

        let response: SearchResponse =
            match github::get_json(client, SEARCH_ROUTE, Some(&query,),).await {
                Ok(response,) => response,
                Err(error,) => {
                    warn!("Error fetching page {}: {}", page, error.render_message());
                    sleep(millis(settings.error_delay_ms,),).await;
                    continue;
                }
            };

        let received = response.items.len();
        debug!("Page {} returned {} repositories", page, received);
        repositories.extend(response.items.into_iter().map(RepositoryRecord::from,),);
        sleep(millis(settings.page_delay_ms,),).await;

        if received == 0 || repositories.len() >= settings.limit {
            break;
        }
    }

    repositories.truncate(settings.limit,);
    bar.finish_with_message(format!("{} repos", repositories.len()),);
    info!("Fetched {} starred repos", repositories.len());
    repositories
}
