// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Lists repositories from the GitHub trending pages.
///
/// The trending surface has no API; the HTML page is fetched and every
/// `article.Box-row` entry is turned into a [`RepositoryRecord`]. A page that
/// cannot be fetched contributes no records.
use masterror::AppError;
use octocrab::Octocrab;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    config::{TrendingPeriod, TrendingSettings, millis},
    github,
    merge::dedupe_by_full_name,
    record::{RepositoryRecord, RepositorySource},
};

const TRENDING_URL: &str = "https://github.com/trending";

impl From<TrendingPeriod,> for RepositorySource
{
    fn from(period: TrendingPeriod,) -> Self
    {
        match period {
            TrendingPeriod::Daily => Self::TrendingDaily,
            TrendingPeriod::Weekly => Self::TrendingWeekly,
            TrendingPeriod::Monthly => Self::TrendingMonthly,
        }
    }
}

/// URL of the trending page for `language` (empty for all languages).
pub fn trending_url(language: &str, period: TrendingPeriod,) -> String
{
    if language.is_empty() {
        format!("{TRENDING_URL}?since={}", period.as_str())
    } else {
        format!("{TRENDING_URL}/{language}?since={}", period.as_str())
    }
}

struct PageSelectors
{
    article:     Selector,
    title_link:  Selector,
    description: Selector,
    stargazers:  Selector,
    star_badge:  Selector,
    language:    Selector,
}

impl PageSelectors
{
    fn new() -> Result<Self, AppError,>
    {
        let parse = |css: &str| {
            Selector::parse(css,)
                .map_err(|e| AppError::internal(format!("invalid selector {css}: {e}"),),)
        };

        Ok(Self {
            article:     parse("article.Box-row",)?,
            title_link:  parse("h2 a",)?,
            description: parse("p.col-9",)?,
            stargazers:  parse(r#"a[href$="/stargazers"]"#,)?,
            star_badge:  parse("span.d-inline-block",)?,
            language:    parse(r#"[itemprop="programmingLanguage"]"#,)?,
        },)
    }
}

/// Parses a trending page into records tagged with the period's source.
///
/// Entries without a well-formed `owner/name` link are skipped. The language
/// printed on an entry wins over the requested `language`.
///
/// # Errors
///
/// Returns [`AppError`] only if the built-in selectors fail to compile.
pub fn parse_trending_page(
    html: &str,
    language: &str,
    period: TrendingPeriod,
) -> Result<Vec<RepositoryRecord,>, AppError,>
{
    let selectors = PageSelectors::new()?;
    let digits = Regex::new(r"[\d,]+",)
        .map_err(|e| AppError::internal(format!("invalid regex: {e}"),),)?;
    let document = Html::parse_document(html,);

    let mut repositories = Vec::new();
    for article in document.select(&selectors.article,) {
        let Some(link,) = article.select(&selectors.title_link,).next() else {
            continue;
        };
        let href = link.value().attr("href",).unwrap_or_default().trim_matches('/',);
        let Some((owner, name,),) = href.split_once('/',) else {
            debug!("Skipping trending entry with link {:?}", href);
            continue;
        };
        if owner.is_empty() || name.is_empty() || name.contains('/',) {
            debug!("Skipping trending entry with link {:?}", href);
            continue;
        }

        let mut record = RepositoryRecord::new(owner, name,);
        record.description = article
            .select(&selectors.description,)
            .next()
            .map(element_text,)
            .filter(|text| !text.is_empty(),);
        record.stars = article
            .select(&selectors.stargazers,)
            .next()
            .or_else(|| article.select(&selectors.star_badge,).next(),)
            .and_then(|element| parse_count(&digits, &element_text(element,),),)
            .unwrap_or_default();
        record.language = article
            .select(&selectors.language,)
            .next()
            .map(element_text,)
            .filter(|text| !text.is_empty(),)
            .or_else(|| (!language.is_empty()).then(|| language.to_owned(),),)
            .unwrap_or_else(|| "Unknown".to_owned(),);
        record.source = Some(period.into(),);

        repositories.push(record,);
    }

    Ok(repositories,)
}

fn element_text(element: ElementRef<'_,>,) -> String
{
    element.text().collect::<Vec<_,>>().join(" ",).split_whitespace().collect::<Vec<_,>>().join(" ",)
}

fn parse_count(digits: &Regex, text: &str,) -> Option<u64,>
{
    digits.find(text,)?.as_str().replace(',', "",).parse().ok()
}

/// Fetches and parses one trending page. Failures are logged and yield an
/// empty list.
pub async fn fetch_trending(
    client: &Octocrab,
    language: &str,
    period: TrendingPeriod,
) -> Vec<RepositoryRecord,>
{
    let url = trending_url(language, period,);
    let html = match github::fetch_text(client, &url,).await {
        Ok(html,) => html,
        Err(error,) => {
            warn!("Error fetching trending {}: {}", url, error.render_message());
            return Vec::new();
        }
    };

    match parse_trending_page(&html, language, period,) {
        Ok(repositories,) => {
            debug!("{} repositories on {}", repositories.len(), url);
            repositories
        }
        Err(error,) => {
            warn!("Error parsing trending {}: {}", url, error.render_message());
            Vec::new()
        }
    }
}

/// Lists every configured language and period, then deduplicates by
/// `full_name`, keeping the first occurrence.
pub async fn fetch_all_trending(
    client: &Octocrab,
    settings: &TrendingSettings,
) -> Vec<RepositoryRecord,>
{
    let mut all = Vec::new();
    for language in &settings.languages {
        for period in &settings.periods {
            all.extend(fetch_trending(client, language, *period,).await,);
            sleep(millis(settings.delay_ms,),).await;
        }
    }

    let fetched = all.len();
    let unique = dedupe_by_full_name(all,);
    info!("Fetched {} trending repos, {} unique", fetched, unique.len());
    unique
}
