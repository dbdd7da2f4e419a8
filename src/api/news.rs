// ============================================================================
// API Client : news headlines
// ============================================================================

use std::collections::HashSet;

use anyhow::Result;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::api::client::get_json;
use crate::models::news::NewsItem;

/// The card shows at most this many headlines.
const NEWS_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<RawNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNews {
    title: Option<String>,
    publisher: Option<String>,
    link: Option<String>,
    provider_publish_time: Option<i64>,
}

/// Fetches recent headlines for a symbol. Items without a title are
/// dropped, repeated titles keep only the first occurrence; an empty
/// list is a valid result, not an error.
#[instrument(skip(client, api_base))]
pub async fn fetch_news(
    client: &reqwest::Client,
    api_base: &str,
    symbol: &str,
) -> Result<Vec<NewsItem>> {
    let url = build_search_url(api_base, symbol);
    debug!(url = %url, "built news search URL");

    let response: SearchResponse = get_json(client, &url).await?;
    let items = parse_search_response(response);

    info!(items = items.len(), "fetched news");
    Ok(items)
}

fn build_search_url(api_base: &str, symbol: &str) -> String {
    format!(
        "{}/v1/finance/search?q={}&newsCount={}&quotesCount=0",
        api_base, symbol, NEWS_LIMIT
    )
}

fn parse_search_response(response: SearchResponse) -> Vec<NewsItem> {
    // Search results repeat syndicated stories; keep the first of each title.
    let mut seen = HashSet::new();
    response
        .news
        .into_iter()
        .filter_map(|raw| {
            let title = raw.title.filter(|t| !t.trim().is_empty())?;
            Some(NewsItem {
                title,
                publisher: raw.publisher,
                link: raw.link,
                published: raw
                    .provider_publish_time
                    .and_then(|ts| DateTime::from_timestamp(ts, 0)),
                age_text: None,
            })
        })
        .filter(|item| seen.insert(item.title.clone()))
        .take(NEWS_LIMIT)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
