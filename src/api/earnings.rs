// ============================================================================
// API Client : earnings-call documents
// ============================================================================
// Talks to the transcript server, which lists whatever files it has for a
// ticker. The payload is loosely shaped, so every field is optional and
// entries are kept as long as something identifies them.

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::api::client::get_json;
use crate::models::earnings::EarningsDoc;

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    files: Vec<RawDoc>,
}

#[derive(Debug, Deserialize)]
struct RawDoc {
    filename: Option<String>,
    date: Option<String>,
    link: Option<String>,
}

/// Lists the transcripts available for a symbol, newest first. An empty
/// listing is normal for symbols with no documents.
#[instrument(skip(client, docs_base))]
pub async fn fetch_earnings_docs(
    client: &reqwest::Client,
    docs_base: &str,
    symbol: &str,
) -> Result<Vec<EarningsDoc>> {
    let url = build_listing_url(docs_base, symbol);
    debug!(url = %url, "built earnings listing URL");

    let response: ListingResponse = get_json(client, &url).await?;
    let docs = parse_listing_response(response);

    info!(docs = docs.len(), "fetched earnings listing");
    Ok(docs)
}

fn build_listing_url(docs_base: &str, symbol: &str) -> String {
    format!(
        "{}/api/earningcalls?ticker={}",
        docs_base,
        symbol.to_uppercase()
    )
}

fn parse_listing_response(response: ListingResponse) -> Vec<EarningsDoc> {
    let mut docs: Vec<EarningsDoc> = response
        .files
        .into_iter()
        .filter_map(|raw| {
            // Label from the server, else derived from the filename stem
            // the way the server would have ("2024-Q4.pdf" -> "2024 Q4").
            let label = raw
                .date
                .filter(|d| !d.trim().is_empty())
                .or_else(|| {
                    raw.filename.as_deref().map(|f| {
                        f.rsplit_once('.')
                            .map(|(stem, _)| stem)
                            .unwrap_or(f)
                            .replace('-', " ")
                    })
                })?;
            Some(EarningsDoc {
                label,
                filename: raw.filename,
                link: raw.link,
            })
        })
        .collect();

    // Server order is not guaranteed; "2024 Q4" labels sort newest first
    // in reverse lexicographic order.
    docs.sort_by(|a, b| b.label.cmp(&a.label));
    docs
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_listing_url() {
        let url = build_listing_url("http://localhost:8000", "nvda");
        assert_eq!(url, "http://localhost:8000/api/earningcalls?ticker=NVDA");
    }

    #[test]
    fn test_parse_listing_sorts_newest_first() {
        let raw = r#"{"ticker": "NVDA", "files": [
            {"filename": "2024-Q3.pdf"},
            {"filename": "2024-Q4.pdf", "date": "2024 Q4",
             "link": "/earningcall/NVDA/2024-Q4.pdf"},
            {"link": "/earningcall/NVDA/unlabelled.pdf"}
        ]}"#;
        let response: ListingResponse = serde_json::from_str(raw).unwrap();
        let docs = parse_listing_response(response);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].label, "2024 Q4");
        assert_eq!(docs[0].link.as_deref(), Some("/earningcall/NVDA/2024-Q4.pdf"));
        // Label recovered from the filename stem.
        assert_eq!(docs[1].label, "2024 Q3");
        assert!(docs[1].link.is_none());
    }

    #[test]
    fn test_parse_tolerates_empty_payload() {
        let response: ListingResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_listing_response(response).is_empty());
    }
}
