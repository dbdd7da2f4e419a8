// ============================================================================
// API Client : company profile
// ============================================================================
// quoteSummary supplies the card metadata: name, sector, description,
// market cap, P/E and the company sites. Prices come from the chart
// endpoint, so the two fields stay unset here.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::api::client::get_json;
use crate::api::RawValue;
use crate::models::profile::LiveProfile;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    asset_profile: Option<AssetProfile>,
    summary_detail: Option<SummaryDetail>,
    price: Option<PriceBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    sector: Option<String>,
    long_business_summary: Option<String>,
    website: Option<String>,
    ir_website: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    market_cap: Option<RawValue>,
    // Upstream spells the suffix in caps, which camelCase would miss.
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceBlock {
    short_name: Option<String>,
    long_name: Option<String>,
}

/// Fetches profile metadata for a symbol. Absent modules simply leave their
/// fields unset; resolution against the fallback table happens later.
#[instrument(skip(client, api_base))]
pub async fn fetch_profile(
    client: &reqwest::Client,
    api_base: &str,
    symbol: &str,
) -> Result<LiveProfile> {
    let url = build_summary_url(api_base, symbol);
    debug!(url = %url, "built quoteSummary URL");

    let response: SummaryResponse = get_json(client, &url).await?;
    let profile = parse_summary_response(response)?;

    info!(
        has_name = profile.name.is_some(),
        has_sector = profile.sector.is_some(),
        "fetched profile"
    );
    Ok(profile)
}

fn build_summary_url(api_base: &str, symbol: &str) -> String {
    format!(
        "{}/v10/finance/quoteSummary/{}?modules=assetProfile,summaryDetail,price",
        api_base, symbol
    )
}

fn parse_summary_response(response: SummaryResponse) -> Result<LiveProfile> {
    let result = response
        .quote_summary
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .context("empty quoteSummary response")?;

    let mut profile = LiveProfile::default();

    if let Some(price) = result.price {
        profile.name = price.short_name.or(price.long_name);
    }
    if let Some(asset) = result.asset_profile {
        profile.sector = asset.sector;
        profile.description = asset.long_business_summary;
        profile.website = asset.website;
        profile.ir_website = asset.ir_website;
    }
    if let Some(detail) = result.summary_detail {
        profile.market_cap = detail.market_cap.and_then(|v| v.raw);
        // Forward P/E when published, trailing otherwise.
        profile.pe_ratio = detail
            .forward_pe
            .and_then(|v| v.raw)
            .or(detail.trailing_pe.and_then(|v| v.raw));
    }

    Ok(profile)
}

// ============================================================================
// Tests
// ============================================================================
