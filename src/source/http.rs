use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};
use url::Url;

use super::wire::{CatalogPayload, FilterOptionsPayload, IndicatorsPayload, OriginPayload};
use super::{DataQuery, EndpointConfig, ReportSource};
use crate::core::{
    FilterOptions, Indicator, OriginDimension, OriginEntry, OriginLimits, PeriodDefinition,
    TravellerCategory, format_iso_date,
};
use crate::api::ReportEngineConfig;
use crate::error::{ReportError, ReportResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

/// `ReportSource` backed by the portal's PHP endpoints.
#[derive(Debug, Clone)]
pub struct HttpReportSource {
    client: reqwest::Client,
    base_url: Url,
    endpoints: EndpointConfig,
    request_limits: OriginLimits,
}

impl HttpReportSource {
    pub fn new(endpoints: EndpointConfig, request_limits: OriginLimits) -> ReportResult<Self> {
        let base_url = Url::parse(&endpoints.base_url)
            .map_err(|err| ReportError::InvalidData(format!("invalid base url: {err}")))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ReportError::Transport(format!("http client error: {err}")))?;
        Ok(Self {
            client,
            base_url,
            endpoints,
            request_limits,
        })
    }

    /// Source for the endpoints and request limits of `config`.
    pub fn from_config(config: &ReportEngineConfig) -> ReportResult<Self> {
        Self::new(config.endpoints.clone(), config.origin_limits.requested)
    }

    fn endpoint_url(&self, path: &str, pairs: &[(&str, String)]) -> ReportResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| ReportError::InvalidData(format!("invalid endpoint `{path}`: {err}")))?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_text(&self, path: &str, pairs: &[(&str, String)]) -> ReportResult<String> {
        let url = self.endpoint_url(path, pairs)?;
        trace!(url = %url, "report source request");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| ReportError::Transport(format!("{url}: {err}")))?;
        let body = response
            .text()
            .await
            .map_err(|err| ReportError::Transport(format!("{url}: {err}")))?;
        debug!(url = %url, bytes = body.len(), "report source response");
        Ok(body)
    }
}

/// Backend parameter names for one filter tuple.
fn query_pairs(query: &DataQuery) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("annee", query.year.to_string()),
        ("periode", query.period.as_str().to_owned()),
        ("zone", query.zone.as_str().to_owned()),
    ];
    if let Some(range) = query.range {
        pairs.push(("debut", format_iso_date(range.start())));
        pairs.push(("fin", format_iso_date(range.end())));
    }
    pairs
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn filter_options(&self) -> ReportResult<FilterOptions> {
        let body = self.get_text(&self.endpoints.filter_options, &[]).await?;
        let payload: FilterOptionsPayload = serde_json::from_str(&body)
            .map_err(|err| ReportError::InvalidData(format!("malformed filter options: {err}")))?;
        payload.into_options()
    }

    async fn period_catalog(&self, year: i32) -> ReportResult<Vec<PeriodDefinition>> {
        let pairs = [("action", "year".to_owned()), ("annee", year.to_string())];
        let body = self.get_text(&self.endpoints.period_catalog, &pairs).await?;
        CatalogPayload::parse(&body)?.into_definitions(year)
    }

    async fn key_indicators(&self, query: &DataQuery) -> ReportResult<Vec<Indicator>> {
        let body = self
            .get_text(&self.endpoints.key_indicators, &query_pairs(query))
            .await?;
        IndicatorsPayload::parse(&body)?.into_indicators(query.year)
    }

    async fn origin_breakdown(
        &self,
        query: &DataQuery,
        category: TravellerCategory,
        dimension: OriginDimension,
    ) -> ReportResult<Vec<OriginEntry>> {
        let mut pairs = query_pairs(query);
        pairs.push(("limit", self.request_limits.get(dimension).to_string()));
        let body = self
            .get_text(self.endpoints.origin_path(category, dimension), &pairs)
            .await?;
        OriginPayload::parse(&body)?.into_entries()
    }
}
