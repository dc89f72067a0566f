use crate::config::Settings;
use crate::domain::bundle::{RegionInterest, RelatedQueries, StockTrendsTable, TrendingSearchRow};
use crate::domain::period::Period;
use crate::fetch::types::{InterestByRegionResponse, TrendingSearchesResponse};
use crate::fetch::TrendsSource;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;

const TRENDING_PATH: &str = "/trending_searches";
const INTEREST_PATH: &str = "/interest_over_time";
const RELATED_PATH: &str = "/related_queries";
const REGION_PATH: &str = "/interest_by_region";

/// JSON-over-HTTP trends source. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpTrendsSource {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTrendsSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_trends_provider_base_url()?.to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.trends_provider_timeout_secs))
            .build()
            .context("failed to build trends provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.trends_provider_api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let res = self
            .http
            .get(self.url(path))
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .with_context(|| format!("trends provider request to {path} failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read trends provider response")?;

        if !status.is_success() {
            anyhow::bail!("trends provider HTTP {status} for {path}: {text}");
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("unexpected trends provider response from {path}: {text}"))
    }
}

#[async_trait::async_trait]
impl TrendsSource for HttpTrendsSource {
    fn source_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn trending_searches(&self, region: &str, period: Period) -> Result<Vec<TrendingSearchRow>> {
        let resp: TrendingSearchesResponse = self
            .get_json(TRENDING_PATH, &[("geo", region), ("period", period.as_str())])
            .await?;
        Ok(resp.items)
    }

    async fn interest_over_time(&self, keywords: &[String], timeframe: &str) -> Result<StockTrendsTable> {
        let joined = keywords.join(",");
        let table: StockTrendsTable = self
            .get_json(INTEREST_PATH, &[("keywords", joined.as_str()), ("timeframe", timeframe)])
            .await?;
        validate_table(&table)?;
        Ok(table)
    }

    async fn related_queries(&self, keyword: &str, timeframe: &str) -> Result<RelatedQueries> {
        self.get_json(RELATED_PATH, &[("keyword", keyword), ("timeframe", timeframe)])
            .await
    }

    async fn interest_by_region(&self, keyword: &str, timeframe: &str) -> Result<Vec<RegionInterest>> {
        let resp: InterestByRegionResponse = self
            .get_json(
                REGION_PATH,
                &[("keyword", keyword), ("timeframe", timeframe), ("resolution", "REGION")],
            )
            .await?;
        Ok(resp.items)
    }
}

fn validate_table(table: &StockTrendsTable) -> Result<()> {
    for row in &table.rows {
        anyhow::ensure!(
            row.values.len() == table.columns.len(),
            "interest row {} has {} values for {} columns",
            row.date,
            row.values.len(),
            table.columns.len()
        );
    }
    Ok(())
}
