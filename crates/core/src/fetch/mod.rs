pub mod http;
pub mod types;

use crate::domain::bundle::{
    KeywordRegions, RegionInterest, RelatedQueries, RelatedQueriesByKeyword, StockTrendsRow,
    StockTrendsTable, TrendingSearchRow, TrendsBundle,
};
use crate::domain::period::Period;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Upstream comparison limit: interest-over-time accepts at most this many keywords per call.
pub const KEYWORD_BATCH_SIZE: usize = 5;

/// Window for the per-keyword regional breakdown.
pub const REGION_TIMEFRAME: &str = "today 3-m";
pub const TOP_REGIONS: usize = 10;

#[async_trait::async_trait]
pub trait TrendsSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn trending_searches(&self, region: &str, period: Period) -> Result<Vec<TrendingSearchRow>>;

    async fn interest_over_time(&self, keywords: &[String], timeframe: &str) -> Result<StockTrendsTable>;

    async fn related_queries(&self, keyword: &str, timeframe: &str) -> Result<RelatedQueries>;

    async fn interest_by_region(&self, keyword: &str, timeframe: &str) -> Result<Vec<RegionInterest>>;
}

/// Fetches everything a report needs. Individual call failures are logged and skipped.
///
/// Returns `None` when nothing at all could be retrieved.
pub async fn collect_bundle(
    source: &dyn TrendsSource,
    regions: &[String],
    keywords: &[String],
    as_of: NaiveDate,
) -> Option<TrendsBundle> {
    let provider = source.source_name();
    let mut trending_searches = BTreeMap::new();
    let mut stock_trends = BTreeMap::new();
    let mut related_queries = BTreeMap::new();

    for period in Period::ALL {
        let mut rows = Vec::new();
        for region in regions {
            match source.trending_searches(region, period).await {
                Ok(fetched) => rows.extend(fetched),
                Err(err) => {
                    tracing::warn!(provider, %region, %period, error = %err, "trending searches fetch failed");
                }
            }
        }
        trending_searches.insert(period, normalize_trending(rows, period, as_of));

        let timeframe = period.timeframe();
        let mut batches = Vec::new();
        for batch in keywords.chunks(KEYWORD_BATCH_SIZE) {
            match source.interest_over_time(batch, timeframe).await {
                Ok(table) => batches.push(table),
                Err(err) => {
                    tracing::warn!(provider, %period, keywords = ?batch, error = %err, "interest over time fetch failed");
                }
            }
        }
        stock_trends.insert(period, merge_tables(batches));

        let mut by_keyword = RelatedQueriesByKeyword::default();
        for keyword in keywords {
            match source.related_queries(keyword, timeframe).await {
                Ok(queries) => by_keyword.push(keyword.clone(), queries),
                Err(err) => {
                    tracing::warn!(provider, %period, %keyword, error = %err, "related queries fetch failed");
                }
            }
        }
        if !by_keyword.is_empty() {
            related_queries.insert(period, by_keyword);
        }
    }

    let mut keyword_regions = Vec::new();
    for keyword in keywords {
        if let Some(entry) = collect_keyword_regions(source, keyword).await {
            keyword_regions.push(entry);
        }
    }

    let bundle = TrendsBundle {
        trending_searches: Some(trending_searches),
        stock_trends: Some(stock_trends),
        related_queries: Some(related_queries),
        keyword_regions: Some(keyword_regions),
    };

    if bundle.is_empty() {
        tracing::error!(provider, "no trends data could be retrieved");
        return None;
    }
    Some(bundle)
}

/// Top regions for one keyword plus its peak interest. A failed peak lookup leaves the peak unset;
/// a failed region lookup drops the keyword.
async fn collect_keyword_regions(source: &dyn TrendsSource, keyword: &str) -> Option<KeywordRegions> {
    let provider = source.source_name();
    let regions = match source.interest_by_region(keyword, REGION_TIMEFRAME).await {
        Ok(regions) => regions,
        Err(err) => {
            tracing::warn!(provider, %keyword, error = %err, "interest by region fetch failed");
            return None;
        }
    };

    let single = [keyword.to_string()];
    let peak_interest = match source.interest_over_time(&single, REGION_TIMEFRAME).await {
        Ok(table) => peak_interest(&table, keyword),
        Err(err) => {
            tracing::warn!(provider, %keyword, error = %err, "peak interest fetch failed");
            None
        }
    };

    Some(KeywordRegions {
        keyword: keyword.to_string(),
        top_regions: top_regions(regions),
        peak_interest,
    })
}

/// Highest interest first, at most [`TOP_REGIONS`]. Equal values keep upstream order.
fn top_regions(mut regions: Vec<RegionInterest>) -> Vec<RegionInterest> {
    regions.sort_by(|a, b| b.value.total_cmp(&a.value));
    regions.truncate(TOP_REGIONS);
    regions
}

fn peak_interest(table: &StockTrendsTable, keyword: &str) -> Option<f64> {
    let col = table.columns.iter().position(|c| c == keyword)?;
    table
        .rows
        .iter()
        .filter_map(|row| row.values.get(col).copied().flatten())
        .max_by(f64::total_cmp)
}

/// Concatenates per-region rows: ranks become 1..=n in arrival order, blank period/date are filled.
fn normalize_trending(
    rows: Vec<TrendingSearchRow>,
    period: Period,
    as_of: NaiveDate,
) -> Vec<TrendingSearchRow> {
    rows.into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            row.rank = i as u32 + 1;
            if row.period.trim().is_empty() {
                row.period = period.as_str().to_string();
            }
            if row.date.trim().is_empty() {
                row.date = as_of.to_string();
            }
            row
        })
        .collect()
}

/// Outer-joins batch tables on date. A keyword already seen in an earlier batch keeps its
/// first column; later duplicates are dropped.
pub fn merge_tables(batches: Vec<StockTrendsTable>) -> StockTrendsTable {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<usize, f64>> = BTreeMap::new();

    for batch in batches {
        for (j, keyword) in batch.columns.iter().enumerate() {
            if !seen.insert(keyword.clone()) {
                continue;
            }
            let k = columns.len();
            columns.push(keyword.clone());
            for row in &batch.rows {
                let cells = by_date.entry(row.date).or_default();
                if let Some(value) = row.values.get(j).copied().flatten() {
                    cells.insert(k, value);
                }
            }
        }
    }

    let rows = by_date
        .into_iter()
        .map(|(date, cells)| StockTrendsRow {
            date,
            values: (0..columns.len()).map(|k| cells.get(&k).copied()).collect(),
        })
        .collect();

    StockTrendsTable { columns, rows }
}

/// Reads a previously exported bundle, for offline report runs.
pub fn load_bundle_file(path: &Path) -> Result<TrendsBundle> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bundle file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("bundle file {} is not a valid trends bundle", path.display()))
}
