use crate::domain::period::Period;
use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Everything fetched for one report run. Every field, and every period inside it, is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendsBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trending_searches: Option<BTreeMap<Period, Vec<TrendingSearchRow>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_trends: Option<BTreeMap<Period, StockTrendsTable>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_queries: Option<BTreeMap<Period, RelatedQueriesByKeyword>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_regions: Option<Vec<KeywordRegions>>,
}

impl TrendsBundle {
    pub fn trending(&self, period: Period) -> Option<&[TrendingSearchRow]> {
        self.trending_searches
            .as_ref()?
            .get(&period)
            .map(Vec::as_slice)
    }

    pub fn stock(&self, period: Period) -> Option<&StockTrendsTable> {
        self.stock_trends.as_ref()?.get(&period)
    }

    pub fn is_empty(&self) -> bool {
        let trending_empty = self
            .trending_searches
            .as_ref()
            .map_or(true, |m| m.values().all(Vec::is_empty));
        let stock_empty = self
            .stock_trends
            .as_ref()
            .map_or(true, |m| m.values().all(StockTrendsTable::is_empty));
        let related_empty = self
            .related_queries
            .as_ref()
            .map_or(true, |m| m.values().all(RelatedQueriesByKeyword::is_empty));
        let regions_empty = self.keyword_regions.as_ref().map_or(true, Vec::is_empty);
        trending_empty && stock_empty && related_empty && regions_empty
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingSearchRow {
    pub rank: u32,
    pub search_term: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub date: String,
}

/// Date-indexed wide table: one column per keyword, one row per date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockTrendsTable {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<StockTrendsRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTrendsRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

impl StockTrendsTable {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Row with the greatest date key, regardless of where it sits in the table.
    pub fn latest_row(&self) -> Option<&StockTrendsRow> {
        self.rows.iter().max_by_key(|row| row.date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedQueries {
    #[serde(default)]
    pub top: Vec<QueryRow>,
    #[serde(default)]
    pub rising: Vec<QueryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    pub query: String,
    pub value: f64,
}

/// Regional breakdown for one keyword over the analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRegions {
    pub keyword: String,
    /// Highest interest first.
    #[serde(default)]
    pub top_regions: Vec<RegionInterest>,
    #[serde(default)]
    pub peak_interest: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInterest {
    pub region: String,
    pub value: f64,
}

/// Related queries per keyword, in the order the keywords were fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelatedQueriesByKeyword(pub Vec<(String, RelatedQueries)>);

impl RelatedQueriesByKeyword {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelatedQueries)> {
        self.0.iter().map(|(k, q)| (k.as_str(), q))
    }

    pub fn push(&mut self, keyword: impl Into<String>, queries: RelatedQueries) {
        self.0.push((keyword.into(), queries));
    }
}

impl Serialize for RelatedQueriesByKeyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (keyword, queries) in &self.0 {
            map.serialize_entry(keyword, queries)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RelatedQueriesByKeyword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = RelatedQueriesByKeyword;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from keyword to related queries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((keyword, queries)) = access.next_entry::<String, RelatedQueries>()? {
                    out.push((keyword, queries));
                }
                Ok(RelatedQueriesByKeyword(out))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
