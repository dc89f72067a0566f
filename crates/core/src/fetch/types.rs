use crate::domain::bundle::{RegionInterest, TrendingSearchRow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingSearchesResponse {
    #[serde(default)]
    pub region: Option<String>,
    pub items: Vec<TrendingSearchRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestByRegionResponse {
    #[serde(default)]
    pub keyword: Option<String>,
    pub items: Vec<RegionInterest>,
}
