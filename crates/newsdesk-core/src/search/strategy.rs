//! Routing strategy: which retrieval operations answer an analysis

use crate::llm::{Intent, QueryAnalysis};
use serde::{Deserialize, Serialize};

/// Default per-call limit recorded on primary endpoints
pub const DEFAULT_ENDPOINT_LIMIT: usize = 5;

/// Default per-call limit recorded on secondary endpoints
pub const SECONDARY_ENDPOINT_LIMIT: usize = 3;

/// Term searched by fallback strategies
pub const FALLBACK_QUERY: &str = "news";

pub const DEFAULT_MIN_SCORE: f64 = 0.7;
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// The five retrieval operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Category,
    Search,
    Source,
    Score,
    Nearby,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Category => "category",
            Endpoint::Search => "search",
            Endpoint::Source => "source",
            Endpoint::Score => "score",
            Endpoint::Nearby => "nearby",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryParams {
    pub category: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    pub query: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceParams {
    pub source: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreParams {
    pub min_score: f64,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NearbyParams {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub limit: usize,
}

/// Resolved parameters for one retrieval call, one variant per operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointParams {
    Category(CategoryParams),
    Search(SearchParams),
    Source(SourceParams),
    Score(ScoreParams),
    Nearby(NearbyParams),
}

impl EndpointParams {
    pub fn category(category: impl Into<String>, limit: usize) -> Self {
        Self::Category(CategoryParams {
            category: category.into(),
            limit,
        })
    }

    pub fn search(query: impl Into<String>, limit: usize) -> Self {
        Self::Search(SearchParams {
            query: query.into(),
            limit,
        })
    }

    pub fn source(source: impl Into<String>, limit: usize) -> Self {
        Self::Source(SourceParams {
            source: source.into(),
            limit,
        })
    }

    pub fn score(min_score: f64, limit: usize) -> Self {
        Self::Score(ScoreParams { min_score, limit })
    }

    pub fn nearby(lat: f64, lon: f64, radius_km: f64, limit: usize) -> Self {
        Self::Nearby(NearbyParams {
            lat,
            lon,
            radius_km,
            limit,
        })
    }

    /// The operation these parameters are for
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Category(_) => Endpoint::Category,
            Self::Search(_) => Endpoint::Search,
            Self::Source(_) => Endpoint::Source,
            Self::Score(_) => Endpoint::Score,
            Self::Nearby(_) => Endpoint::Nearby,
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            Self::Category(p) => p.limit,
            Self::Search(p) => p.limit,
            Self::Source(p) => p.limit,
            Self::Score(p) => p.limit,
            Self::Nearby(p) => p.limit,
        }
    }
}

/// Additional retrieval call of a `multiple` strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryEndpoint {
    pub endpoint: Endpoint,
    pub parameters: EndpointParams,
}

impl From<EndpointParams> for SecondaryEndpoint {
    fn from(parameters: EndpointParams) -> Self {
        Self {
            endpoint: parameters.endpoint(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Single,
    Multiple,
    Fallback,
}

/// Routing decision for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingStrategy {
    pub primary_endpoint: Endpoint,
    pub parameters: EndpointParams,
    /// Only used when `strategy_type` is `multiple`
    pub secondary_endpoints: Vec<SecondaryEndpoint>,
    pub strategy_type: StrategyType,
    pub confidence: f64,
}

impl RoutingStrategy {
    pub fn single(parameters: EndpointParams, confidence: f64) -> Self {
        Self {
            primary_endpoint: parameters.endpoint(),
            parameters,
            secondary_endpoints: Vec::new(),
            strategy_type: StrategyType::Single,
            confidence,
        }
    }

    pub fn multiple(
        parameters: EndpointParams,
        secondary_endpoints: Vec<SecondaryEndpoint>,
        confidence: f64,
    ) -> Self {
        Self {
            primary_endpoint: parameters.endpoint(),
            parameters,
            secondary_endpoints,
            strategy_type: StrategyType::Multiple,
            confidence,
        }
    }

    /// Generic search over [`FALLBACK_QUERY`]
    pub fn fallback(confidence: f64) -> Self {
        Self {
            primary_endpoint: Endpoint::Search,
            parameters: EndpointParams::search(FALLBACK_QUERY, DEFAULT_ENDPOINT_LIMIT),
            secondary_endpoints: Vec::new(),
            strategy_type: StrategyType::Fallback,
            confidence,
        }
    }
}

/// Map an analysis onto a routing strategy. Pure; confidence is carried through.
pub fn build_strategy(analysis: &QueryAnalysis) -> RoutingStrategy {
    let params = &analysis.parameters;
    let confidence = analysis.confidence;

    match analysis.intent {
        Intent::Category => RoutingStrategy::single(
            EndpointParams::category(
                params.category.as_deref().unwrap_or("general"),
                DEFAULT_ENDPOINT_LIMIT,
            ),
            confidence,
        ),
        Intent::Search => RoutingStrategy::single(
            EndpointParams::search(params.search_terms.join(" "), DEFAULT_ENDPOINT_LIMIT),
            confidence,
        ),
        Intent::Source => RoutingStrategy::single(
            EndpointParams::source(
                params.source.as_deref().unwrap_or_default(),
                DEFAULT_ENDPOINT_LIMIT,
            ),
            confidence,
        ),
        Intent::Score => RoutingStrategy::single(
            EndpointParams::score(
                params.min_score.unwrap_or(DEFAULT_MIN_SCORE),
                DEFAULT_ENDPOINT_LIMIT,
            ),
            confidence,
        ),
        Intent::Nearby => {
            let location = params.location.unwrap_or_default();
            RoutingStrategy::single(
                EndpointParams::nearby(
                    location.lat.unwrap_or(0.0),
                    location.lon.unwrap_or(0.0),
                    location.radius_km.unwrap_or(DEFAULT_RADIUS_KM),
                    DEFAULT_ENDPOINT_LIMIT,
                ),
                confidence,
            )
        }
        Intent::Mixed => {
            let primary = if params.search_terms.is_empty() {
                EndpointParams::search(FALLBACK_QUERY, DEFAULT_ENDPOINT_LIMIT)
            } else {
                EndpointParams::search(params.search_terms.join(" "), DEFAULT_ENDPOINT_LIMIT)
            };

            let mut secondary = Vec::new();
            if let Some(category) = &params.category {
                secondary.push(EndpointParams::category(category, SECONDARY_ENDPOINT_LIMIT).into());
            }
            if let Some(source) = &params.source {
                secondary.push(EndpointParams::source(source, SECONDARY_ENDPOINT_LIMIT).into());
            }

            RoutingStrategy::multiple(primary, secondary, confidence)
        }
    }
}
