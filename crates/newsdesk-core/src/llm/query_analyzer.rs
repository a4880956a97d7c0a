//! Query analysis: free text (+ optional location) to structured intent

use super::LLMClient;
use crate::db::GeoPoint;
use crate::error::{NewsDeskError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Inferred purpose of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Category,
    Search,
    Source,
    Score,
    Nearby,
    Mixed,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Category,
        Intent::Search,
        Intent::Source,
        Intent::Score,
        Intent::Nearby,
        Intent::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Category => "category",
            Intent::Search => "search",
            Intent::Source => "source",
            Intent::Score => "score",
            Intent::Nearby => "nearby",
            Intent::Mixed => "mixed",
        }
    }

    /// Parse an intent label, case-insensitively
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|intent| intent.as_str() == label)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names extracted from the query, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entities {
    #[serde(deserialize_with = "one_or_many")]
    pub people: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub organizations: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub locations: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub topics: Vec<String>,
}

impl Entities {
    fn topics(topics: &[&str]) -> Self {
        Self {
            topics: topics.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Location extracted for geospatial queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationHint {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
}

/// Intent-specific values pulled out of the query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "one_or_many")]
    pub search_terms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationHint>,
}

/// Structured analysis of a query
///
/// Identical in shape whether it came from the LLM or the keyword heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub intent: Intent,
    pub entities: Entities,
    pub parameters: AnalysisParameters,
    /// Always within [0, 1]
    pub confidence: f64,
    pub reasoning: String,
}

impl QueryAnalysis {
    /// Search over the raw query, used when LLM output cannot be used
    pub fn fallback(query: &str) -> Self {
        Self::search_over(query, 0.3, "Fallback analysis due to LLM error".to_string())
    }

    /// Search over the raw query, used when analysis itself failed
    pub fn error(query: &str, message: &str) -> Self {
        Self::search_over(query, 0.1, format!("Error in analysis: {}", message))
    }

    fn search_over(query: &str, confidence: f64, reasoning: String) -> Self {
        Self {
            intent: Intent::Search,
            entities: Entities::topics(&["general"]),
            parameters: AnalysisParameters {
                search_terms: vec![query.to_string()],
                ..AnalysisParameters::default()
            },
            confidence,
            reasoning,
        }
    }
}

/// Accept either a single string or a list of strings
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a news query analyzer. Analyze user queries and extract structured information.

Return a JSON response with the following structure:
{
    "intent": "category|search|source|score|nearby|mixed",
    "entities": {
        "people": ["person1", "person2"],
        "organizations": ["org1", "org2"],
        "locations": ["location1", "location2"],
        "topics": ["topic1", "topic2"]
    },
    "parameters": {
        "category": "technology|business|sports|world|entertainment|national",
        "search_terms": ["term1", "term2"],
        "source": "source_name",
        "min_score": 0.0-1.0,
        "location": {"lat": float, "lon": float, "radius_km": float}
    },
    "confidence": 0.0-1.0,
    "reasoning": "explanation of analysis"
}

Guidelines:
- Intent: the primary intent (category, search, source, score, nearby, or mixed)
- Entities: key entities mentioned in the query
- Parameters: specific values needed for retrieval
- Location: if a place is mentioned, geocode it or use the provided coordinates
- Confidence: your confidence in the analysis (0.0-1.0)
- Reasoning: a short explanation

Examples:
Query: "Latest technology news from New York Times"
Response: {"intent": "mixed", "entities": {"organizations": ["New York Times"]}, "parameters": {"category": "technology", "source": "New York Times"}, "confidence": 0.9, "reasoning": "Combines category and source intent"}

Query: "Show me news about Elon Musk near Palo Alto"
Response: {"intent": "mixed", "entities": {"people": ["Elon Musk"], "locations": ["Palo Alto"]}, "parameters": {"search_terms": ["Elon Musk"], "location": {"lat": 37.4419, "lon": -122.1430, "radius_km": 10}}, "confidence": 0.8, "reasoning": "Combines search and location-based intent"}"#;

fn build_user_prompt(query: &str, location: Option<GeoPoint>) -> String {
    let mut prompt = format!("Analyze this news query: '{}'", query);
    if let Some(loc) = location {
        prompt.push_str(&format!(
            "\nUser location: {{\"lat\": {}, \"lon\": {}}}",
            loc.lat, loc.lon
        ));
    }
    prompt.push_str("\n\nProvide the JSON analysis as specified in the system prompt.");
    prompt
}

/// Shape of the LLM output before validation
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawAnalysis {
    intent: Option<String>,
    entities: Entities,
    parameters: AnalysisParameters,
    confidence: Option<f64>,
    reasoning: Option<String>,
}

/// Parse LLM text into a QueryAnalysis
///
/// Text starting with `{` is parsed as is; otherwise the span between the
/// first `{` and the last `}` is used. A missing intent means search; an
/// unknown intent label is an error.
pub fn parse_analysis_response(response: &str) -> Result<QueryAnalysis> {
    let trimmed = response.trim_start();
    let json_str = if trimmed.starts_with('{') {
        trimmed
    } else {
        match (response.find('{'), response.rfind('}')) {
            (Some(start), Some(end)) if start < end => &response[start..=end],
            _ => {
                return Err(NewsDeskError::Parse(
                    "No JSON object found in analysis response".to_string(),
                ))
            }
        }
    };

    let raw: RawAnalysis = serde_json::from_str(json_str)
        .map_err(|e| NewsDeskError::Parse(format!("Invalid analysis JSON: {}", e)))?;

    let intent = match raw.intent.as_deref() {
        None => Intent::Search,
        Some(label) => Intent::from_label(label).ok_or_else(|| {
            NewsDeskError::Parse(format!("Unknown intent label: {}", label))
        })?,
    };

    let confidence = raw.confidence.unwrap_or(0.0);
    Ok(QueryAnalysis {
        intent,
        entities: raw.entities,
        parameters: raw.parameters,
        confidence: if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        },
        reasoning: raw.reasoning.unwrap_or_default(),
    })
}

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("technology", &["technology", "tech", "ai", "software"]),
    ("business", &["business", "economy", "finance", "market"]),
    ("sports", &["sports", "football", "cricket", "game"]),
    ("world", &["world", "international", "global"]),
    ("entertainment", &["entertainment", "movie", "music", "celebrity"]),
];

/// Two-letter keywords like "ai" must match a whole word; longer ones match anywhere
///
/// This intentionally departs from plain substring matching, which would file
/// "email", "aid" and "said" under technology.
fn keyword_matches(lower_query: &str, keyword: &str) -> bool {
    if keyword.len() <= 2 {
        lower_query
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        lower_query.contains(keyword)
    }
}

/// Keyword heuristic used when no LLM is configured
pub fn heuristic_analysis(query: &str) -> QueryAnalysis {
    let lower = query.to_lowercase();

    for &(category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| keyword_matches(&lower, k)) {
            return QueryAnalysis {
                intent: Intent::Category,
                entities: Entities::topics(&[category]),
                parameters: AnalysisParameters {
                    category: Some(category.to_string()),
                    ..AnalysisParameters::default()
                },
                confidence: 0.6,
                reasoning: format!("Fallback analysis: detected {} keywords", category),
            };
        }
    }

    QueryAnalysis::search_over(query, 0.4, "Fallback analysis: default to search".to_string())
}

/// Converts queries into [`QueryAnalysis`], with or without an LLM
pub struct QueryAnalyzer {
    client: Option<Arc<dyn LLMClient>>,
}

impl QueryAnalyzer {
    /// Create from LLM client
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Analyzer that only uses keyword heuristics
    pub fn heuristic() -> Self {
        Self { client: None }
    }

    pub fn with_client(client: Option<Arc<dyn LLMClient>>) -> Self {
        Self { client }
    }

    pub fn is_llm_backed(&self) -> bool {
        self.client.is_some()
    }

    /// Analyze a query; never fails
    pub async fn analyze(&self, query: &str, location: Option<GeoPoint>) -> QueryAnalysis {
        let Some(client) = &self.client else {
            let analysis = heuristic_analysis(query);
            tracing::debug!("Heuristic analysis: {}", analysis.reasoning);
            return analysis;
        };

        let user_prompt = build_user_prompt(query, location);
        let mut analysis = match client.complete(ANALYSIS_SYSTEM_PROMPT, &user_prompt).await {
            Ok(response) => match parse_analysis_response(&response) {
                Ok(analysis) => analysis,
                Err(e) => {
                    tracing::warn!("Failed to parse analysis response: {}", e);
                    tracing::debug!("Response was: {}", response);
                    QueryAnalysis::fallback(query)
                }
            },
            Err(e) => {
                tracing::warn!("Query analysis call failed: {}", e);
                QueryAnalysis::fallback(query)
            }
        };

        if analysis.intent == Intent::Nearby {
            fill_location(&mut analysis.parameters, location);
        }

        tracing::info!(
            "Query analysis completed: {} with confidence {}",
            analysis.intent,
            analysis.confidence
        );
        analysis
    }
}

/// Request coordinates fill in whatever the analysis left out
fn fill_location(parameters: &mut AnalysisParameters, location: Option<GeoPoint>) {
    let Some(point) = location else {
        return;
    };
    let hint = parameters.location.get_or_insert_with(LocationHint::default);
    if hint.lat.is_none() || hint.lon.is_none() {
        hint.lat = Some(point.lat);
        hint.lon = Some(point.lon);
    }
}
