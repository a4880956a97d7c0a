//! Deterministic completions served when every endpoint is unreachable

use serde_json::json;

/// Plain-text completion returned for summarization requests
pub const MOCK_SUMMARY: &str = "This is a mock summary generated for testing purposes. \
     The article discusses important developments in the news industry.";

/// Mock completion for an instruction/message pair
///
/// Instructions mentioning "analyze" get a JSON analysis keyed off the
/// user message; everything else gets [`MOCK_SUMMARY`].
pub fn mock_response(system: &str, user: &str) -> String {
    if system.to_lowercase().contains("analyze") {
        mock_analysis(user)
    } else {
        MOCK_SUMMARY.to_string()
    }
}

fn mock_analysis(user: &str) -> String {
    let query = user.to_lowercase();

    let analysis = if query.contains("technology") || query.contains("tech") {
        json!({
            "intent": "category",
            "entities": {"topics": ["technology"]},
            "parameters": {"category": "technology"},
            "confidence": 0.8,
            "reasoning": "Detected technology category intent"
        })
    } else if query.contains("search") || query.contains("about") {
        json!({
            "intent": "search",
            "entities": {"topics": ["general"]},
            "parameters": {"search_terms": ["news"]},
            "confidence": 0.7,
            "reasoning": "Detected search intent"
        })
    } else {
        json!({
            "intent": "category",
            "entities": {"topics": ["general"]},
            "parameters": {"category": "general"},
            "confidence": 0.6,
            "reasoning": "Default to general category"
        })
    };

    analysis.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_instruction_gets_plain_text() {
        assert_eq!(mock_response("Summarize this article", "Title: x"), MOCK_SUMMARY);
    }

    #[test]
    fn test_analysis_instruction_gets_json() {
        let text = mock_response("Analyze the query", "news about Elon Musk");
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["intent"], "search");
        assert_eq!(value["parameters"]["search_terms"][0], "news");
        assert_eq!(value["confidence"], 0.7);

        let text = mock_response("ANALYZE", "cricket scores");
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["parameters"]["category"], "general");
    }
}
