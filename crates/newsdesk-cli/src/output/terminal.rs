//! Terminal output formatter

use newsdesk_core::{ArticleSummaryView, SmartQueryResponse};

pub fn format_articles(articles: &[ArticleSummaryView]) -> String {
    let mut output = String::new();

    for view in articles {
        let article = &view.article;
        let score_pct = (article.relevance_score * 100.0).round() as u32;
        output.push_str(&format!(
            "{:>3}% {} [{}] {}",
            score_pct,
            article.title,
            article.source_name,
            article.publication_date.format("%Y-%m-%d")
        ));
        if let Some(distance) = view.distance_km {
            output.push_str(&format!(" ({:.2} km)", distance));
        }
        output.push('\n');
        output.push_str(&format!("     {}\n", article.url));

        if let Some(ref summary) = article.llm_summary {
            for line in summary.lines() {
                output.push_str(&format!("     {}\n", line));
            }
        }
    }

    output
}

pub fn format_response(response: &SmartQueryResponse) -> String {
    let mut output = format_articles(&response.articles);

    if let (Some(analysis), Some(strategy)) = (&response.analysis, &response.routing_strategy) {
        output.push('\n');
        output.push_str(&format!(
            "Intent:     {} (confidence {:.2})\n",
            analysis.intent, analysis.confidence
        ));
        output.push_str(&format!("Reasoning:  {}\n", analysis.reasoning));
        output.push_str(&format!(
            "Routing:    {:?} via {}\n",
            strategy.strategy_type, strategy.primary_endpoint
        ));
        for secondary in &strategy.secondary_endpoints {
            output.push_str(&format!("            + {}\n", secondary.endpoint));
        }
    }

    output.push_str(&format!(
        "{} result(s) for \"{}\" in {}ms\n",
        response.total, response.query, response.processing_time_ms
    ));
    output
}
