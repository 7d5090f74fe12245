//! Merging of multi-agent responses and response well-formedness checks.

use crate::model::{keys, Metadata, MetadataValue, Response, AGGREGATED_AGENT_ID};
use std::fmt::Write;

const RULE_WIDTH: usize = 40;

/// Merges fan-out responses into one.
///
/// * empty input yields an error-marked "no responses" response;
/// * a single response is returned unchanged;
/// * otherwise the merged response takes the id and category of the most
///   confident response (first one on ties), the mean confidence and the
///   summed processing time (saturating at `u64::MAX`), and its content
///   enumerates every input in order.
pub fn merge(responses: &[Response]) -> Response {
    let (first, rest) = match responses.split_first() {
        None => return empty_response(),
        Some((only, [])) => return only.clone(),
        Some(split) => split,
    };

    let best = rest
        .iter()
        .fold(first, |best, r| if r.confidence > best.confidence { r } else { best });
    let mean_confidence = responses.iter().map(|r| r.confidence).sum::<f64>() / responses.len() as f64;
    let total_time = responses
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.processing_time_ms));

    let mut metadata = Metadata::new();
    metadata.insert(keys::AGGREGATED.to_string(), MetadataValue::Bool(true));
    metadata.insert(keys::AGENT_COUNT.to_string(), MetadataValue::from(responses.len()));
    metadata.insert(keys::BEST_AGENT_ID.to_string(), MetadataValue::from(best.agent_id.as_str()));

    Response {
        id: best.id.clone(),
        agent_id: AGGREGATED_AGENT_ID.to_string(),
        content: render_composite(responses, best.confidence, mean_confidence, total_time),
        confidence: mean_confidence,
        category: best.category,
        processing_time_ms: total_time,
        metadata,
    }
}

fn render_composite(responses: &[Response], best: f64, mean: f64, total_time: u64) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Comprehensive AI Analysis:");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    for (index, response) in responses.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n{}. {} (Confidence: {})",
            index + 1,
            response.agent_display_name(),
            percent(response.confidence)
        );
        let _ = writeln!(out, "{}", response.content);
        let _ = writeln!(out, "{}", rule);
    }

    let _ = writeln!(out, "\nSummary:");
    let _ = writeln!(out, "- Best Response Confidence: {}", percent(best));
    let _ = writeln!(out, "- Average Confidence: {}", percent(mean));
    let _ = writeln!(out, "- Total Processing Time: {}ms", total_time);
    out
}

fn percent(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

fn empty_response() -> Response {
    Response::error("empty", "No responses were generated.")
}

/// A response is well formed when it has non-blank content, a confidence
/// within `[0, 1]` and no error marker.
pub fn validate(response: &Response) -> bool {
    !response.content.trim().is_empty()
        && (0.0..=1.0).contains(&response.confidence)
        && !response.is_error()
}

/// Human-readable block for a single response.
pub fn format_response(response: &Response) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "AI Agent Response");
    let _ = writeln!(out, "Agent: {}", response.agent_display_name());
    let _ = writeln!(out, "Topic: {}", response.category);
    let _ = writeln!(out, "Confidence: {}", percent(response.confidence));
    let _ = writeln!(out, "Processing Time: {}ms", response.processing_time_ms);
    let _ = writeln!(out);
    let _ = writeln!(out, "Response:");
    let _ = writeln!(out, "{}", response.content);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, SYSTEM_AGENT_ID};

    fn response(agent: &str, confidence: f64, time: u64) -> Response {
        Response {
            id: format!("req-{}", agent),
            agent_id: agent.to_string(),
            content: format!("answer from {}", agent),
            confidence,
            category: Category::Science,
            processing_time_ms: time,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_merge_empty() {
        let merged = merge(&[]);
        assert_eq!(merged.confidence, 0.0);
        assert!(merged.is_error());
        assert_eq!(merged.agent_id, SYSTEM_AGENT_ID);
        assert_eq!(merged.category, Category::General);
        assert_eq!(merged.content, "No responses were generated.");
    }

    #[test]
    fn test_merge_single_is_identity() {
        let mut r = response("solo", 0.3, 12);
        r.metadata.insert("custom".to_string(), MetadataValue::Int(7));
        assert_eq!(merge(std::slice::from_ref(&r)), r);
    }

    #[test]
    fn test_merge_saturates_total_time() {
        let merged = merge(&[response("slow", 0.5, u64::MAX), response("fast", 0.5, 1)]);
        assert_eq!(merged.processing_time_ms, u64::MAX);
        assert!(merged.content.contains(&format!("Total Processing Time: {}ms", u64::MAX)));
    }

    #[test]
    fn test_merge_two() {
        let r1 = response("first", 0.8, 100);
        let mut r2 = response("second", 0.6, 250);
        r2.category = Category::Health;

        let merged = merge(&[r1.clone(), r2]);
        assert!((merged.confidence - 0.7).abs() < 1e-9);
        assert_eq!(merged.agent_id, AGGREGATED_AGENT_ID);
        assert_eq!(merged.id, r1.id);
        assert_eq!(merged.category, Category::Science);
        assert_eq!(merged.processing_time_ms, 350);
        assert_eq!(
            merged.metadata.get(keys::BEST_AGENT_ID).and_then(MetadataValue::as_str),
            Some("first")
        );
        assert_eq!(merged.metadata.get(keys::AGENT_COUNT).and_then(MetadataValue::as_i64), Some(2));
        assert_eq!(merged.metadata.get(keys::AGGREGATED).and_then(MetadataValue::as_bool), Some(true));
        assert!(!merged.is_error());
    }

    #[test]
    fn test_merge_picks_first_of_tied_best() {
        let merged = merge(&[response("a", 0.5, 1), response("b", 0.9, 1), response("c", 0.9, 1)]);
        assert_eq!(
            merged.metadata.get(keys::BEST_AGENT_ID).and_then(MetadataValue::as_str),
            Some("b")
        );
        assert_eq!(merged.id, "req-b");
    }

    #[test]
    fn test_merge_content_enumerates_in_input_order() {
        let mut named = response("x1", 0.25, 10);
        named
            .metadata
            .insert(keys::AGENT_NAME.to_string(), MetadataValue::from("Named Agent"));
        let merged = merge(&[named, response("x2", 0.75, 20)]);

        let first = merged.content.find("1. Named Agent (Confidence: 25.0%)").unwrap();
        let second = merged.content.find("2. x2 (Confidence: 75.0%)").unwrap();
        assert!(first < second);
        assert!(merged.content.contains("answer from x1"));
        assert!(merged.content.contains("Best Response Confidence: 75.0%"));
        assert!(merged.content.contains("Average Confidence: 50.0%"));
        assert!(merged.content.contains("Total Processing Time: 30ms"));
    }

    #[test]
    fn test_validate() {
        assert!(validate(&response("ok", 0.85, 100)));

        let mut blank = response("blank", 0.5, 1);
        blank.content = "   ".to_string();
        assert!(!validate(&blank));

        assert!(!validate(&response("over", 1.5, 1)));
        assert!(!validate(&Response::error("e", "failed")));
    }

    #[test]
    fn test_format_response() {
        let mut r = response("fmt", 0.5, 42);
        r.metadata
            .insert(keys::AGENT_NAME.to_string(), MetadataValue::from("Formatter"));
        let text = format_response(&r);
        assert!(text.contains("Agent: Formatter"));
        assert!(text.contains("Topic: SCIENCE"));
        assert!(text.contains("Confidence: 50.0%"));
        assert!(text.contains("Processing Time: 42ms"));
        assert!(text.ends_with("answer from fmt\n"));
    }
}
