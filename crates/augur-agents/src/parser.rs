use augur_models::{Analysis, Direction, Timeframe};
use serde_json::Value;

use crate::error::AgentError;

/// Extract the first JSON object from a string that may contain surrounding text.
///
/// Handles common model response formats:
/// - Clean JSON: `{"key": "value"}`
/// - Markdown-wrapped: ```json\n{"key": "value"}\n```
/// - Prefix text: `Here is the analysis:\n{"key": "value"}`
pub fn extract_json(text: &str) -> Result<String, AgentError> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && serde_json::from_str::<Value>(trimmed).is_ok() {
        return Ok(trimmed.to_string());
    }

    if let Some(json_str) = extract_from_markdown_block(trimmed) {
        if serde_json::from_str::<Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    if let Some(json_str) = extract_first_object(trimmed) {
        if serde_json::from_str::<Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    Err(AgentError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Extract the body of a ```json or plain ``` fence.
fn extract_from_markdown_block(text: &str) -> Option<String> {
    for marker in ["```json", "```JSON", "```"] {
        let Some(start) = text.find(marker) else {
            continue;
        };
        let body_start = start + marker.len();
        if let Some(end) = text[body_start..].find("```") {
            return Some(text[body_start..body_start + end].trim().to_string());
        }
    }
    None
}

/// Find the first balanced { ... } in the text, ignoring braces inside strings.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' if start.is_some() => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}

fn confidence_value(value: &Value) -> Result<f64, AgentError> {
    let confidence = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AgentError::Validation(format!("confidence is not numeric: {value}")))?;

    if !confidence.is_finite() || !(0.0..=100.0).contains(&confidence) {
        return Err(AgentError::Validation(format!(
            "confidence {confidence} outside [0, 100]"
        )));
    }
    Ok(confidence)
}

/// Parse and validate a model's raw reply into an [`Analysis`] for `expected`.
pub fn parse_analysis(raw: &str, expected: Timeframe) -> Result<Analysis, AgentError> {
    let json_str = extract_json(raw)?;
    let value: Value = serde_json::from_str(&json_str)?;

    let direction: Direction = value
        .get("direction")
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::Validation("missing direction".to_string()))?
        .parse()
        .map_err(AgentError::Validation)?;

    let confidence = value
        .get("confidence")
        .ok_or_else(|| AgentError::Validation("missing confidence".to_string()))
        .and_then(confidence_value)?;

    let timeframe: Timeframe = value
        .get("timeframe")
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::Validation("missing timeframe".to_string()))?
        .parse()
        .map_err(AgentError::Validation)?;
    if timeframe != expected {
        return Err(AgentError::Validation(format!(
            "timeframe {timeframe} does not match requested {expected}"
        )));
    }

    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(Analysis {
        direction,
        confidence,
        timeframe,
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_clean_json() {
        let input = r#"{"confidence": 75, "reasoning": "test"}"#;
        assert_eq!(extract_json(input).unwrap(), input);
    }

    #[test]
    fn extract_from_markdown() {
        let input = "Here is my analysis:\n```json\n{\"confidence\": 75}\n```\nDone.";
        assert_eq!(extract_json(input).unwrap(), r#"{"confidence": 75}"#);
    }

    #[test]
    fn extract_from_markdown_no_lang() {
        let input = "Result:\n```\n{\"confidence\": 75}\n```";
        assert_eq!(extract_json(input).unwrap(), r#"{"confidence": 75}"#);
    }

    #[test]
    fn extract_with_prefix_text() {
        let input = "Based on the data, my call is {\"direction\": \"bullish\"} as shown.";
        assert_eq!(extract_json(input).unwrap(), r#"{"direction": "bullish"}"#);
    }

    #[test]
    fn extract_with_braces_in_strings() {
        let input = r#"{"reasoning": "range went from {low} to {high}", "confidence": 50}"#;
        let parsed: Value = serde_json::from_str(&extract_json(input).unwrap()).unwrap();
        assert_eq!(parsed["confidence"], 50);
    }

    #[test]
    fn extract_no_json() {
        assert!(extract_json("I'd rather not say.").is_err());
    }

    #[test]
    fn parse_fenced_analysis() {
        let raw = "```json\n{\"direction\": \"Bullish\", \"confidence\": 72.5, \"timeframe\": \"24h\", \"reasoning\": \" Higher lows. \"}\n```";
        let analysis = parse_analysis(raw, Timeframe::Day).unwrap();
        assert_eq!(analysis.direction, Direction::Bullish);
        assert_eq!(analysis.confidence, 72.5);
        assert_eq!(analysis.timeframe, Timeframe::Day);
        assert_eq!(analysis.reasoning, "Higher lows.");
    }

    #[test]
    fn confidence_may_be_a_numeric_string() {
        let raw = r#"{"direction": "bearish", "confidence": "64%", "timeframe": "7d"}"#;
        let analysis = parse_analysis(raw, Timeframe::Week).unwrap();
        assert_eq!(analysis.confidence, 64.0);
        assert!(analysis.reasoning.is_empty());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let raw = r#"{"direction": "bullish", "confidence": 140, "timeframe": "24h"}"#;
        let err = parse_analysis(raw, Timeframe::Day).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[test]
    fn rejects_unknown_direction() {
        let raw = r#"{"direction": "sideways", "confidence": 40, "timeframe": "24h"}"#;
        assert!(matches!(
            parse_analysis(raw, Timeframe::Day).unwrap_err(),
            AgentError::Validation(_)
        ));
    }

    #[test]
    fn rejects_mismatched_timeframe() {
        let raw = r#"{"direction": "neutral", "confidence": 10, "timeframe": "30d"}"#;
        assert!(matches!(
            parse_analysis(raw, Timeframe::Day).unwrap_err(),
            AgentError::Validation(_)
        ));
    }

    #[test]
    fn rejects_missing_confidence() {
        let raw = r#"{"direction": "neutral", "timeframe": "24h"}"#;
        assert!(parse_analysis(raw, Timeframe::Day).is_err());
    }
}
