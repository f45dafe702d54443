use crate::model::{DamageLabel, ResponseRecord, Vocabulary};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected response format: expected a JSON array, got {0}")]
    NotAList(&'static str),
}

/// Remove Markdown code fences the model tends to wrap JSON in.
pub fn strip_fences(text: &str) -> &str {
    if let Some((_, rest)) = text.split_once("```json") {
        return rest.split("```").next().unwrap_or(rest).trim();
    }
    if let Some((_, rest)) = text.split_once("```") {
        return rest.split("```").next().unwrap_or(rest).trim();
    }
    text.trim()
}

/// Validate raw model output against the configured vocabulary.
///
/// Elements keep their position even when unusable, so positional matching
/// downstream stays aligned; unusable elements come back `Unclassified`.
pub fn parse_response(text: &str, vocab: Vocabulary) -> Result<Vec<ResponseRecord>, ResponseError> {
    let value: Value = serde_json::from_str(strip_fences(text))?;
    let items = match value {
        Value::Array(items) => items,
        other => return Err(ResponseError::NotAList(json_kind(&other))),
    };
    Ok(items.iter().map(|item| parse_record(item, vocab)).collect())
}

fn parse_record(item: &Value, vocab: Vocabulary) -> ResponseRecord {
    let Some(obj) = item.as_object() else {
        return ResponseRecord {
            uid: None,
            damage: DamageLabel::Unclassified,
            confidence: 0.0,
            description: format!("model returned a {} instead of an object", json_kind(item)),
        };
    };

    let uid = obj
        .get("uid")
        .and_then(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty());

    let raw_damage = obj.get("damage").and_then(Value::as_str);
    let label = raw_damage.and_then(DamageLabel::parse_loose);
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    match label {
        Some(l) if vocab.contains(l) => ResponseRecord {
            uid,
            damage: l,
            confidence: clamp_confidence(obj.get("confidence")),
            description,
        },
        _ => ResponseRecord {
            uid,
            damage: DamageLabel::Unclassified,
            confidence: 0.0,
            description: match raw_damage {
                Some(raw) => format!("model returned label outside vocabulary: {raw}"),
                None => "model returned no damage label".to_string(),
            },
        },
    }
}

fn clamp_confidence(v: Option<&Value>) -> f64 {
    let c = match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if c.is_finite() {
        c.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
