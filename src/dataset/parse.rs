use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::explore::{PointId, UNKNOWN_LABEL};

#[derive(Clone, Debug, Default, Deserialize)]
struct RawPointRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    x: Option<Value>,
    #[serde(default)]
    y: Option<Value>,
    #[serde(default)]
    vector: Option<Value>,
    #[serde(default)]
    label: Option<Value>,
    #[serde(default)]
    topic: Option<Value>,
    #[serde(default)]
    text: Option<Value>,
}

/// A point record with its id canonicalized and its coordinates parsed, but
/// not yet positioned.
#[derive(Clone, Debug, PartialEq)]
pub struct PointRecord {
    pub id: PointId,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub vector: Option<Vec<Option<f64>>>,
    pub label: String,
    pub topic: Option<String>,
    pub text: Option<String>,
}

impl PointRecord {
    /// A record with only an id and a label; handy for callers building
    /// datasets in code.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: PointId::new(id),
            x: None,
            y: None,
            vector: None,
            label: label.into(),
            topic: None,
            text: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ParsedRecords {
    pub records: Vec<PointRecord>,
    pub skipped_lines: usize,
}

/// Parses newline-delimited point records.
///
/// A single JSON array document is accepted as well. Lines that do not hold a
/// JSON object are skipped and counted rather than failing the whole load.
pub fn parse_point_records(raw: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    let mut unnamed = Vec::new();

    let trimmed = raw.trim_start();
    if trimmed.starts_with('[')
        && let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed)
    {
        for (index, item) in items.into_iter().enumerate() {
            push_record(&mut parsed, &mut unnamed, index, item);
        }
    } else {
        for (index, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(line) {
                Ok(value) => push_record(&mut parsed, &mut unnamed, index, value),
                Err(error) => {
                    warn!(line = index + 1, %error, "skipping malformed point record");
                    parsed.skipped_lines += 1;
                }
            }
        }
    }

    name_unnamed(&mut parsed.records, &unnamed);
    parsed
}

fn push_record(
    parsed: &mut ParsedRecords,
    unnamed: &mut Vec<(usize, usize)>,
    index: usize,
    value: Value,
) {
    if !value.is_object() {
        warn!(line = index + 1, "skipping point record that is not an object");
        parsed.skipped_lines += 1;
        return;
    }

    match RawPointRecord::deserialize(&value) {
        Ok(raw) => {
            let record = into_record(raw);
            if record.id.as_str().is_empty() {
                unnamed.push((parsed.records.len(), index));
            }
            parsed.records.push(record);
        }
        Err(error) => {
            warn!(line = index + 1, %error, "skipping unreadable point record");
            parsed.skipped_lines += 1;
        }
    }
}

/// Gives id-less records a `row-<line>` id that no other record uses.
fn name_unnamed(records: &mut [PointRecord], unnamed: &[(usize, usize)]) {
    let mut taken = records
        .iter()
        .filter(|record| !record.id.as_str().is_empty())
        .map(|record| record.id.clone())
        .collect::<HashSet<_>>();

    for &(position, line) in unnamed {
        let base = format!("row-{line}");
        let mut candidate = PointId::new(base.clone());
        let mut suffix = 1;
        while taken.contains(&candidate) {
            candidate = PointId::new(format!("{base}~{suffix}"));
            suffix += 1;
        }
        taken.insert(candidate.clone());
        records[position].id = candidate;
    }
}

fn into_record(raw: RawPointRecord) -> PointRecord {
    let id = raw
        .id
        .as_ref()
        .and_then(canonical_id)
        .unwrap_or_else(|| PointId::new(String::new()));

    let vector = match raw.vector {
        Some(Value::Array(items)) => Some(items.iter().map(number_like).collect()),
        _ => None,
    };

    PointRecord {
        id,
        x: raw.x.as_ref().and_then(number_like),
        y: raw.y.as_ref().and_then(number_like),
        vector,
        label: raw
            .label
            .as_ref()
            .and_then(text_like)
            .unwrap_or_else(|| UNKNOWN_LABEL.to_owned()),
        topic: raw.topic.as_ref().and_then(text_like),
        text: raw.text.as_ref().and_then(text_like),
    }
}

/// Folds a string or numeric id into its canonical textual form.
///
/// Integral JSON numbers render without a fraction, so `12` and `12.0` match
/// the string `"12"`. Strings are only trimmed: `"007"` and `"1e3"` stay
/// distinct from `7` and `1000`.
pub fn canonical_id(value: &Value) -> Option<PointId> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| PointId::new(text))
        }
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(PointId::new(int.to_string()))
            } else if let Some(int) = number.as_u64() {
                Some(PointId::new(int.to_string()))
            } else {
                let float = number.as_f64()?;
                if float.fract() == 0.0 && float.abs() < 9.0e15 {
                    Some(PointId::new(format!("{}", float as i64)))
                } else {
                    Some(PointId::new(float.to_string()))
                }
            }
        }
        _ => None,
    }
}

fn number_like(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn text_like(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_owned(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_ndjson_and_skips_garbage() {
        let raw = r#"
{"id": 1, "x": 0.5, "y": "1.5", "label": "a", "topic": "Alpha", "text": "hello"}
not json at all
{"id": "doc-2", "vector": [3, 4, 5], "label": "b"}
[1, 2]
"#;
        let parsed = parse_point_records(raw);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped_lines, 2);

        let first = &parsed.records[0];
        assert_eq!(first.id.as_str(), "1");
        assert_eq!(first.x, Some(0.5));
        assert_eq!(first.y, Some(1.5));
        assert_eq!(first.topic.as_deref(), Some("Alpha"));

        let second = &parsed.records[1];
        assert_eq!(second.vector, Some(vec![Some(3.0), Some(4.0), Some(5.0)]));
        assert_eq!(second.x, None);
    }

    #[test]
    fn accepts_json_array_documents() {
        let parsed = parse_point_records(r#"[{"id": "a", "label": "x"}, {"id": "b"}]"#);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[1].label, UNKNOWN_LABEL);
    }

    #[test]
    fn numeric_and_string_ids_share_one_form() {
        assert_eq!(canonical_id(&json!(12)), Some(PointId::new("12")));
        assert_eq!(canonical_id(&json!(12.0)), Some(PointId::new("12")));
        assert_eq!(canonical_id(&json!(" 12 ")), Some(PointId::new("12")));
        assert_eq!(canonical_id(&json!(1.5)), Some(PointId::new("1.5")));
        assert_eq!(canonical_id(&json!("abc")), Some(PointId::new("abc")));
        assert_eq!(canonical_id(&json!("007")), Some(PointId::new("007")));
        assert_eq!(canonical_id(&json!("1e3")), Some(PointId::new("1e3")));
        assert_eq!(canonical_id(&json!(1e3)), Some(PointId::new("1000")));
        assert_eq!(canonical_id(&json!("")), None);
        assert_eq!(canonical_id(&json!(null)), None);
    }

    #[test]
    fn missing_id_falls_back_to_row_index() {
        let parsed = parse_point_records("{\"label\": \"a\"}\n\n{\"label\": \"b\"}");
        assert_eq!(parsed.records[0].id.as_str(), "row-0");
        assert_eq!(parsed.records[1].id.as_str(), "row-2");
    }

    #[test]
    fn fallback_ids_skip_ids_already_in_use() {
        let parsed = parse_point_records(
            r#"{"label": "a"}
{"id": "row-0", "label": "b"}
{"id": "row-0~1"}"#,
        );
        let ids = parsed
            .records
            .iter()
            .map(|record| record.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["row-0~2", "row-0", "row-0~1"]);
    }

    #[test]
    fn zero_padded_and_exponent_ids_stay_distinct() {
        let parsed = parse_point_records(
            r#"{"id": "007"}
{"id": 7}
{"id": "1e3"}
{"id": 1000}"#,
        );
        let ids = parsed
            .records
            .iter()
            .map(|record| record.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["007", "7", "1e3", "1000"]);
    }

    #[test]
    fn non_finite_and_non_numeric_coordinates_are_dropped() {
        let parsed = parse_point_records(r#"{"id": 1, "x": "NaN", "y": "abc", "label": 7}"#);
        let record = &parsed.records[0];
        assert_eq!(record.x, None);
        assert_eq!(record.y, None);
        assert_eq!(record.label, "7");
    }
}
