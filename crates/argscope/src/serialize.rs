//! Structured serialization of command results.
//!
//! Handles JSON, YAML, XML, and CSV rendering of the plain JSON data a
//! handler produced. CSV rendering flattens arrays of objects into rows
//! with a header line.

use serde::Serialize;
use thiserror::Error;

use crate::output::OutputFormat;

/// Errors that can occur during serialization.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("XML serialization failed: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("CSV serialization failed: {0}")]
    Csv(String),

    #[error("not a structured output format")]
    NotStructured,
}

/// Serializes data to the specified structured format.
///
/// Returns an error for [`OutputFormat::Auto`], which is resolved by
/// [`format_result`](crate::output::format_result) instead.
pub fn serialize_structured<T: Serialize>(
    data: &T,
    format: OutputFormat,
) -> Result<String, SerializeError> {
    match format {
        OutputFormat::Json => to_json(data),
        OutputFormat::Yaml => to_yaml(data),
        OutputFormat::Xml => to_xml(data),
        OutputFormat::Csv => serialize_csv(data),
        OutputFormat::Auto => Err(SerializeError::NotStructured),
    }
}

/// Serializes data to pretty-printed JSON.
pub fn to_json<T: Serialize>(data: &T) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Serializes data to YAML.
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String, SerializeError> {
    Ok(serde_yaml::to_string(data)?)
}

/// Serializes data to XML.
pub fn to_xml<T: Serialize>(data: &T) -> Result<String, SerializeError> {
    Ok(quick_xml::se::to_string(data)?)
}

/// Serializes data to CSV.
///
/// The data is converted to JSON first, then flattened for CSV output.
pub fn serialize_csv<T: Serialize>(data: &T) -> Result<String, SerializeError> {
    let json_value = serde_json::to_value(data)?;
    flatten_json_to_csv(&json_value)
}

fn flatten_json_to_csv(value: &serde_json::Value) -> Result<String, SerializeError> {
    use serde_json::Value;

    let mut writer = csv::Writer::from_writer(vec![]);

    match value {
        Value::Array(items) if !items.is_empty() => {
            if let Some(Value::Object(first)) = items.first() {
                let headers: Vec<&str> = first.keys().map(|s| s.as_str()).collect();
                writer
                    .write_record(&headers)
                    .map_err(|e| SerializeError::Csv(e.to_string()))?;

                for item in items {
                    if let Value::Object(object) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| object.get(*h).map(value_to_string).unwrap_or_default())
                            .collect();
                        writer
                            .write_record(&row)
                            .map_err(|e| SerializeError::Csv(e.to_string()))?;
                    }
                }
            } else {
                writer
                    .write_record(["value"])
                    .map_err(|e| SerializeError::Csv(e.to_string()))?;
                for item in items {
                    writer
                        .write_record(&[value_to_string(item)])
                        .map_err(|e| SerializeError::Csv(e.to_string()))?;
                }
            }
        }
        Value::Object(object) => {
            writer
                .write_record(["key", "value"])
                .map_err(|e| SerializeError::Csv(e.to_string()))?;
            for (key, val) in object {
                writer
                    .write_record([key.as_str(), &value_to_string(val)])
                    .map_err(|e| SerializeError::Csv(e.to_string()))?;
            }
        }
        _ => {
            writer
                .write_record(["value"])
                .map_err(|e| SerializeError::Csv(e.to_string()))?;
            writer
                .write_record(&[value_to_string(value)])
                .map_err(|e| SerializeError::Csv(e.to_string()))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SerializeError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SerializeError::Csv(e.to_string()))
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct TestData {
        name: String,
        count: i32,
    }

    #[test]
    fn test_to_json() {
        let data = TestData {
            name: "bolt".into(),
            count: 42,
        };
        let result = to_json(&data).unwrap();
        assert!(result.contains("\"name\": \"bolt\""));
        assert!(result.contains("\"count\": 42"));
    }

    #[test]
    fn test_to_yaml() {
        let data = TestData {
            name: "bolt".into(),
            count: 42,
        };
        let result = to_yaml(&data).unwrap();
        assert!(result.contains("name: bolt"));
        assert!(result.contains("count: 42"));
    }

    #[test]
    fn test_to_xml() {
        let data = TestData {
            name: "bolt".into(),
            count: 42,
        };
        let result = to_xml(&data).unwrap();
        assert!(result.contains("<name>bolt</name>"));
        assert!(result.contains("<count>42</count>"));
    }

    #[test]
    fn test_serialize_structured_rejects_auto() {
        let data = json!({"key": "value"});
        let result = serialize_structured(&data, OutputFormat::Auto);
        assert!(matches!(result, Err(SerializeError::NotStructured)));
    }

    #[test]
    fn test_csv_array_of_objects() {
        let data = json!([
            {"name": "bolt", "count": 3},
            {"name": "washer", "count": 7}
        ]);
        let result = serialize_csv(&data).unwrap();
        assert!(result.contains("name"));
        assert!(result.contains("count"));
        assert!(result.contains("bolt"));
        assert!(result.contains("washer"));
    }

    #[test]
    fn test_csv_single_object() {
        let data = json!({"name": "bolt", "count": 3});
        let result = serialize_csv(&data).unwrap();
        assert!(result.contains("key,value"));
        assert!(result.contains("name,bolt"));
        assert!(result.contains("count,3"));
    }

    #[test]
    fn test_csv_scalar() {
        let result = serialize_csv(&json!(5)).unwrap();
        assert!(result.contains("value"));
        assert!(result.contains('5'));
    }
}
