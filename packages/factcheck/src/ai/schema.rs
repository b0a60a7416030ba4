//! JSON schemas for structured operator outputs.
//!
//! OpenAI strict mode requires `additionalProperties: false` on every object,
//! every property listed in `required`, and no `$ref` indirection. The schema
//! `schemars` derives is rewritten to satisfy all three.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A response type an operator can request as structured output.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode compatible schema for this type.
    fn openai_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        close_objects(&mut value);

        let definitions = value.get("definitions").cloned();
        if let Some(defs) = definitions {
            inline_refs(&mut value, &defs);
        }

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }

    /// Schema name sent with the request.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                let keys: Option<Vec<Value>> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect());
                if let Some(keys) = keys {
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for v in map.values_mut() {
                close_objects(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_objects),
        _ => {}
    }
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();

            if let Some(def) = target {
                *value = def;
                inline_refs(value, definitions);
                return;
            }

            for v in map.values_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| inline_refs(v, definitions)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::answer::AnswerDraft;

    #[test]
    fn test_answer_schema_is_strict() {
        let schema = AnswerDraft::openai_schema();
        let text = schema.to_string();

        assert!(!text.contains("$ref"));
        assert!(schema.get("definitions").is_none());
        assert_eq!(schema["additionalProperties"], Value::Bool(false));

        let citation = &schema["properties"]["citations"]["items"];
        assert_eq!(citation["additionalProperties"], Value::Bool(false));
        assert_eq!(citation["required"].as_array().map(Vec::len), Some(3));
    }
}
