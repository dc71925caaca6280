use serde_json::{Map, Value, json};
use std::sync::Arc;

fn to_map(schema: Value) -> Arc<Map<String, Value>> {
    Arc::new(schema.as_object().cloned().unwrap_or_else(Map::new))
}

pub fn feature_label_identifier_schema() -> Arc<Map<String, Value>> {
    to_map(json!({
        "type": "object",
        "properties": {
            "instructions": {
                "type": "string",
                "description": "What the user wants to predict or analyse"
            }
        },
        "required": ["instructions"]
    }))
}

pub fn notebook_generation_schema() -> Arc<Map<String, Value>> {
    to_map(json!({
        "type": "object",
        "properties": {
            "instructions": {
                "type": "string",
                "description": "What the generated notebook should do with X and y"
            }
        },
        "required": ["instructions"]
    }))
}

pub fn text_file_ingest_schema() -> Arc<Map<String, Value>> {
    to_map(json!({
        "type": "object",
        "properties": {
            "query": {"type": "string"},
            "top_k": {"type": ["integer", "number", "string"], "minimum": 1, "maximum": 50}
        },
        "required": ["query"]
    }))
}

pub fn detailed_help_schema() -> Arc<Map<String, Value>> {
    to_map(json!({
        "type": "object",
        "properties": {
            "tool": {
                "type": "string",
                "enum": ["feature_label_identifier", "notebook_generation", "text_file_ingest"]
            },
            "format": {"type": "string", "enum": ["full", "compact"], "default": "full"}
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_tools_require_instructions() {
        for schema in [feature_label_identifier_schema(), notebook_generation_schema()] {
            assert_eq!(schema["type"], "object");
            assert_eq!(schema["required"], json!(["instructions"]));
            assert_eq!(schema["properties"]["instructions"]["type"], "string");
        }
    }

    #[test]
    fn ingest_schema_requires_query() {
        let schema = text_file_ingest_schema();
        assert_eq!(schema["required"], json!(["query"]));
        assert!(schema["properties"].get("top_k").is_some());
    }

    #[test]
    fn help_schema_lists_every_tool() {
        let schema = detailed_help_schema();
        let tools = schema["properties"]["tool"]["enum"].as_array().unwrap();
        assert_eq!(tools.len(), 3);
        assert!(schema.get("required").is_none());
    }
}
