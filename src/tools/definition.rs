// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool definition types
//!
//! Helpers for declaring tool input schemas statically.

use serde_json::{json, Value};

use crate::llm::provider::ToolInputSchema;

/// Helper to create a tool input schema
pub struct SchemaBuilder {
    properties: serde_json::Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            properties: serde_json::Map::new(),
            required: vec![],
        }
    }

    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Add a string property
    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "string", "description": description }),
            required,
        )
    }

    /// Add a string property restricted to `values`
    pub fn enumeration(
        self,
        name: &str,
        description: &str,
        values: &[&str],
        required: bool,
    ) -> Self {
        self.property(
            name,
            json!({ "type": "string", "description": description, "enum": values }),
            required,
        )
    }

    /// Add an integer property
    pub fn integer(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "integer", "description": description }),
            required,
        )
    }

    /// Add a boolean property
    pub fn boolean(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "boolean", "description": description }),
            required,
        )
    }

    /// Build the schema
    pub fn build(self) -> ToolInputSchema {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: Value::Object(self.properties),
            required: self.required,
        }
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
