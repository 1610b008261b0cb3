// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Form Data
//!
//! The wizard's answers are kept as an open JSON object rather than a fixed
//! schema. Applicants save partial drafts all the time, so every accessor
//! here tolerates absent, null and wrongly-typed fields and reports them as
//! "not filled in" instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Known top-level field names.
pub mod fields {
    pub const ELIGIBILITY_CHECKS: &str = "eligibilityChecks";
    pub const PRIMARY_CONTACT: &str = "primaryContact";
    pub const SECONDARY_CONTACT: &str = "secondaryContact";
    pub const PROJECT_TYPE: &str = "projectType";
    pub const PROJECT_NAME: &str = "projectName";
    pub const WATER_BODY_NAME: &str = "waterBodyName";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const TRANSBASIN_DIVERSION: &str = "transbasinDiversion";
    pub const WATER_RIGHT_NUMBER: &str = "waterRightNumber";
    pub const WATER_RIGHT_FLOW_RATE: &str = "waterRightFlowRate";
    pub const HAS_DESIGN_DOCS: &str = "hasDesignDocs";
    /// Spelling written by older wizard builds; read as an alias of [`HAS_DESIGN_DOCS`].
    pub const HAS_DESIGN_DOCUMENTS: &str = "hasDesignDocuments";
    pub const HAS_COST_ESTIMATE: &str = "hasCostEstimate";
    pub const CERTIFICATIONS: &str = "certifications";

    /// Fields inside `primaryContact` / `secondaryContact`.
    pub mod contact {
        pub const NAME: &str = "name";
        pub const PHONE: &str = "phone";
        pub const MAILING_ADDRESS: &str = "mailingAddress";
        pub const EMAIL: &str = "email";
    }
}

#[derive(Debug, Error)]
pub enum FormDataError {
    #[error("Form data must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(Map<String, Value>);

impl FormData {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Accepts any JSON object. `null` is read as an empty form so that a
    /// create call without a body still yields a draft.
    pub fn from_value(value: Value) -> Result<Self, FormDataError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(FormDataError::NotAnObject(json_kind(&other))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Builder-style insert, handy when assembling patches.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Shallow merge: every top-level key of `partial` overwrites ours.
    /// Nested objects are replaced whole, never deep-merged.
    pub fn merge(&mut self, partial: FormData) {
        for (key, value) in partial.0 {
            self.0.insert(key, value);
        }
    }

    /// Present, not null and not the empty string.
    pub fn is_defined(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(is_defined)
    }

    /// Defined and, for strings/arrays/objects, non-empty.
    pub fn has_value(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(has_value)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// A nested object such as `primaryContact`.
    pub fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.0.get(key).and_then(Value::as_object)
    }

    /// Reads a boolean attestation list. Non-boolean entries count as
    /// unchecked; a missing or non-array field yields `None`.
    pub fn checklist(&self, key: &str) -> Option<Vec<bool>> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(|v| v.as_bool().unwrap_or(false)).collect())
    }

    /// Project name for listings; empty drafts have none.
    pub fn project_name(&self) -> Option<&str> {
        self.text(fields::PROJECT_NAME).filter(|s| !s.is_empty())
    }

    pub fn applicant_name(&self) -> Option<&str> {
        self.section(fields::PRIMARY_CONTACT)
            .and_then(|contact| contact.get(fields::contact::NAME))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl From<Map<String, Value>> for FormData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub fn is_defined(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

pub fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
