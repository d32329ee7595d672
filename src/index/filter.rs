//! Declarative metadata filters
//!
//! Supports equality plus `$gte`, `$lte` and `$in` operators per key. A key
//! missing from a document's metadata never matches.

use serde_json::Value;

use crate::errors::{RagError, Result};
use crate::types::{DocumentMetadata, SourceKind};

const FLOAT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(Value),
    Gte(f64),
    Lte(f64),
    In(Vec<Value>),
}

impl Condition {
    fn matches(&self, actual: &Value) -> bool {
        match self {
            Condition::Eq(expected) => values_equal(actual, expected),
            Condition::Gte(bound) => actual.as_f64().map_or(false, |v| v >= *bound - FLOAT_EPSILON),
            Condition::Lte(bound) => actual.as_f64().map_or(false, |v| v <= *bound + FLOAT_EPSILON),
            Condition::In(options) => options.iter().any(|o| values_equal(actual, o)),
        }
    }
}

/// Conjunction of per-key conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: Vec<(String, Condition)>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((key.into(), Condition::Eq(value.into())));
        self
    }

    pub fn gte(mut self, key: impl Into<String>, bound: f64) -> Self {
        self.conditions.push((key.into(), Condition::Gte(bound)));
        self
    }

    pub fn lte(mut self, key: impl Into<String>, bound: f64) -> Self {
        self.conditions.push((key.into(), Condition::Lte(bound)));
        self
    }

    pub fn one_of(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push((key.into(), Condition::In(values)));
        self
    }

    /// Restrict to the given source kinds
    pub fn source_kinds(self, kinds: &[SourceKind]) -> Self {
        let values = kinds
            .iter()
            .map(|k| Value::String(k.as_str().to_string()))
            .collect();
        self.one_of("source_kind", values)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, metadata: &DocumentMetadata) -> bool {
        self.conditions.iter().all(|(key, condition)| {
            metadata
                .get(key)
                .map_or(false, |actual| condition.matches(&actual))
        })
    }

    /// Parse a Mongo-style filter object such as
    /// `{"source_kind": "skill", "confidence": {"$gte": 0.75}}`
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| RagError::ConfigError("filter must be a JSON object".to_string()))?;

        let mut filter = MetadataFilter::new();
        for (key, condition) in object {
            match condition {
                Value::Object(ops) => {
                    for (op, operand) in ops {
                        filter = match op.as_str() {
                            "$gte" => filter.gte(key.clone(), number_operand(key, op, operand)?),
                            "$lte" => filter.lte(key.clone(), number_operand(key, op, operand)?),
                            "$in" => {
                                let options = operand.as_array().ok_or_else(|| {
                                    RagError::ConfigError(format!("'{}.$in' expects an array", key))
                                })?;
                                filter.one_of(key.clone(), options.clone())
                            }
                            "$eq" => filter.eq(key.clone(), operand.clone()),
                            other => {
                                return Err(RagError::ConfigError(format!(
                                    "unsupported filter operator '{}' on '{}'",
                                    other, key
                                )))
                            }
                        };
                    }
                }
                direct => filter = filter.eq(key.clone(), direct.clone()),
            }
        }
        Ok(filter)
    }
}

fn number_operand(key: &str, op: &str, operand: &Value) -> Result<f64> {
    operand
        .as_f64()
        .ok_or_else(|| RagError::ConfigError(format!("'{}.{}' expects a number", key, op)))
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < FLOAT_EPSILON,
        _ => actual == expected,
    }
}
