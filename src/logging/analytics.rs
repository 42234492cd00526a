//! Analytics event forwarding

use super::redaction::{Redactable, Redactor};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Analytics event parameters
pub type AnalyticsParams = Map<String, Value>;

/// A single analytics parameter value.
pub enum AnalyticsValue<'a> {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point; non-finite values become `null`
    Float(f64),
    /// Text
    Text(Cow<'a, str>),
    /// Object, sent as its redacted description
    Object(&'a dyn Redactable),
}

impl AnalyticsValue<'_> {
    /// Convert to a JSON value, redacting objects with `redactor`
    pub fn to_json(&self, redactor: &Redactor) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(text) => Value::String(text.to_string()),
            Self::Object(object) => Value::String(redactor.describe(*object)),
        }
    }
}

impl fmt::Debug for AnalyticsValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Self::Object(o) => f.debug_tuple("Object").field(&o.type_name()).finish(),
        }
    }
}

impl From<bool> for AnalyticsValue<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AnalyticsValue<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for AnalyticsValue<'_> {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for AnalyticsValue<'_> {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for AnalyticsValue<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<'a> From<&'a str> for AnalyticsValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }
}

impl From<String> for AnalyticsValue<'_> {
    fn from(value: String) -> Self {
        Self::Text(Cow::Owned(value))
    }
}

impl<'a> From<&'a dyn Redactable> for AnalyticsValue<'a> {
    fn from(value: &'a dyn Redactable) -> Self {
        Self::Object(value)
    }
}

/// Build the parameter map for an event.
pub fn to_params(redactor: &Redactor, params: &[(&str, AnalyticsValue<'_>)]) -> AnalyticsParams {
    params
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_json(redactor)))
        .collect()
}

/// Analytics backend
pub trait AnalyticsSink: Send + Sync {
    /// Record an event
    fn log_event(&self, id: &str, params: &AnalyticsParams);
}

/// Memory analytics sink (for testing)
#[derive(Debug, Default)]
pub struct MemoryAnalytics {
    events: Mutex<Vec<(String, AnalyticsParams)>>,
}

impl MemoryAnalytics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events
    pub fn events(&self) -> Vec<(String, AnalyticsParams)> {
        self.recorded().clone()
    }

    /// Number of recorded events
    pub fn count(&self) -> usize {
        self.recorded().len()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<(String, AnalyticsParams)>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AnalyticsSink for MemoryAnalytics {
    fn log_event(&self, id: &str, params: &AnalyticsParams) {
        self.recorded().push((id.to_string(), params.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::redaction::Field;
    use serde_json::json;

    struct Purchase {
        sku: String,
        card: String,
    }

    impl Redactable for Purchase {
        fn safe_fields(&self) -> Option<&'static [&'static str]> {
            Some(&["sku"])
        }

        fn fields(&self) -> Vec<Field<'_>> {
            vec![Field::leaf("sku", &self.sku), Field::leaf("card", &self.card)]
        }
    }

    #[test]
    fn test_to_params() {
        let purchase = Purchase {
            sku: "A-1".to_string(),
            card: "4111".to_string(),
        };

        let params = to_params(
            &Redactor::default(),
            &[
                ("premium", true.into()),
                ("count", 3i64.into()),
                ("ratio", 0.5f64.into()),
                ("screen", "checkout".into()),
                ("purchase", AnalyticsValue::Object(&purchase)),
            ],
        );

        assert_eq!(params["premium"], json!(true));
        assert_eq!(params["count"], json!(3));
        assert_eq!(params["ratio"], json!(0.5));
        assert_eq!(params["screen"], json!("checkout"));
        assert_eq!(params["purchase"], json!("Purchase(sku=A-1, card=<redacted>)"));
    }

    #[test]
    fn test_non_finite_float_is_null() {
        let value = AnalyticsValue::Float(f64::NAN).to_json(&Redactor::default());
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_memory_analytics() {
        let sink = MemoryAnalytics::new();
        let mut params = AnalyticsParams::new();
        params.insert("k".to_string(), json!(1));

        sink.log_event("opened", &params);
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.events()[0].0, "opened");
    }
}
