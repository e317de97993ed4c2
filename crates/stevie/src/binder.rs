//! Binding of declared parameter names to payload values.

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{StevieError, StevieResult};
use crate::payload::Payload;

/// A declared parameter paired with the payload value found for it.
///
/// Absence is represented, not rejected. Handlers narrow the value
/// themselves through the accessors below.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArg {
    name: String,
    value: Option<Value>,
}

impl BoundArg {
    pub fn new(name: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// An argument whose key was missing from the payload.
    pub fn absent(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// The value, or `MissingArgument` when the payload lacked the key.
    pub fn require(&self) -> StevieResult<&Value> {
        self.value
            .as_ref()
            .ok_or_else(|| StevieError::MissingArgument(self.name.clone()))
    }

    /// The value if it is a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    /// Deserialize the value into `T`. No coercion is attempted, so a query
    /// string `"3"` does not parse as a number.
    pub fn parse<T: DeserializeOwned>(&self) -> StevieResult<T> {
        let value = self.require()?.clone();
        serde_json::from_value(value).map_err(|e| StevieError::InvalidArgument {
            name: self.name.clone(),
            message: e.to_string(),
        })
    }
}

impl Serialize for BoundArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// Produce one bound argument per name, in order.
///
/// `names` must already exclude the response slot.
pub fn bind_arguments(names: &[String], payload: &Payload) -> Vec<BoundArg> {
    names
        .iter()
        .map(|name| BoundArg::new(name.clone(), payload.get(name).cloned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bind_preserves_order_and_absence() {
        let payload = crate::payload::payload_from_value(json!({"a": 1}));
        let bound = bind_arguments(&names(&["a", "b"]), &payload);
        assert_eq!(
            bound,
            vec![BoundArg::new("a", Some(json!(1))), BoundArg::absent("b")]
        );
    }

    #[test]
    fn test_bind_empty_names() {
        let payload = crate::payload::payload_from_value(json!({"a": 1}));
        assert!(bind_arguments(&[], &payload).is_empty());
    }

    #[test]
    fn test_bind_explicit_null_is_present() {
        let payload = crate::payload::payload_from_value(json!({"a": null}));
        let bound = bind_arguments(&names(&["a"]), &payload);
        assert!(bound[0].is_present());
        assert_eq!(bound[0].value(), Some(&Value::Null));
    }

    #[test]
    fn test_require_missing() {
        let err = BoundArg::absent("id").require().unwrap_err();
        assert!(matches!(err, StevieError::MissingArgument(ref n) if n == "id"));
    }

    #[test]
    fn test_parse_typed() {
        let arg = BoundArg::new("count", Some(json!(3)));
        assert_eq!(arg.parse::<u32>().unwrap(), 3);

        let text = BoundArg::new("count", Some(json!("3")));
        assert!(matches!(
            text.parse::<u32>(),
            Err(StevieError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_serializes_as_value() {
        let arg = BoundArg::new("name", Some(json!("world")));
        assert_eq!(serde_json::to_string(&arg).unwrap(), r#""world""#);
        assert_eq!(serde_json::to_string(&BoundArg::absent("x")).unwrap(), "null");
        assert_eq!(json!({"hello": arg}), json!({"hello": "world"}));
    }
}
