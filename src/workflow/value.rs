use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A node parameter value of arbitrary shape.
///
/// Workflow exports store parameters as free-form JSON. This enum keeps the
/// shape explicit so that nesting depth and structure signatures can be
/// computed by matching on variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ParameterValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<ParameterValue>),
    Object(BTreeMap<String, ParameterValue>),
}

/// Number of array elements sampled when building a structure signature.
const SHAPE_SAMPLE: usize = 3;

impl ParameterValue {
    /// The type tag used for signatures and parameter statistics.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ParameterValue::Null => "null",
            ParameterValue::Bool(_) => "bool",
            ParameterValue::Number(_) => "number",
            ParameterValue::String(_) => "string",
            ParameterValue::Array(_) => "array",
            ParameterValue::Object(_) => "object",
        }
    }

    /// Nesting depth of this value when it sits at depth 0.
    pub fn nesting_depth(&self) -> usize {
        self.nesting_depth_from(0)
    }

    /// Nesting depth of this value when it sits at depth `base`.
    ///
    /// A scalar or an empty container reports its own depth; a non-empty
    /// container reports the deepest of its children, each one level deeper.
    /// Iterative so that pathological inputs cannot exhaust the stack.
    pub fn nesting_depth_from(&self, base: usize) -> usize {
        let mut deepest = base;
        let mut stack: Vec<(&ParameterValue, usize)> = vec![(self, base)];

        while let Some((value, depth)) = stack.pop() {
            match value {
                ParameterValue::Array(items) if !items.is_empty() => {
                    stack.extend(items.iter().map(|item| (item, depth + 1)));
                }
                ParameterValue::Object(map) if !map.is_empty() => {
                    stack.extend(map.values().map(|item| (item, depth + 1)));
                }
                _ => deepest = deepest.max(depth),
            }
        }
        deepest
    }

    /// Appends the canonical shape of this value to `out`.
    ///
    /// Keys are kept (sorted), values are replaced by their type tag and
    /// arrays are sampled to their first few elements.
    pub fn write_shape(&self, out: &mut String) {
        match self {
            ParameterValue::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().take(SHAPE_SAMPLE).enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_shape(out);
                }
                out.push(']');
            }
            ParameterValue::Object(map) => write_object_shape(map, out),
            scalar => out.push_str(scalar.type_tag()),
        }
    }
}

/// Appends the canonical shape of a parameter map to `out`.
pub fn write_object_shape(map: &BTreeMap<String, ParameterValue>, out: &mut String) {
    out.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{:?}:", key));
        value.write_shape(out);
    }
    out.push('}');
}

/// Nesting depth of a whole parameter map, evaluated at depth 0.
pub fn parameter_nesting_depth(parameters: &BTreeMap<String, ParameterValue>) -> usize {
    parameters
        .values()
        .map(|value| value.nesting_depth_from(1))
        .max()
        .unwrap_or(0)
}

impl From<serde_json::Value> for ParameterValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ParameterValue::Null,
            serde_json::Value::Bool(b) => ParameterValue::Bool(b),
            serde_json::Value::Number(n) => ParameterValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => ParameterValue::String(s),
            serde_json::Value::Array(items) => {
                ParameterValue::Array(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                ParameterValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Number(value)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Null => write!(f, "null"),
            ParameterValue::Bool(b) => write!(f, "{}", b),
            ParameterValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            ParameterValue::String(s) => write!(f, "{:?}", s),
            ParameterValue::Array(items) => write!(f, "[{} items]", items.len()),
            ParameterValue::Object(map) => write!(f, "{{{} keys}}", map.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(entries: Vec<(&str, ParameterValue)>) -> ParameterValue {
        ParameterValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_nesting_depth_counts_container_levels() {
        let value = object(vec![("b", object(vec![("c", 1.0.into())]))]);
        assert_eq!(value.nesting_depth(), 2);
        assert_eq!(ParameterValue::Array(vec![]).nesting_depth(), 0);
        assert_eq!(ParameterValue::from("x").nesting_depth_from(4), 4);
    }

    #[test]
    fn test_shape_ignores_values_and_samples_arrays() {
        let a = ParameterValue::Array(vec![1.0.into(), 2.0.into(), 3.0.into(), "x".into()]);
        let b = ParameterValue::Array(vec![9.0.into(), 8.0.into(), 7.0.into()]);
        let (mut sa, mut sb) = (String::new(), String::new());
        a.write_shape(&mut sa);
        b.write_shape(&mut sb);
        assert_eq!(sa, "[number,number,number]");
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_from_json_value() {
        let json = serde_json::json!({"a": [true, null], "b": "s"});
        let value = ParameterValue::from(json);
        assert_eq!(value.type_tag(), "object");
        assert_eq!(value.nesting_depth(), 2);
    }
}
