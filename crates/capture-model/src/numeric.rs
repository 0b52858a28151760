//! Lenient coercion of loosely typed client values.
//!
//! Clients serialize sensor readings however their platform hands them
//! over: numbers, numeric strings, booleans, or `null`. Coercion never
//! fails; anything that is not a finite number becomes `0.0`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce an optional JSON value into a finite `f64`, defaulting to `0.0`.
pub fn coerce_f64(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Deserialize an optional field, treating a value of the wrong shape as absent.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Flatten a face mesh into `[x0, y0, z0, x1, ...]`.
///
/// Accepts either a flat numeric array whose length is a multiple of 3 or
/// an array of 3-element numeric tuples. Returns `None` for anything else,
/// including an empty mesh.
pub fn flatten_mesh(value: &Value) -> Option<Vec<f64>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }

    let flat = if items.iter().all(Value::is_array) {
        let mut flat = Vec::with_capacity(items.len() * 3);
        for point in items {
            let coords = point.as_array()?;
            if coords.len() != 3 {
                return None;
            }
            for coord in coords {
                flat.push(finite_number(coord)?);
            }
        }
        flat
    } else {
        items.iter().map(finite_number).collect::<Option<Vec<_>>>()?
    };

    (flat.len() % 3 == 0).then_some(flat)
}

fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_numbers_strings_and_bools() {
        assert_eq!(coerce_f64(Some(&json!(2.5))), 2.5);
        assert_eq!(coerce_f64(Some(&json!(-3))), -3.0);
        assert_eq!(coerce_f64(Some(&json!("1.5"))), 1.5);
        assert_eq!(coerce_f64(Some(&json!(" 7 "))), 7.0);
        assert_eq!(coerce_f64(Some(&json!(true))), 1.0);
        assert_eq!(coerce_f64(Some(&json!(false))), 0.0);
    }

    #[test]
    fn test_coerce_garbage_defaults_to_zero() {
        assert_eq!(coerce_f64(None), 0.0);
        assert_eq!(coerce_f64(Some(&Value::Null)), 0.0);
        assert_eq!(coerce_f64(Some(&json!("abc"))), 0.0);
        assert_eq!(coerce_f64(Some(&json!("NaN"))), 0.0);
        assert_eq!(coerce_f64(Some(&json!("inf"))), 0.0);
        assert_eq!(coerce_f64(Some(&json!([1, 2]))), 0.0);
        assert_eq!(coerce_f64(Some(&json!({"v": 1}))), 0.0);
    }

    #[test]
    fn test_flatten_tuple_mesh() {
        let mesh = json!([[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]);
        assert_eq!(
            flatten_mesh(&mesh),
            Some(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6])
        );
    }

    #[test]
    fn test_flatten_flat_mesh() {
        let mesh = json!([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(flatten_mesh(&mesh).map(|v| v.len()), Some(6));
    }

    #[test]
    fn test_flatten_rejects_malformed_meshes() {
        assert_eq!(flatten_mesh(&json!([])), None);
        assert_eq!(flatten_mesh(&json!([0.1, 0.2])), None);
        assert_eq!(flatten_mesh(&json!([[0.1, 0.2], [0.3, 0.4]])), None);
        assert_eq!(flatten_mesh(&json!([0.1, "x", 0.3])), None);
        assert_eq!(flatten_mesh(&json!([[0.1, 0.2, 0.3], 0.4])), None);
        assert_eq!(flatten_mesh(&json!("mesh")), None);
    }

    proptest::proptest! {
        #[test]
        fn prop_coerced_strings_are_finite(s in ".*") {
            proptest::prop_assert!(coerce_f64(Some(&json!(s))).is_finite());
        }

        #[test]
        fn prop_flat_mesh_keeps_every_coordinate(coords in proptest::collection::vec(-1.0f64..1.0, 1..30)) {
            let usable = coords.len() % 3 == 0;
            let flat = flatten_mesh(&json!(coords));
            proptest::prop_assert_eq!(flat.is_some(), usable);
            if let Some(flat) = flat {
                proptest::prop_assert_eq!(flat, coords);
            }
        }
    }
}
