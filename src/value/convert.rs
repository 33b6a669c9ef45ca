use serde_json::{Map, Number, Value as JsonValue};

use super::{ObjectKind, PropertyKey, Value};

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(flag) => Value::Bool(flag),
            JsonValue::Number(number) => Value::Number(number.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(text) => Value::String(text),
            JsonValue::Array(items) => Value::array(items.into_iter().map(Value::from)),
            JsonValue::Object(entries) => Value::object_from(entries),
        }
    }
}

struct CycleDetected;

impl Value {
    /// JSON form of the value, following `JSON.stringify` rules: undefined,
    /// symbols and functions have no JSON form, non-finite numbers become
    /// null, dates become their epoch millisecond number. Returns `None` for
    /// a cyclic graph.
    pub fn to_json(&self) -> Option<JsonValue> {
        let mut path = Vec::new();
        to_json_inner(self, &mut path).ok().flatten()
    }
}

fn number_to_json(number: f64) -> JsonValue {
    // Integral values print without a fraction, as script numbers do.
    if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        return JsonValue::Number(Number::from(number as i64));
    }
    Number::from_f64(number).map(JsonValue::Number).unwrap_or(JsonValue::Null)
}

fn to_json_inner(value: &Value, path: &mut Vec<usize>) -> Result<Option<JsonValue>, CycleDetected> {
    let object = match value {
        Value::Undefined | Value::Symbol(_) => return Ok(None),
        Value::Null => return Ok(Some(JsonValue::Null)),
        Value::Bool(flag) => return Ok(Some(JsonValue::Bool(*flag))),
        Value::Number(number) => return Ok(Some(number_to_json(*number))),
        Value::String(text) => return Ok(Some(JsonValue::String(text.clone()))),
        Value::Object(object) => object,
    };

    if path.contains(&object.addr()) {
        return Err(CycleDetected);
    }
    path.push(object.addr());

    let borrowed = object.borrow();
    let json = match borrowed.kind() {
        ObjectKind::Function { .. } => None,
        ObjectKind::Number(number) => Some(number_to_json(*number)),
        ObjectKind::String(text) => Some(JsonValue::String(text.clone())),
        ObjectKind::Boolean(flag) => Some(JsonValue::Bool(*flag)),
        ObjectKind::Date(millis) => Some(number_to_json(*millis)),
        ObjectKind::Array(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                let entry = match item {
                    Some(item) => to_json_inner(item, path)?,
                    None => None,
                };
                array.push(entry.unwrap_or(JsonValue::Null));
            }
            Some(JsonValue::Array(array))
        }
        ObjectKind::TypedArray { kind, bytes } => Some(JsonValue::Array(
            kind.decode(bytes).into_iter().map(number_to_json).collect(),
        )),
        _ => {
            let mut entries = Map::new();
            for (key, item) in borrowed.properties() {
                let PropertyKey::Name(name) = key else {
                    continue;
                };
                if let Some(json) = to_json_inner(item, path)? {
                    entries.insert(name.clone(), json);
                }
            }
            Some(JsonValue::Object(entries))
        }
    };

    path.pop();
    Ok(json)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_nested_json() {
        let value = Value::from(json!({"a": 1, "list": [true, null, "x"]}));
        assert_eq!(value.get("a"), Value::from(1));
        assert_eq!(value.pointer("list.0"), Value::Bool(true));
        assert_eq!(value.pointer("list.1"), Value::Null);
        assert_eq!(value.pointer("list.2"), Value::from("x"));
    }

    #[test]
    fn encodes_following_stringify_rules() {
        let value = Value::object_from([
            ("n", Value::Number(f64::NAN)),
            ("skip", Value::Undefined),
            ("f", Value::function("function () {}")),
            ("when", Value::date(0.0)),
            ("list", Value::sparse_array([Some(1.into()), None, Some(Value::Undefined)])),
        ]);
        assert_eq!(
            value.to_json(),
            Some(json!({
                "n": null,
                "when": 0,
                "list": [1, null, null],
            }))
        );
    }

    #[test]
    fn dates_encode_as_epoch_millis() {
        assert_eq!(Value::date(0.0).to_json(), Some(json!(0)));
        assert_eq!(Value::date(1_700_000_000_123.0).to_json(), Some(json!(1_700_000_000_123_i64)));
        assert_eq!(Value::date(f64::NAN).to_json(), Some(JsonValue::Null));
        assert_eq!(Value::from(2.5).to_json(), Some(json!(2.5)));
    }

    #[test]
    fn cyclic_graph_has_no_json_form() {
        let value = Value::object();
        value.as_object().unwrap().set("self", value.clone());
        assert_eq!(value.to_json(), None);
    }

    #[test]
    fn shared_non_cyclic_references_encode_twice() {
        let shared = Value::array([1.into()]);
        let value = Value::object_from([("a", shared.clone()), ("b", shared)]);
        assert_eq!(value.to_json(), Some(json!({"a": [1], "b": [1]})));
    }

    #[test]
    fn undefined_has_no_json_form() {
        assert_eq!(Value::Undefined.to_json(), None);
        assert_eq!(Value::from("x").to_json(), Some(json!("x")));
    }
}
