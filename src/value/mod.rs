//! # Script Values
//!
//! Dynamically typed values that scripts read from responses and store as
//! variables. Composite values are shared [`ObjectRef`] handles, so a value
//! graph may alias and may contain cycles.

mod convert;
mod object;

use std::fmt;
use std::rc::Rc;

pub use object::{Object, ObjectKind, ObjectRef, PropertyKey, TypedArrayKind};

/// Runtime kind tag used by structural comparison. Primitive numbers, texts
/// and booleans share their tag with the boxed object form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Symbol,
    Date,
    RegExp,
    Function,
    Set,
    Map,
    ArrayBuffer,
    DataView,
    TypedArray(TypedArrayKind),
    Arguments,
    Array,
    Object,
    Opaque,
}

/// A unique atom. Two symbols are the same only if they come from the same
/// [`Symbol::new`] call.
#[derive(Clone)]
pub struct Symbol(Rc<Option<String>>);

impl Symbol {
    pub fn new(description: Option<&str>) -> Self {
        Self(Rc::new(description.map(str::to_string)))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(Symbol),
    Object(ObjectRef),
}

impl Value {
    fn from_kind(kind: ObjectKind) -> Self {
        Value::Object(ObjectRef::new(Object::new(kind)))
    }

    /// An empty plain object.
    pub fn object() -> Self {
        Self::from_kind(ObjectKind::Plain)
    }

    /// A plain object with the given own properties.
    pub fn object_from<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<PropertyKey>,
        V: Into<Value>,
    {
        let mut object = Object::new(ObjectKind::Plain);
        for (key, value) in entries {
            object.set_property(key, value);
        }
        Value::Object(ObjectRef::new(object))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::from_kind(ObjectKind::Array(items.into_iter().map(Some).collect()))
    }

    /// An array where `None` entries are holes.
    pub fn sparse_array(items: impl IntoIterator<Item = Option<Value>>) -> Self {
        Self::from_kind(ObjectKind::Array(items.into_iter().collect()))
    }

    pub fn arguments(items: impl IntoIterator<Item = Value>) -> Self {
        Self::from_kind(ObjectKind::Arguments(items.into_iter().map(Some).collect()))
    }

    pub fn date(epoch_millis: f64) -> Self {
        Self::from_kind(ObjectKind::Date(epoch_millis))
    }

    /// Parse an RFC 3339 timestamp; an unparsable input yields an invalid date.
    pub fn date_from_rfc3339(text: &str) -> Self {
        let millis = chrono::DateTime::parse_from_rfc3339(text)
            .map(|date| date.timestamp_millis() as f64)
            .unwrap_or(f64::NAN);
        Self::date(millis)
    }

    pub fn regexp(source: &str, flags: &str) -> Self {
        Self::from_kind(ObjectKind::RegExp {
            source: source.to_string(),
            flags: flags.to_string(),
        })
    }

    pub fn function(source: &str) -> Self {
        Self::from_kind(ObjectKind::Function {
            source: source.to_string(),
        })
    }

    pub fn boxed_number(value: f64) -> Self {
        Self::from_kind(ObjectKind::Number(value))
    }

    pub fn boxed_string(value: &str) -> Self {
        Self::from_kind(ObjectKind::String(value.to_string()))
    }

    pub fn boxed_bool(value: bool) -> Self {
        Self::from_kind(ObjectKind::Boolean(value))
    }

    /// A set in insertion order; repeated values are dropped.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.iter().any(|existing| existing.same_value_zero(&item)) {
                unique.push(item);
            }
        }
        Self::from_kind(ObjectKind::Set(unique))
    }

    /// A map in insertion order; a repeated key keeps its first position and
    /// its last value.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut unique: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            match unique.iter_mut().find(|(existing, _)| existing.same_value_zero(&key)) {
                Some((_, slot)) => *slot = value,
                None => unique.push((key, value)),
            }
        }
        Self::from_kind(ObjectKind::Map(unique))
    }

    pub fn array_buffer(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_kind(ObjectKind::ArrayBuffer(bytes.into()))
    }

    /// A view over `buffer`, which must be an `ArrayBuffer` object.
    pub fn data_view(buffer: &Value) -> Option<Self> {
        let buffer = buffer.as_object()?;
        if !matches!(buffer.borrow().kind(), ObjectKind::ArrayBuffer(_)) {
            return None;
        }
        Some(Self::from_kind(ObjectKind::DataView { buffer: buffer.clone() }))
    }

    pub fn typed_array(kind: TypedArrayKind, values: &[f64]) -> Self {
        Self::from_kind(ObjectKind::TypedArray {
            kind,
            bytes: kind.encode(values),
        })
    }

    pub fn opaque(name: &str) -> Self {
        Self::from_kind(ObjectKind::Opaque(name.to_string()))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Undefined => Kind::Undefined,
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Boolean,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Symbol(_) => Kind::Symbol,
            Value::Object(object) => match object.borrow().kind() {
                ObjectKind::Plain => Kind::Object,
                ObjectKind::Array(_) => Kind::Array,
                ObjectKind::Arguments(_) => Kind::Arguments,
                ObjectKind::Date(_) => Kind::Date,
                ObjectKind::RegExp { .. } => Kind::RegExp,
                ObjectKind::Function { .. } => Kind::Function,
                ObjectKind::Number(_) => Kind::Number,
                ObjectKind::String(_) => Kind::String,
                ObjectKind::Boolean(_) => Kind::Boolean,
                ObjectKind::Set(_) => Kind::Set,
                ObjectKind::Map(_) => Kind::Map,
                ObjectKind::ArrayBuffer(_) => Kind::ArrayBuffer,
                ObjectKind::DataView { .. } => Kind::DataView,
                ObjectKind::TypedArray { kind, .. } => Kind::TypedArray(*kind),
                ObjectKind::Opaque(_) => Kind::Opaque,
            },
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Numeric content of numbers, boxed numbers and dates.
    pub fn number_value(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Object(object) => match object.borrow().kind() {
                ObjectKind::Number(number) | ObjectKind::Date(number) => Some(*number),
                _ => None,
            },
            _ => None,
        }
    }

    /// Strict identity: primitives by value (NaN is not identical to
    /// itself), objects and symbols by reference.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Identity used for set membership and map keys: like
    /// [`Value::strict_equals`] except NaN matches NaN.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => *number != 0.0 && !number.is_nan(),
            Value::String(text) => !text.is_empty(),
            Value::Symbol(_) | Value::Object(_) => true,
        }
    }

    /// Property read: array indices and `length`, text `length`, then own
    /// and inherited properties. Anything missing reads as undefined.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::String(text) if key == "length" => Value::Number(text.chars().count() as f64),
            Value::Object(object) => {
                {
                    let borrowed = object.borrow();
                    match borrowed.kind() {
                        ObjectKind::Array(items) | ObjectKind::Arguments(items) => {
                            if key == "length" {
                                return Value::Number(items.len() as f64);
                            }
                            if let Ok(index) = key.parse::<usize>() {
                                return items.get(index).cloned().flatten().unwrap_or_default();
                            }
                        }
                        ObjectKind::Set(items) if key == "size" => {
                            return Value::Number(items.len() as f64);
                        }
                        ObjectKind::Map(entries) if key == "size" => {
                            return Value::Number(entries.len() as f64);
                        }
                        _ => {}
                    }
                }
                object.lookup(&PropertyKey::Name(key.to_string()))
            }
            _ => Value::Undefined,
        }
    }

    pub fn index(&self, index: usize) -> Value {
        self.get(&index.to_string())
    }

    /// Follow a dotted path such as `data.items.0.id`.
    pub fn pointer(&self, path: &str) -> Value {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .fold(self.clone(), |current, segment| current.get(segment))
    }
}

/// Strict identity, see [`Value::strict_equals`]. Structural comparison lives
/// in [`crate::testing::equality`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Number(f64::from(number))
    }
}

impl From<u16> for Value {
    fn from(number: u16) -> Self {
        Value::Number(f64::from(number))
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

pub(crate) fn format_number(number: f64) -> String {
    if number.is_nan() {
        "NaN".to_string()
    } else if number.is_infinite() {
        if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if number == 0.0 {
        "0".to_string()
    } else {
        format_finite(number)
    }
}

/// Shortest round-trip digits, laid out with exponent notation from 1e21
/// upward and below 1e-6, as script numbers print.
fn format_finite(number: f64) -> String {
    let scientific = format!("{:e}", number.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;
    let count = digits.len() as i32;

    let body = if count <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - count) as usize))
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{whole}.{fraction}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let (lead, rest) = digits.split_at(1);
        let sign = if point > 0 { '+' } else { '-' };
        let fraction = if rest.is_empty() { String::new() } else { format!(".{rest}") };
        format!("{lead}{fraction}e{sign}{}", (point - 1).abs())
    };
    if number < 0.0 { format!("-{body}") } else { body }
}

pub(crate) fn format_date(epoch_millis: f64) -> String {
    if !epoch_millis.is_finite() {
        return "Invalid Date".to_string();
    }
    chrono::DateTime::from_timestamp_millis(epoch_millis as i64)
        .map(|date| date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_else(|| "Invalid Date".to_string())
}

impl fmt::Display for Value {
    /// Script string coercion, as used by `log` and error text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = Vec::new();
        f.write_str(&coerce_to_string(self, &mut path))
    }
}

fn coerce_to_string(value: &Value, path: &mut Vec<usize>) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => format_number(*number),
        Value::String(text) => text.clone(),
        Value::Symbol(symbol) => format!("Symbol({})", symbol.description().unwrap_or_default()),
        Value::Object(object) => {
            // A cyclic join renders the repeated reference as empty.
            if path.contains(&object.addr()) {
                return String::new();
            }
            path.push(object.addr());
            let borrowed = object.borrow();
            let text = match borrowed.kind() {
                ObjectKind::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        None | Some(Value::Undefined) | Some(Value::Null) => String::new(),
                        Some(item) => coerce_to_string(item, path),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                ObjectKind::TypedArray { kind, bytes } => kind
                    .decode(bytes)
                    .into_iter()
                    .map(format_number)
                    .collect::<Vec<_>>()
                    .join(","),
                ObjectKind::Date(millis) => format_date(*millis),
                ObjectKind::RegExp { source, flags } => format!("/{source}/{flags}"),
                ObjectKind::Function { source } => source.clone(),
                ObjectKind::Number(number) => format_number(*number),
                ObjectKind::String(text) => text.clone(),
                ObjectKind::Boolean(flag) => flag.to_string(),
                other => format!("[object {}]", object::kind_label(other)),
            };
            path.pop();
            text
        }
    }
}
