use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use super::{Symbol, Value};
use crate::error::ScriptError;

/// Element type of a typed array view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl TypedArrayKind {
    pub fn bytes_per_element(&self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 | Self::Uint8Clamped => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "Int8Array",
            Self::Uint8 => "Uint8Array",
            Self::Uint8Clamped => "Uint8ClampedArray",
            Self::Int16 => "Int16Array",
            Self::Uint16 => "Uint16Array",
            Self::Int32 => "Int32Array",
            Self::Uint32 => "Uint32Array",
            Self::Float32 => "Float32Array",
            Self::Float64 => "Float64Array",
        }
    }

    /// Encode numbers into little-endian element bytes, wrapping or clamping
    /// the way typed array stores do.
    pub fn encode(&self, values: &[f64]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(values.len() * self.bytes_per_element());
        for &value in values {
            match self {
                Self::Int8 => bytes.extend((wrap_integer(value, 8) as i8).to_le_bytes()),
                Self::Uint8 => bytes.extend((wrap_integer(value, 8) as u8).to_le_bytes()),
                Self::Uint8Clamped => {
                    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 255.0) };
                    bytes.push(clamped.round_ties_even() as u8);
                }
                Self::Int16 => bytes.extend((wrap_integer(value, 16) as i16).to_le_bytes()),
                Self::Uint16 => bytes.extend((wrap_integer(value, 16) as u16).to_le_bytes()),
                Self::Int32 => bytes.extend((wrap_integer(value, 32) as i32).to_le_bytes()),
                Self::Uint32 => bytes.extend((wrap_integer(value, 32) as u32).to_le_bytes()),
                Self::Float32 => bytes.extend((value as f32).to_le_bytes()),
                Self::Float64 => bytes.extend(value.to_le_bytes()),
            }
        }
        bytes
    }

    /// Decode every complete element in `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> Vec<f64> {
        bytes
            .chunks_exact(self.bytes_per_element())
            .map(|chunk| match self {
                Self::Int8 => f64::from(chunk[0] as i8),
                Self::Uint8 | Self::Uint8Clamped => f64::from(chunk[0]),
                Self::Int16 => f64::from(i16::from_le_bytes([chunk[0], chunk[1]])),
                Self::Uint16 => f64::from(u16::from_le_bytes([chunk[0], chunk[1]])),
                Self::Int32 => f64::from(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
                Self::Uint32 => f64::from(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
                Self::Float32 => f64::from(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
                Self::Float64 => {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(chunk);
                    f64::from_le_bytes(raw)
                }
            })
            .collect()
    }
}

/// Truncate toward zero and reduce modulo `2^bits`; non-finite values store 0.
fn wrap_integer(value: f64, bits: i32) -> u64 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(2f64.powi(bits)) as u64
}

/// Key of an own property: a name or a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Name(String),
    Symbol(Symbol),
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::Name(name.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        PropertyKey::Name(name)
    }
}

impl From<Symbol> for PropertyKey {
    fn from(symbol: Symbol) -> Self {
        PropertyKey::Symbol(symbol)
    }
}

/// Built-in behaviour carried by an object, beyond its named properties.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Plain,
    /// Elements in index order; `None` marks a hole.
    Array(Vec<Option<Value>>),
    Arguments(Vec<Option<Value>>),
    /// Milliseconds since the Unix epoch; NaN is an invalid date.
    Date(f64),
    RegExp { source: String, flags: String },
    Function { source: String },
    Number(f64),
    String(String),
    Boolean(bool),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    ArrayBuffer(Vec<u8>),
    /// View over an `ArrayBuffer` object.
    DataView { buffer: ObjectRef },
    TypedArray { kind: TypedArrayKind, bytes: Vec<u8> },
    /// Any host object the harness does not look inside (errors, promises).
    Opaque(String),
}

#[derive(Debug, Clone)]
pub struct Object {
    kind: ObjectKind,
    properties: Vec<(PropertyKey, Value)>,
    prototype: Option<ObjectRef>,
}

impl Object {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            prototype: None,
        }
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ObjectKind {
        &mut self.kind
    }

    /// Own named properties in insertion order.
    pub fn properties(&self) -> &[(PropertyKey, Value)] {
        &self.properties
    }

    pub fn own_property(&self, key: &PropertyKey) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn set_property(&mut self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn remove_property(&mut self, key: &PropertyKey) -> Option<Value> {
        let index = self.properties.iter().position(|(existing, _)| existing == key)?;
        Some(self.properties.remove(index).1)
    }

    /// `None` stands for the default object prototype.
    pub fn prototype(&self) -> Option<&ObjectRef> {
        self.prototype.as_ref()
    }

    /// Bytes of the buffer backing this object, for buffer kinds.
    pub fn buffer_bytes(&self) -> Option<Vec<u8>> {
        match &self.kind {
            ObjectKind::ArrayBuffer(bytes) => Some(bytes.clone()),
            ObjectKind::DataView { buffer } => buffer.borrow().buffer_bytes(),
            _ => None,
        }
    }
}

/// Shared, mutable handle to an [`Object`]. Clones alias the same object, so
/// graphs built from handles may contain cycles.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Stable identity of the referenced object for as long as it is alive.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        self.borrow_mut().set_property(key, value);
    }

    /// Read a property through the prototype chain; absent reads as undefined.
    pub fn lookup(&self, key: &PropertyKey) -> Value {
        let mut current = Some(self.clone());
        while let Some(object) = current {
            let object = object.borrow();
            if let Some(value) = object.own_property(key) {
                return value.clone();
            }
            current = object.prototype.clone();
        }
        Value::Undefined
    }

    pub fn set_prototype(&self, prototype: Option<ObjectRef>) -> Result<(), ScriptError> {
        let mut cursor = prototype.clone();
        while let Some(link) = cursor {
            if link.ptr_eq(self) {
                return Err(ScriptError::Type("Cyclic __proto__ value".to_string()));
            }
            cursor = link.borrow().prototype.clone();
        }
        self.borrow_mut().prototype = prototype;
        Ok(())
    }

    /// Append to an array, a set (skipping duplicates) or arguments object.
    pub fn push(&self, value: impl Into<Value>) -> Result<(), ScriptError> {
        let value = value.into();
        let mut object = self.borrow_mut();
        match object.kind_mut() {
            ObjectKind::Array(items) | ObjectKind::Arguments(items) => items.push(Some(value)),
            ObjectKind::Set(items) => {
                if !items.iter().any(|existing| existing.same_value_zero(&value)) {
                    items.push(value);
                }
            }
            _ => return Err(ScriptError::Type("object is not a list".to_string())),
        }
        Ok(())
    }

    /// Insert or replace a map entry, keeping the original position of an
    /// existing key.
    pub fn map_insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), ScriptError> {
        let key = key.into();
        let value = value.into();
        let mut object = self.borrow_mut();
        let ObjectKind::Map(entries) = object.kind_mut() else {
            return Err(ScriptError::Type("object is not a Map".to_string()));
        };
        match entries.iter_mut().find(|(existing, _)| existing.same_value_zero(&key)) {
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectRef {
    // Objects may be cyclic, so only the kind and identity are printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => write!(f, "ObjectRef({} @ {:#x})", kind_label(object.kind()), self.addr()),
            Err(_) => write!(f, "ObjectRef(<borrowed> @ {:#x})", self.addr()),
        }
    }
}

pub(crate) fn kind_label(kind: &ObjectKind) -> &str {
    match kind {
        ObjectKind::Plain => "Object",
        ObjectKind::Array(_) => "Array",
        ObjectKind::Arguments(_) => "Arguments",
        ObjectKind::Date(_) => "Date",
        ObjectKind::RegExp { .. } => "RegExp",
        ObjectKind::Function { .. } => "Function",
        ObjectKind::Number(_) => "Number",
        ObjectKind::String(_) => "String",
        ObjectKind::Boolean(_) => "Boolean",
        ObjectKind::Set(_) => "Set",
        ObjectKind::Map(_) => "Map",
        ObjectKind::ArrayBuffer(_) => "ArrayBuffer",
        ObjectKind::DataView { .. } => "DataView",
        ObjectKind::TypedArray { kind, .. } => kind.name(),
        ObjectKind::Opaque(name) => name,
    }
}
