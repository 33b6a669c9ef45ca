//! Structural deep equality over [`Value`] graphs.
//!
//! The comparison threads one list of visited object addresses through the
//! whole walk. When both operands of a comparison are already on that list
//! they are taken as equal, which is what stops cyclic graphs from recursing
//! forever. Set and map entries are compared positionally in insertion
//! order, so the same members inserted in a different order compare unequal.

use crate::value::{Kind, ObjectKind, ObjectRef, Value};

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 2 * 1024 * 1024;

/// Deep structural equality. Always terminates; never panics.
pub fn is_equal(a: &Value, b: &Value) -> bool {
    let mut visited = Vec::new();
    check_equality(a, b, &mut visited)
}

fn check_equality(a: &Value, b: &Value, visited: &mut Vec<usize>) -> bool {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || compare(a, b, visited))
}

fn compare(a: &Value, b: &Value, visited: &mut Vec<usize>) -> bool {
    if a.strict_equals(b) {
        return true;
    }
    if a.is_nullish() || b.is_nullish() {
        return false;
    }

    if let (Some(x), Some(y)) = (a.as_object(), b.as_object()) {
        if visited.contains(&x.addr()) && visited.contains(&y.addr()) {
            return true;
        }
    }
    for object in [a.as_object(), b.as_object()].into_iter().flatten() {
        visited.push(object.addr());
    }

    let kind = a.kind();
    if kind != b.kind() {
        return false;
    }

    if !own_properties_equal(a, b, visited) {
        return false;
    }

    match kind {
        Kind::Number | Kind::Date => match (a.number_value(), b.number_value()) {
            (Some(x), Some(y)) => numbers_equal(x, y),
            _ => false,
        },
        // Distinct symbols never match; identical ones returned above.
        Kind::Symbol => false,
        Kind::RegExp | Kind::Function | Kind::String | Kind::Boolean => a.to_string() == b.to_string(),
        Kind::Set | Kind::Map => entries_equal(a, b, visited),
        Kind::ArrayBuffer | Kind::DataView => buffers_equal(a, b),
        Kind::TypedArray(_) => typed_arrays_equal(a, b),
        Kind::Array | Kind::Arguments => sequences_equal(a, b, visited),
        Kind::Object => prototypes_equal(a, b, visited),
        Kind::Undefined | Kind::Null | Kind::Opaque => false,
    }
}

fn numbers_equal(x: f64, y: f64) -> bool {
    x == y || (x.is_nan() && y.is_nan())
}

fn own_properties_equal(a: &Value, b: &Value, visited: &mut Vec<usize>) -> bool {
    // Primitives count as having no own properties.
    let count = |value: &Value| value.as_object().map_or(0, |object| object.borrow().properties().len());
    if count(a) != count(b) {
        return false;
    }
    let (Some(x), Some(y)) = (a.as_object(), b.as_object()) else {
        return true;
    };
    let left = x.borrow().properties().to_vec();
    left.iter()
        .all(|(key, value)| check_equality(value, &y.lookup(key), visited))
}

fn entries_equal(a: &Value, b: &Value, visited: &mut Vec<usize>) -> bool {
    let (Some(x), Some(y)) = (a.as_object(), b.as_object()) else {
        return false;
    };
    let (x, y) = (x.borrow(), y.borrow());
    match (x.kind(), y.kind()) {
        (ObjectKind::Set(left), ObjectKind::Set(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(l, r)| check_equality(l, r, visited))
        }
        (ObjectKind::Map(left), ObjectKind::Map(right)) => {
            left.len() == right.len()
                && left.iter().zip(right).all(|((lk, lv), (rk, rv))| {
                    check_equality(lk, rk, visited) && check_equality(lv, rv, visited)
                })
        }
        _ => false,
    }
}

fn buffers_equal(a: &Value, b: &Value) -> bool {
    let bytes = |value: &Value| value.as_object().and_then(|object| object.borrow().buffer_bytes());
    match (bytes(a), bytes(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn typed_arrays_equal(a: &Value, b: &Value) -> bool {
    let elements = |value: &Value| {
        value.as_object().and_then(|object| match object.borrow().kind() {
            ObjectKind::TypedArray { kind, bytes } => Some(kind.decode(bytes)),
            _ => None,
        })
    };
    match (elements(a), elements(b)) {
        (Some(left), Some(right)) => {
            left.len() == right.len() && left.iter().zip(&right).all(|(x, y)| numbers_equal(*x, *y))
        }
        _ => false,
    }
}

fn sequences_equal(a: &Value, b: &Value, visited: &mut Vec<usize>) -> bool {
    let (Some(x), Some(y)) = (a.as_object(), b.as_object()) else {
        return false;
    };
    let (x, y) = (x.borrow(), y.borrow());
    let (left, right) = match (x.kind(), y.kind()) {
        (ObjectKind::Array(left), ObjectKind::Array(right))
        | (ObjectKind::Arguments(left), ObjectKind::Arguments(right)) => (left, right),
        _ => return false,
    };
    if left.len() != right.len() {
        return false;
    }
    left.iter().zip(right).all(|slots| match slots {
        (None, None) => true,
        (Some(l), Some(r)) => check_equality(l, r, visited),
        _ => false,
    })
}

fn prototypes_equal(a: &Value, b: &Value, visited: &mut Vec<usize>) -> bool {
    let prototype = |value: &Value| -> Option<ObjectRef> {
        value.as_object().and_then(|object| object.borrow().prototype().cloned())
    };
    match (prototype(a), prototype(b)) {
        (None, None) => true,
        (Some(x), Some(y)) => check_equality(&Value::Object(x), &Value::Object(y), visited),
        _ => false,
    }
}
