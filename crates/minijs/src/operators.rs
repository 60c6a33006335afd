//! Binary operators and the coercion rules behind them.
//!
//! Implements the dynamic-scripting coercion tradition: `+` concatenates
//! when either side is (or stringifies as) a string, the other arithmetic
//! operators coerce both sides to number, `==`/`!=` coerce across types
//! while `===`/`!==` never do, relational operators order strings
//! lexicographically and everything else numerically, and the bitwise
//! operators work on 32-bit integer coercions.

use std::cmp::Ordering;

use crate::bytecode::Opcode;
use crate::error::{Error, Result};
use crate::value::Value;

/// Apply a binary operator identified by its opcode to two popped operands.
///
/// Only the arithmetic, comparison, bitwise, and logical opcodes are valid
/// here; the property-flavored binaries (`In`, `InstanceOf`) need VM state
/// and are dispatched there.
pub fn apply_binary(op: Opcode, left: &Value, right: &Value) -> Result<Value> {
    let result = match op {
        Opcode::Add => add(left, right),
        Opcode::Sub => Value::Number(to_number(left) - to_number(right)),
        Opcode::Mul => Value::Number(to_number(left) * to_number(right)),
        Opcode::Div => Value::Number(to_number(left) / to_number(right)),
        Opcode::Mod => Value::Number(to_number(left) % to_number(right)),
        Opcode::Exp => Value::Number(to_number(left).powf(to_number(right))),

        Opcode::Eq => Value::Bool(loose_eq(left, right)),
        Opcode::Neq => Value::Bool(!loose_eq(left, right)),
        Opcode::Seq => Value::Bool(strict_eq(left, right)),
        Opcode::Sneq => Value::Bool(!strict_eq(left, right)),
        Opcode::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        Opcode::Lte => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        Opcode::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        Opcode::Gte => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),

        Opcode::BOr => Value::Number((to_int32(left) | to_int32(right)) as f64),
        Opcode::BXor => Value::Number((to_int32(left) ^ to_int32(right)) as f64),
        Opcode::BAnd => Value::Number((to_int32(left) & to_int32(right)) as f64),
        Opcode::LShift => Value::Number((to_int32(left) << (to_uint32(right) & 31)) as f64),
        Opcode::RShift => Value::Number((to_int32(left) >> (to_uint32(right) & 31)) as f64),
        Opcode::UrShift => Value::Number((to_uint32(left) >> (to_uint32(right) & 31)) as f64),

        // Operand-selecting logical operators: the result is one of the
        // operands, not a coerced boolean.
        Opcode::And => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        Opcode::Or => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }

        other => {
            return Err(Error::Bytecode(format!(
                "opcode {:?} is not a binary operator",
                other
            )));
        }
    };
    Ok(result)
}

/// `+`: string concatenation when either operand stringifies (strings,
/// arrays, objects, functions), numeric addition otherwise.
pub fn add(left: &Value, right: &Value) -> Value {
    let stringy = |v: &Value| matches!(v, Value::Str(_)) || v.is_object_like();
    if stringy(left) || stringy(right) {
        Value::Str(format!("{}{}", left.to_js_string(), right.to_js_string()))
    } else {
        Value::Number(to_number(left) + to_number(right))
    }
}

/// The ToNumber coercion.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::Str(s) => string_to_number(s),
        // Composites coerce through their string form: [] is 0, [7] is 7,
        // and anything that stringifies unnumerically is NaN.
        other => string_to_number(&other.to_js_string()),
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return match u64::from_str_radix(hex, 16) {
            Ok(n) => n as f64,
            Err(_) => f64::NAN,
        };
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// The ToInt32 coercion used by the bitwise operators.
pub fn to_int32(value: &Value) -> i32 {
    to_uint32(value) as i32
}

/// The ToUint32 coercion used by `>>>` and shift counts.
pub fn to_uint32(value: &Value) -> u32 {
    let n = to_number(value);
    if !n.is_finite() {
        return 0;
    }
    let t = n.trunc();
    let m = t.rem_euclid(4294967296.0);
    m as u32
}

/// Strict equality: no coercion, composites by identity, `NaN` unequal to
/// itself.
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    left == right
}

/// Coercing (abstract) equality.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => true,
        (Value::Number(n), Value::Str(_)) => *n == to_number(right),
        (Value::Str(_), Value::Number(n)) => to_number(left) == *n,
        (Value::Bool(_), _) => loose_eq(&Value::Number(to_number(left)), right),
        (_, Value::Bool(_)) => loose_eq(left, &Value::Number(to_number(right))),
        (Value::Number(_) | Value::Str(_), r) if r.is_object_like() => {
            loose_eq(left, &Value::Str(right.to_js_string()))
        }
        (l, Value::Number(_) | Value::Str(_)) if l.is_object_like() => {
            loose_eq(&Value::Str(left.to_js_string()), right)
        }
        _ => strict_eq(left, right),
    }
}

/// Relational comparison: lexicographic over UTF-16 code units when both
/// sides are strings, numeric otherwise. `None` means an incomparable
/// (NaN-involving) pair, for which every relational operator is false.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return Some(a.encode_utf16().cmp(b.encode_utf16()));
    }
    to_number(left).partial_cmp(&to_number(right))
}
