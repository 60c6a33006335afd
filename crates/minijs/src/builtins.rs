//! Default host library installed by [`Engine::with_builtins`].
//!
//! These are ordinary native functions placed in the ambient global
//! environment — nothing here is special to the VM, and an embedder can
//! overwrite or extend all of it through [`Engine::set_global`].
//!
//! [`Engine::with_builtins`]: crate::Engine::with_builtins
//! [`Engine::set_global`]: crate::Engine::set_global

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::operators::to_number;
use crate::scope::GlobalEnv;
use crate::value::{NativeFunction, Value};

/// Captured `print` output, drained via [`Engine::take_print_output`].
///
/// [`Engine::take_print_output`]: crate::Engine::take_print_output
pub type OutputBuffer = Rc<RefCell<Vec<String>>>;

/// Install the default globals into an ambient environment.
pub fn install(globals: &GlobalEnv, output: &OutputBuffer) {
    let mut env = globals.borrow_mut();

    env.insert("NaN".to_string(), Value::Number(f64::NAN));
    env.insert("Infinity".to_string(), Value::Number(f64::INFINITY));

    let sink = Rc::clone(output);
    env.insert(
        "print".to_string(),
        native("print", move |_this, args| {
            let line = args
                .iter()
                .map(|v| v.to_js_string())
                .collect::<Vec<_>>()
                .join(" ");
            sink.borrow_mut().push(line);
            Ok(Value::Undefined)
        }),
    );

    env.insert(
        "String".to_string(),
        native("String", |_this, args| {
            Ok(Value::Str(match args.first() {
                Some(v) => v.to_js_string(),
                None => String::new(),
            }))
        }),
    );
    env.insert(
        "Number".to_string(),
        native("Number", |_this, args| {
            Ok(Value::Number(match args.first() {
                Some(v) => to_number(v),
                None => 0.0,
            }))
        }),
    );
    env.insert(
        "Boolean".to_string(),
        native("Boolean", |_this, args| {
            Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
        }),
    );

    env.insert(
        "isNaN".to_string(),
        native("isNaN", |_this, args| {
            Ok(Value::Bool(to_number(&arg(args, 0)).is_nan()))
        }),
    );
    env.insert(
        "parseFloat".to_string(),
        native("parseFloat", |_this, args| {
            Ok(Value::Number(parse_float_prefix(
                &arg(args, 0).to_js_string(),
            )))
        }),
    );
    env.insert(
        "parseInt".to_string(),
        native("parseInt", |_this, args| {
            Ok(Value::Number(parse_int(
                &arg(args, 0).to_js_string(),
                &arg(args, 1),
            )))
        }),
    );

    env.insert("Math".to_string(), math_object());
}

fn native(
    name: &str,
    f: impl Fn(&Value, &[Value]) -> Result<Value> + 'static,
) -> Value {
    Value::Native(NativeFunction::new(name, Rc::new(f)))
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

fn num_arg(args: &[Value], i: usize) -> f64 {
    to_number(&arg(args, i))
}

/// The `Math` namespace object.
fn math_object() -> Value {
    let math = Value::object();
    if let Value::Object(obj) = &math {
        let mut obj = obj.borrow_mut();
        obj.set("PI".to_string(), Value::Number(std::f64::consts::PI));
        obj.set("E".to_string(), Value::Number(std::f64::consts::E));
        obj.set(
            "floor".to_string(),
            native("floor", |_t, args| Ok(Value::Number(num_arg(args, 0).floor()))),
        );
        obj.set(
            "ceil".to_string(),
            native("ceil", |_t, args| Ok(Value::Number(num_arg(args, 0).ceil()))),
        );
        obj.set(
            "round".to_string(),
            native("round", |_t, args| Ok(Value::Number(num_arg(args, 0).round()))),
        );
        obj.set(
            "abs".to_string(),
            native("abs", |_t, args| Ok(Value::Number(num_arg(args, 0).abs()))),
        );
        obj.set(
            "sqrt".to_string(),
            native("sqrt", |_t, args| Ok(Value::Number(num_arg(args, 0).sqrt()))),
        );
        obj.set(
            "pow".to_string(),
            native("pow", |_t, args| {
                Ok(Value::Number(num_arg(args, 0).powf(num_arg(args, 1))))
            }),
        );
        obj.set(
            "min".to_string(),
            native("min", |_t, args| {
                let mut best = f64::INFINITY;
                for v in args {
                    let n = to_number(v);
                    if n.is_nan() {
                        return Ok(Value::Number(f64::NAN));
                    }
                    best = best.min(n);
                }
                Ok(Value::Number(best))
            }),
        );
        obj.set(
            "max".to_string(),
            native("max", |_t, args| {
                let mut best = f64::NEG_INFINITY;
                for v in args {
                    let n = to_number(v);
                    if n.is_nan() {
                        return Ok(Value::Number(f64::NAN));
                    }
                    best = best.max(n);
                }
                Ok(Value::Number(best))
            }),
        );
    }
    math
}

/// `parseFloat`: the longest numeric prefix of the trimmed input, or NaN.
fn parse_float_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let mut result = f64::NAN;
    for (i, c) in s.char_indices() {
        if let Ok(n) = s[..i + c.len_utf8()].parse::<f64>() {
            result = n;
        }
    }
    result
}

/// `parseInt`: optional sign, optional `0x` prefix (radix 16 or unspecified),
/// then the longest run of digits valid in the radix.
fn parse_int(s: &str, radix_arg: &Value) -> f64 {
    let mut s = s.trim();

    let negative = match s.as_bytes().first() {
        Some(b'-') => {
            s = &s[1..];
            true
        }
        Some(b'+') => {
            s = &s[1..];
            false
        }
        _ => false,
    };

    let requested = to_number(radix_arg);
    let mut radix = if requested.is_nan() || requested == 0.0 {
        0
    } else {
        requested as u32
    };
    if radix != 0 && !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    if (radix == 0 || radix == 16)
        && let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        s = rest;
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }

    let mut value = f64::NAN;
    for c in s.chars() {
        match c.to_digit(radix) {
            Some(d) => {
                let acc = if value.is_nan() { 0.0 } else { value };
                value = acc * radix as f64 + d as f64;
            }
            None => break,
        }
    }

    if negative { -value } else { value }
}
