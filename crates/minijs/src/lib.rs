//! minijs — a minimal, embeddable JavaScript-subset bytecode compiler and
//! virtual machine.
//!
//! minijs compiles a strict subset of JavaScript into a compact byte stream
//! and executes it on a stack-based VM. Source text can be compiled once and
//! shipped as bytes, or compiled and run in one step.
//!
//! # Quick Start
//!
//! ```
//! use minijs::{Engine, Value};
//!
//! let mut engine = Engine::with_builtins();
//!
//! // Register a host function callable from scripts
//! engine.register_fn("fetch_count", |_this, _args| Ok(Value::Number(40.0)));
//!
//! let result = engine.run("var n = fetch_count(); n + 2;").unwrap();
//! assert_eq!(result, Value::Number(42.0));
//! ```
//!
//! # Supported Language Features
//!
//! ## Types
//! - `undefined`, `null`, booleans, numbers (f64), strings
//! - object literals (insertion-ordered), array literals
//! - first-class functions and closures
//!
//! ## Operators
//! - Arithmetic: `+`, `-`, `*`, `/`, `%`, `**` (with the usual coercions;
//!   `+` concatenates strings)
//! - Comparison: `==`, `!=`, `===`, `!==`, `<`, `<=`, `>`, `>=`, `in`,
//!   `instanceof`
//! - Logical: `&&`, `||`, `!` (short-circuiting, operand-selecting)
//! - Bitwise: `~`, `|`, `^`, `&`, `<<`, `>>`, `>>>`
//! - `typeof`, `void`, `delete`, the ternary, sequence expressions,
//!   pre/post `++`/`--`, compound assignment
//!
//! ## Control Flow
//! - `if`/`else`, `while`, `do`/`while`, `for` with `break`/`continue`
//! - `switch` with intentional fall-through
//!
//! ## Functions
//! - declarations and (named) function expressions, recursion, `this`,
//!   `new`, `return`
//! - `var` hoisting to function scope
//!
//! # Not Supported
//!
//! - `try`/`catch`/`throw`, labeled statements, `for-in`
//! - `let`/`const` block scoping
//! - classes, generators, async, arrow functions, destructuring
//! - prototype chains (beyond what host functions provide themselves)
//!
//! # Bytecode
//!
//! [`compile`] produces a headerless byte stream: one-byte opcodes with
//! big-endian immediates, executing from offset 0. See [`Opcode`] for the
//! instruction set. The bytes are self-contained and can be persisted and
//! executed later with [`Engine::run_bytecode`].

mod builtins;
mod bytecode;
mod compiler;
mod engine;
mod error;
mod hoist;
mod operators;
mod scope;
mod uid;
mod value;
mod vm;

pub use bytecode::{CodeBuilder, Instruction, Opcode};
pub use engine::{Engine, Limits};
pub use error::{Error, Result};
pub use scope::{GlobalEnv, Scope};
pub use value::{Closure, HostFn, JsObject, NativeFunction, Value};
pub use vm::Vm;

/// Compile source text to a bytecode program.
///
/// ```
/// let bytes = minijs::compile("1 + 2;").unwrap();
/// assert!(!bytes.is_empty());
/// ```
pub fn compile(source: &str) -> Result<Vec<u8>> {
    compiler::compile(source)
}

/// Compile and run a script in a fresh [`Engine::with_builtins`]; returns
/// the script's final value.
///
/// ```
/// use minijs::Value;
///
/// assert_eq!(minijs::run("var x = 1; x + 2;").unwrap(), Value::Number(3.0));
/// ```
pub fn run(source: &str) -> Result<Value> {
    let mut engine = Engine::with_builtins();
    engine.run(source)
}
