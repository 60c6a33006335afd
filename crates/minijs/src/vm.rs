//! Stack-based bytecode virtual machine.
//!
//! Executes the packed byte stream the compiler produces. Each frame is a
//! `(scope, code, program counter, operand stack)` quadruple; the dispatch
//! loop reads one opcode, advances, and acts on the operand stack until it
//! hits `Ret`. Function invocation spawns a fresh frame recursively on the
//! host stack — each guest call is one host call — so every frame keeps its
//! own operand stack and guest recursion is bounded by the configured
//! recursion limit before it can threaten host-stack resources.
//!
//! The code buffer is immutable after assembly and shared by reference
//! between frames and closures.

use std::rc::Rc;

use crate::bytecode::{self, Opcode};
use crate::error::{Error, Result};
use crate::operators;
use crate::scope::Scope;
use crate::value::{self, Closure, Value};

/// The bytecode interpreter.
///
/// Holds the per-execution accounting (instruction counter, call depth) and
/// the configured limits. All program state proper — scopes, the operand
/// stacks, the heap of objects and arrays — lives in [`Value`]s and
/// [`Scope`]s, so a `Vm` can be discarded after each execution.
pub struct Vm {
    /// Maximum opcodes dispatched per `execute` call, if bounded.
    instruction_limit: Option<u64>,
    /// Maximum guest call depth, if bounded.
    recursion_limit: Option<usize>,
    instruction_count: u64,
    call_depth: usize,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            instruction_limit: None,
            recursion_limit: None,
            instruction_count: 0,
            call_depth: 0,
        }
    }

    pub fn set_limits(&mut self, instruction_limit: Option<u64>, recursion_limit: Option<usize>) {
        self.instruction_limit = instruction_limit;
        self.recursion_limit = recursion_limit;
    }

    /// Run `code` starting at `entry` in the given scope and return the
    /// value the outermost frame yields at `Ret`.
    pub fn execute(&mut self, code: Rc<[u8]>, scope: Rc<Scope>, entry: usize) -> Result<Value> {
        self.instruction_count = 0;
        self.call_depth = 0;
        self.run_frame(&code, scope, entry, Vec::new())
    }

    /// Invoke a callable value from the host side.
    pub fn call(&mut self, func: &Value, receiver: &Value, args: Vec<Value>) -> Result<Value> {
        self.invoke(func, receiver, Value::array(args))
    }

    // -----------------------------------------------------------------------
    // Dispatch loop
    // -----------------------------------------------------------------------

    fn run_frame(
        &mut self,
        code: &Rc<[u8]>,
        scope: Rc<Scope>,
        mut pc: usize,
        mut stack: Vec<Value>,
    ) -> Result<Value> {
        loop {
            let byte = *code
                .get(pc)
                .ok_or_else(|| Error::Bytecode("program counter ran past the end".to_string()))?;
            let op = Opcode::try_from(byte).map_err(|_| Error::UnknownOpcode(byte))?;
            pc += 1;

            self.instruction_count += 1;
            if let Some(limit) = self.instruction_limit
                && self.instruction_count > limit
            {
                return Err(Error::InstructionLimitExceeded(limit));
            }

            match op {
                Opcode::Nop => {}

                // --- Immediates and constants ---
                Opcode::Undef => stack.push(Value::Undefined),
                Opcode::Null => stack.push(Value::Null),
                Opcode::True => stack.push(Value::Bool(true)),
                Opcode::False => stack.push(Value::Bool(false)),
                Opcode::Obj => stack.push(Value::object()),
                Opcode::Arr => stack.push(Value::array(Vec::new())),
                Opcode::Num => {
                    let n = bytecode::read_number(code, pc)?;
                    pc += 8;
                    stack.push(Value::Number(n));
                }
                Opcode::Addr => {
                    let addr = bytecode::read_address(code, pc)?;
                    pc += 4;
                    stack.push(Value::Number(addr as f64));
                }
                Opcode::Str => {
                    let (s, next) = bytecode::read_string(code, pc)?;
                    pc = next;
                    stack.push(Value::Str(s));
                }

                // --- Stack shuffling ---
                Opcode::Pop => {
                    pop(&mut stack)?;
                }
                Opcode::Top => {
                    let top = peek(&stack)?.clone();
                    stack.push(top);
                }
                Opcode::Top2 => {
                    if stack.len() < 2 {
                        return Err(Error::Bytecode("operand stack underflow".to_string()));
                    }
                    let a = stack[stack.len() - 2].clone();
                    let b = stack[stack.len() - 1].clone();
                    stack.push(a);
                    stack.push(b);
                }

                // --- Scope ---
                Opcode::Var => {
                    let name = pop_string(&mut stack)?;
                    scope.declare(&name);
                }
                Opcode::Load => {
                    let name = pop_string(&mut stack)?;
                    stack.push(scope.load(&name)?);
                }
                Opcode::Out => {
                    let name = pop_string(&mut stack)?;
                    let value = pop(&mut stack)?;
                    scope.assign(&name, value.clone())?;
                    stack.push(value);
                }

                // --- Control flow ---
                Opcode::Jump => {
                    pc = pop_address(&mut stack)?;
                }
                Opcode::JumpIf => {
                    let target = pop_address(&mut stack)?;
                    if pop(&mut stack)?.is_truthy() {
                        pc = target;
                    }
                }
                Opcode::JumpNot => {
                    let target = pop_address(&mut stack)?;
                    if !pop(&mut stack)?.is_truthy() {
                        pc = target;
                    }
                }

                // --- Functions ---
                Opcode::Func => {
                    let addr = pop_address(&mut stack)?;
                    let arity = pop_number(&mut stack)? as u32;
                    let name = match pop(&mut stack)? {
                        Value::Str(s) => Some(s),
                        Value::Null | Value::Undefined => None,
                        other => {
                            return Err(Error::Type {
                                expected: "string or null function name".to_string(),
                                got: other.type_name().to_string(),
                            });
                        }
                    };
                    stack.push(Value::Function(Rc::new(Closure {
                        name,
                        arity,
                        addr,
                        scope: Rc::clone(&scope),
                        code: Rc::clone(code),
                    })));
                }
                Opcode::Call => {
                    let args = pop_array(&mut stack)?;
                    let func = pop(&mut stack)?;
                    let receiver = pop(&mut stack)?;
                    let result = self.invoke(&func, &receiver, args)?;
                    stack.push(result);
                }
                Opcode::New => {
                    let args = pop_array(&mut stack)?;
                    let func = pop(&mut stack)?;
                    let result = self.construct(&func, args)?;
                    stack.push(result);
                }
                Opcode::Ret => {
                    return pop(&mut stack);
                }

                // --- Properties ---
                Opcode::Get => {
                    let key = pop(&mut stack)?;
                    let object = pop(&mut stack)?;
                    stack.push(get_property(&object, &key)?);
                }
                Opcode::Set => {
                    let value = pop(&mut stack)?;
                    let key = pop(&mut stack)?;
                    let object = pop(&mut stack)?;
                    set_property(&object, &key, value.clone())?;
                    stack.push(value);
                }
                Opcode::In => {
                    let key = pop(&mut stack)?;
                    let object = pop(&mut stack)?;
                    stack.push(Value::Bool(has_property(&object, &key)?));
                }
                Opcode::Delete => {
                    let key = pop(&mut stack)?;
                    let object = pop(&mut stack)?;
                    stack.push(Value::Bool(delete_property(&object, &key)?));
                }

                // --- Unary operators ---
                Opcode::Not => {
                    let operand = pop(&mut stack)?;
                    stack.push(Value::Bool(!operand.is_truthy()));
                }
                Opcode::BNot => {
                    let operand = pop(&mut stack)?;
                    stack.push(Value::Number(!operators::to_int32(&operand) as f64));
                }
                Opcode::TypeOf => {
                    let operand = pop(&mut stack)?;
                    stack.push(Value::str(operand.type_of()));
                }

                Opcode::InstanceOf => {
                    let constructor = pop(&mut stack)?;
                    let _instance = pop(&mut stack)?;
                    if !constructor.is_callable() {
                        return Err(Error::Type {
                            expected: "function".to_string(),
                            got: constructor.type_name().to_string(),
                        });
                    }
                    // No prototype chains are synthesized in this subset.
                    stack.push(Value::Bool(false));
                }

                // --- Binary operators ---
                Opcode::Eq
                | Opcode::Neq
                | Opcode::Seq
                | Opcode::Sneq
                | Opcode::Lt
                | Opcode::Lte
                | Opcode::Gt
                | Opcode::Gte
                | Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Exp
                | Opcode::Div
                | Opcode::Mod
                | Opcode::BOr
                | Opcode::BXor
                | Opcode::BAnd
                | Opcode::LShift
                | Opcode::RShift
                | Opcode::UrShift
                | Opcode::Or
                | Opcode::And => {
                    let right = pop(&mut stack)?;
                    let left = pop(&mut stack)?;
                    stack.push(operators::apply_binary(op, &left, &right)?);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Invocation
    // -----------------------------------------------------------------------

    /// Call a function value with a receiver and an argument array.
    ///
    /// A closure call builds a child scope of the closure's captured scope,
    /// binds `this` and (for named function expressions) the closure's own
    /// name, and runs a fresh frame whose operand stack holds exactly the
    /// argument array. The closure's arity is not enforced.
    fn invoke(&mut self, func: &Value, receiver: &Value, args: Value) -> Result<Value> {
        match func {
            Value::Native(native) => {
                let items = match &args {
                    Value::Array(items) => items.borrow().clone(),
                    other => {
                        return Err(Error::Type {
                            expected: "argument array".to_string(),
                            got: other.type_name().to_string(),
                        });
                    }
                };
                (native.func)(receiver, &items)
            }
            Value::Function(closure) => {
                if let Some(limit) = self.recursion_limit
                    && self.call_depth >= limit
                {
                    return Err(Error::RecursionLimitExceeded(limit));
                }

                let frame_scope = Scope::child(&closure.scope);
                frame_scope.declare_with("this", receiver.clone());
                if let Some(name) = &closure.name {
                    frame_scope.declare_with(name, func.clone());
                }

                self.call_depth += 1;
                let result =
                    self.run_frame(&Rc::clone(&closure.code), frame_scope, closure.addr, vec![args]);
                self.call_depth -= 1;
                result
            }
            other => Err(Error::Type {
                expected: "function".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }

    /// The `new` protocol: invoke with a fresh object as the receiver and
    /// keep the constructor's return value only when it is itself an object.
    fn construct(&mut self, func: &Value, args: Value) -> Result<Value> {
        let instance = Value::object();
        let result = self.invoke(func, &instance, args)?;
        if result.is_object_like() {
            Ok(result)
        } else {
            Ok(instance)
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Operand-stack helpers
// ---------------------------------------------------------------------------

fn pop(stack: &mut Vec<Value>) -> Result<Value> {
    stack
        .pop()
        .ok_or_else(|| Error::Bytecode("operand stack underflow".to_string()))
}

fn peek(stack: &[Value]) -> Result<&Value> {
    stack
        .last()
        .ok_or_else(|| Error::Bytecode("operand stack underflow".to_string()))
}

fn pop_string(stack: &mut Vec<Value>) -> Result<String> {
    match pop(stack)? {
        Value::Str(s) => Ok(s),
        other => Err(Error::Type {
            expected: "string".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}

fn pop_number(stack: &mut Vec<Value>) -> Result<f64> {
    match pop(stack)? {
        Value::Number(n) => Ok(n),
        other => Err(Error::Type {
            expected: "number".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}

fn pop_address(stack: &mut Vec<Value>) -> Result<usize> {
    let n = pop_number(stack)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(Error::Bytecode(format!("invalid jump address {}", n)));
    }
    Ok(n as usize)
}

fn pop_array(stack: &mut Vec<Value>) -> Result<Value> {
    let value = pop(stack)?;
    match value {
        Value::Array(_) => Ok(value),
        other => Err(Error::Type {
            expected: "argument array".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Property access
// ---------------------------------------------------------------------------

/// A numeric (or numeric-string) key usable as a dense array index.
fn array_index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64 => {
            Some(*n as usize)
        }
        Value::Str(s) => s.parse::<usize>().ok(),
        _ => None,
    }
}

fn get_property(object: &Value, key: &Value) -> Result<Value> {
    let name = key.to_js_string();
    match object {
        Value::Object(obj) => Ok(obj.borrow().get(&name).unwrap_or(Value::Undefined)),
        Value::Array(items) => {
            if name == "length" {
                return Ok(Value::Number(items.borrow().len() as f64));
            }
            match array_index(key) {
                Some(i) => Ok(items.borrow().get(i).cloned().unwrap_or(Value::Undefined)),
                None => Ok(Value::Undefined),
            }
        }
        Value::Str(s) => {
            if name == "length" {
                return Ok(Value::Number(value::utf16_len(s) as f64));
            }
            match array_index(key).and_then(|i| value::utf16_at(s, i)) {
                Some(unit) => Ok(Value::Str(unit)),
                None => Ok(Value::Undefined),
            }
        }
        Value::Function(closure) => Ok(match name.as_str() {
            "length" => Value::Number(closure.arity as f64),
            "name" => Value::str(closure.name.as_deref().unwrap_or("")),
            _ => Value::Undefined,
        }),
        Value::Native(native) => Ok(match name.as_str() {
            "length" => Value::Number(0.0),
            "name" => Value::str(native.name.as_str()),
            _ => Value::Undefined,
        }),
        Value::Undefined | Value::Null => Err(Error::Runtime(format!(
            "cannot read property '{}' of {}",
            name,
            object.type_name()
        ))),
        Value::Number(_) | Value::Bool(_) => Ok(Value::Undefined),
    }
}

fn set_property(object: &Value, key: &Value, value: Value) -> Result<()> {
    let name = key.to_js_string();
    match object {
        Value::Object(obj) => {
            obj.borrow_mut().set(name, value);
            Ok(())
        }
        Value::Array(items) => {
            if name == "length" {
                let len = operators::to_uint32(&value) as usize;
                items.borrow_mut().resize(len, Value::Undefined);
                return Ok(());
            }
            if let Some(i) = array_index(key) {
                let mut items = items.borrow_mut();
                if i >= items.len() {
                    items.resize(i + 1, Value::Undefined);
                }
                items[i] = value;
            }
            // Non-index keys on an array are silently dropped.
            Ok(())
        }
        Value::Undefined | Value::Null => Err(Error::Runtime(format!(
            "cannot set property '{}' of {}",
            name,
            object.type_name()
        ))),
        // Writes to other primitives (and to function values) vanish.
        _ => Ok(()),
    }
}

fn has_property(object: &Value, key: &Value) -> Result<bool> {
    let name = key.to_js_string();
    match object {
        Value::Object(obj) => Ok(obj.borrow().has(&name)),
        Value::Array(items) => {
            if name == "length" {
                return Ok(true);
            }
            Ok(array_index(key).is_some_and(|i| i < items.borrow().len()))
        }
        Value::Str(s) => {
            if name == "length" {
                return Ok(true);
            }
            Ok(array_index(key).is_some_and(|i| i < value::utf16_len(s)))
        }
        Value::Function(_) | Value::Native(_) => Ok(matches!(name.as_str(), "length" | "name")),
        other => Err(Error::Type {
            expected: "object".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}

fn delete_property(object: &Value, key: &Value) -> Result<bool> {
    let name = key.to_js_string();
    match object {
        Value::Object(obj) => Ok(obj.borrow_mut().delete(&name)),
        Value::Array(items) => {
            if name == "length" {
                return Ok(false);
            }
            if let Some(i) = array_index(key) {
                let mut items = items.borrow_mut();
                if i < items.len() {
                    // Dense storage: a deleted slot reads as undefined.
                    items[i] = Value::Undefined;
                }
            }
            Ok(true)
        }
        Value::Undefined | Value::Null => Err(Error::Runtime(format!(
            "cannot delete property '{}' of {}",
            name,
            object.type_name()
        ))),
        _ => Ok(true),
    }
}
