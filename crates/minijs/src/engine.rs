//! The embedder facade: globals, host functions, limits, and execution.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::builtins::{self, OutputBuffer};
use crate::compiler;
use crate::error::Result;
use crate::scope::{GlobalEnv, Scope};
use crate::value::{NativeFunction, Value};
use crate::vm::Vm;

/// Resource limits applied to each [`Engine::run`] call.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum number of bytecode instructions per run.
    /// `None` means unlimited.
    pub max_instructions: Option<u64>,
    /// Maximum guest call depth. Guest calls recurse on the host stack, so
    /// this is also what keeps runaway guest recursion away from host-stack
    /// exhaustion. `None` means unlimited.
    pub max_recursion_depth: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_instructions: None,
            max_recursion_depth: Some(1000),
        }
    }
}

/// An embeddable script engine.
///
/// Owns the ambient global environment and the global scope linked to it.
/// Globals — whether installed by the host or created by guest code —
/// persist across `run` calls on the same engine.
///
/// # Example
///
/// ```
/// use minijs::{Engine, Value};
///
/// let mut engine = Engine::with_builtins();
///
/// engine.register_fn("greet", |_this, args| {
///     let name = args.first().map(|v| v.to_js_string()).unwrap_or_default();
///     Ok(Value::Str(format!("Hello, {}!", name)))
/// });
///
/// let result = engine.run("greet('Ada');").unwrap();
/// assert_eq!(result, Value::Str("Hello, Ada!".to_string()));
/// ```
pub struct Engine {
    globals: GlobalEnv,
    global_scope: Rc<Scope>,
    output: OutputBuffer,
    limits: Limits,
}

impl Engine {
    /// Create an engine with an empty ambient environment.
    pub fn new() -> Self {
        let globals: GlobalEnv = Rc::new(RefCell::new(HashMap::new()));
        let global_scope = Scope::global(Rc::clone(&globals));
        Self {
            globals,
            global_scope,
            output: Rc::new(RefCell::new(Vec::new())),
            limits: Limits::default(),
        }
    }

    /// Create an engine with the default host library (`print`, `Math`,
    /// `parseInt`, conversions, …) pre-installed.
    ///
    /// # Example
    ///
    /// ```
    /// use minijs::{Engine, Value};
    ///
    /// let mut engine = Engine::with_builtins();
    /// let result = engine.run("Math.floor(2.7);").unwrap();
    /// assert_eq!(result, Value::Number(2.0));
    /// ```
    pub fn with_builtins() -> Self {
        let engine = Self::new();
        builtins::install(&engine.globals, &engine.output);
        engine
    }

    /// Install or replace an ambient global.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.borrow_mut().insert(name.into(), value);
    }

    /// Read a global as guest code would: through the global scope, falling
    /// back to the ambient environment, and finally to `undefined`.
    pub fn global(&self, name: &str) -> Value {
        self.global_scope.load(name).unwrap_or(Value::Undefined)
    }

    /// Register a host function callable from guest code.
    ///
    /// The function receives the call receiver (`this`) and the evaluated
    /// arguments.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        let name = name.into();
        let value = Value::Native(NativeFunction::new(name.clone(), Rc::new(f)));
        self.globals.borrow_mut().insert(name, value);
    }

    /// Set the resource limits for subsequent runs.
    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Take and clear everything `print` has written.
    pub fn take_print_output(&mut self) -> Vec<String> {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    /// Compile and execute source text; returns the script's final value.
    pub fn run(&mut self, source: &str) -> Result<Value> {
        let code = compiler::compile(source)?;
        self.run_bytecode(&code)
    }

    /// Execute an already-assembled bytecode program against this engine's
    /// global scope. Execution starts at offset 0, the script-root entry.
    pub fn run_bytecode(&mut self, code: &[u8]) -> Result<Value> {
        let code: Rc<[u8]> = Rc::from(code);
        let mut vm = Vm::new();
        vm.set_limits(self.limits.max_instructions, self.limits.max_recursion_depth);
        vm.execute(code, Rc::clone(&self.global_scope), 0)
    }

    /// Invoke a guest function value from the host — for example one a
    /// script returned or stored in a global. Closures carry their code
    /// buffer, so this works after the run that created them has finished.
    pub fn call_function(
        &mut self,
        func: &Value,
        receiver: &Value,
        args: Vec<Value>,
    ) -> Result<Value> {
        let mut vm = Vm::new();
        vm.set_limits(self.limits.max_instructions, self.limits.max_recursion_depth);
        vm.call(func, receiver, args)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
