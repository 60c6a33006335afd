use minijs::{Engine, Error, Limits, Value};
use pretty_assertions::assert_eq;

fn run(src: &str) -> Value {
    minijs::run(src).unwrap()
}

// ---------------------------------------------------------------------------
// Literals, arithmetic, and coercion
// ---------------------------------------------------------------------------

#[test]
fn test_basic_arithmetic() {
    assert_eq!(run("2 + 2;"), Value::Number(4.0));
    assert_eq!(run("10 - 3;"), Value::Number(7.0));
    assert_eq!(run("4 * 5;"), Value::Number(20.0));
    assert_eq!(run("10 / 4;"), Value::Number(2.5));
    assert_eq!(run("10 % 3;"), Value::Number(1.0));
    assert_eq!(run("2 ** 8;"), Value::Number(256.0));
}

#[test]
fn test_final_expression_is_script_value() {
    assert_eq!(run("var x = 1; x + 2;"), Value::Number(3.0));
    // Without a trailing expression statement, a script yields undefined.
    assert_eq!(run("var x = 1;"), Value::Undefined);
    assert_eq!(run(""), Value::Undefined);
}

#[test]
fn test_string_concatenation() {
    assert_eq!(run("'hello' + ' ' + 'world';"), Value::str("hello world"));
    assert_eq!(run("1 + '2';"), Value::str("12"));
    assert_eq!(run("'' + null;"), Value::str("null"));
    assert_eq!(run("[1,2] + '';"), Value::str("1,2"));
}

#[test]
fn test_unary_operators() {
    assert_eq!(run("-5;"), Value::Number(-5.0));
    assert_eq!(run("+'3';"), Value::Number(3.0));
    assert_eq!(run("!0;"), Value::Bool(true));
    assert_eq!(run("!'x';"), Value::Bool(false));
    assert_eq!(run("void 0;"), Value::Undefined);
    assert_eq!(run("~5;"), Value::Number(-6.0));
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(run("5 & 3;"), Value::Number(1.0));
    assert_eq!(run("5 | 3;"), Value::Number(7.0));
    assert_eq!(run("5 ^ 3;"), Value::Number(6.0));
    assert_eq!(run("1 << 4;"), Value::Number(16.0));
    assert_eq!(run("-16 >> 2;"), Value::Number(-4.0));
    assert_eq!(run("-1 >>> 28;"), Value::Number(15.0));
}

#[test]
fn test_comparisons() {
    assert_eq!(run("5 > 3;"), Value::Bool(true));
    assert_eq!(run("5 < 3;"), Value::Bool(false));
    assert_eq!(run("3 <= 3;"), Value::Bool(true));
    assert_eq!(run("'a' < 'b';"), Value::Bool(true));
    // String-string ordering is lexicographic, mixed ordering is numeric.
    assert_eq!(run("'10' < '2';"), Value::Bool(true));
    assert_eq!(run("'10' < 2;"), Value::Bool(false));
}

#[test]
fn test_equality() {
    assert_eq!(run("1 == '1';"), Value::Bool(true));
    assert_eq!(run("1 === '1';"), Value::Bool(false));
    assert_eq!(run("null == undefined;"), Value::Bool(true));
    assert_eq!(run("null === undefined;"), Value::Bool(false));
    assert_eq!(run("NaN == NaN;"), Value::Bool(false));
    assert_eq!(run("null == 0;"), Value::Bool(false));
}

#[test]
fn test_typeof() {
    assert_eq!(run("typeof 1;"), Value::str("number"));
    assert_eq!(run("typeof 'a';"), Value::str("string"));
    assert_eq!(run("typeof true;"), Value::str("boolean"));
    assert_eq!(run("typeof null;"), Value::str("object"));
    assert_eq!(run("typeof undefined;"), Value::str("undefined"));
    assert_eq!(run("typeof print;"), Value::str("function"));
    assert_eq!(run("var t = typeof [];  t;"), Value::str("object"));
    // typeof never trips on a name that was never declared anywhere.
    assert_eq!(run("typeof neverDeclared;"), Value::str("undefined"));
}

// ---------------------------------------------------------------------------
// Variables, assignment, and update expressions
// ---------------------------------------------------------------------------

#[test]
fn test_variables_and_assignment() {
    assert_eq!(run("var x = 10; var y = 20; x + y;"), Value::Number(30.0));
    assert_eq!(run("var x; x === undefined;"), Value::Bool(true));
    assert_eq!(run("var a = 1, b = 2; a + b;"), Value::Number(3.0));
}

#[test]
fn test_assignment_is_an_expression() {
    assert_eq!(run("var x; var y = (x = 5); x + y;"), Value::Number(10.0));
}

#[test]
fn test_compound_assignment() {
    assert_eq!(run("var x = 10; x += 5; x;"), Value::Number(15.0));
    // Non-commutative compounds store left-op-right.
    assert_eq!(run("var x = 10; x -= 3; x;"), Value::Number(7.0));
    assert_eq!(run("var x = 20; x /= 4; x;"), Value::Number(5.0));
    assert_eq!(run("var x = 10; x %= 3; x;"), Value::Number(1.0));
    assert_eq!(run("var x = 1; x <<= 3; x;"), Value::Number(8.0));
    assert_eq!(run("var s = 'a'; s += 'b'; s;"), Value::str("ab"));
}

#[test]
fn test_compound_assignment_to_member() {
    assert_eq!(run("var o = {a: 1}; o.a += 10; o.a;"), Value::Number(11.0));
    assert_eq!(run("var o = {v: 20}; o.v /= 4; o.v;"), Value::Number(5.0));
    assert_eq!(run("var a = [3]; a[0] *= 7; a[0];"), Value::Number(21.0));
}

#[test]
fn test_update_expressions() {
    // Postfix yields the pre-update value, prefix the post-update value.
    assert_eq!(run("var x = 5; var a = x++; a * 10 + x;"), Value::Number(56.0));
    assert_eq!(run("var x = 5; var a = ++x; a * 10 + x;"), Value::Number(66.0));
    assert_eq!(run("var x = 5; var a = x--; a * 10 + x;"), Value::Number(54.0));
    assert_eq!(run("var o = {n: 1}; o.n++; ++o.n; o.n;"), Value::Number(3.0));
    assert_eq!(
        run("var a = [5]; var v = a[0]++; v * 10 + a[0];"),
        Value::Number(56.0)
    );
}

#[test]
fn test_sequence_expression() {
    assert_eq!(run("1, 2, 3;"), Value::Number(3.0));
    assert_eq!(run("var x = 0; x = 5, x + 1;"), Value::Number(6.0));
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn test_if_else() {
    assert_eq!(
        run("var r; if (10 > 5) { r = 'big'; } else { r = 'small'; } r;"),
        Value::str("big")
    );
    assert_eq!(
        run("var r = 'none'; if (1 > 5) r = 'yes'; r;"),
        Value::str("none")
    );
    assert_eq!(
        run("var r; if (0) r = 'a'; else if (1) r = 'b'; else r = 'c'; r;"),
        Value::str("b")
    );
}

#[test]
fn test_ternary() {
    assert_eq!(run("1 ? 'y' : 'n';"), Value::str("y"));
    assert_eq!(run("'' ? 'y' : 'n';"), Value::str("n"));
    assert_eq!(run("var n = 7; n < 10 ? n * 2 : n;"), Value::Number(14.0));
}

#[test]
fn test_while_loop() {
    assert_eq!(
        run("var count = 0; while (count < 5) { count = count + 1; } count;"),
        Value::Number(5.0)
    );
    assert_eq!(run("var c = 0; while (false) c++; c;"), Value::Number(0.0));
}

#[test]
fn test_do_while_runs_at_least_once() {
    assert_eq!(run("var c = 0; do { c++; } while (false); c;"), Value::Number(1.0));
    assert_eq!(
        run("var n = 5; var c = 0; do { c++; n--; } while (n > 0); c;"),
        Value::Number(5.0)
    );
}

#[test]
fn test_for_loop() {
    assert_eq!(
        run("var s = ''; for (var i = 0; i < 3; i++) s += i; s;"),
        Value::str("012")
    );
    // A false test on entry skips the body entirely.
    assert_eq!(
        run("var c = 0; for (var i = 5; i < 3; i++) c++; c;"),
        Value::Number(0.0)
    );
    // Init and update are optional.
    assert_eq!(
        run("var i = 0; for (; i < 4;) i++; i;"),
        Value::Number(4.0)
    );
}

#[test]
fn test_break_and_continue() {
    assert_eq!(
        run("var i = 0; while (true) { i++; if (i >= 4) break; } i;"),
        Value::Number(4.0)
    );
    // continue targets the update expression.
    assert_eq!(
        run("var s = 0; for (var i = 0; i < 5; i++) { if (i % 2 === 0) continue; s += i; } s;"),
        Value::Number(4.0)
    );
}

#[test]
fn test_nested_loop_break_is_inner_only() {
    let src = r#"
var hits = 0;
for (var i = 0; i < 3; i++) {
    for (var j = 0; j < 10; j++) {
        if (j === 1) break;
        hits++;
    }
}
hits;
"#;
    assert_eq!(run(src), Value::Number(3.0));
}

#[test]
fn test_switch_fall_through() {
    let src = r#"
var s = '';
switch (2) {
    case 1: s += 'a'; break;
    case 2: s += 'b';
    case 3: s += 'c';
    default: s += 'd';
}
s;
"#;
    assert_eq!(run(src), Value::str("bcd"));
}

#[test]
fn test_switch_break_and_default() {
    let pick = |n: i32| {
        run(&format!(
            r#"
var s = '';
switch ({}) {{
    case 1: s = 'one'; break;
    case 2: s = 'two'; break;
    default: s = 'other';
}}
s;
"#,
            n
        ))
    };
    assert_eq!(pick(1), Value::str("one"));
    assert_eq!(pick(2), Value::str("two"));
    assert_eq!(pick(9), Value::str("other"));
}

#[test]
fn test_switch_uses_strict_equality() {
    assert_eq!(
        run("var s = 'miss'; switch ('1') { case 1: s = 'hit'; } s;"),
        Value::str("miss")
    );
}

#[test]
fn test_switch_without_default_or_match() {
    assert_eq!(
        run("var s = 'none'; switch (9) { case 1: s = 'a'; } s;"),
        Value::str("none")
    );
}

#[test]
fn test_nested_switches() {
    let src = r#"
var r = '';
switch (1) {
    case 1:
        switch (2) {
            case 2: r += 'inner'; break;
        }
        r += '-outer';
        break;
}
r;
"#;
    assert_eq!(run(src), Value::str("inner-outer"));
}

// ---------------------------------------------------------------------------
// Short-circuit logic
// ---------------------------------------------------------------------------

#[test]
fn test_logical_operators_select_operands() {
    assert_eq!(run("0 || 'fallback';"), Value::str("fallback"));
    assert_eq!(run("'first' || 'second';"), Value::str("first"));
    assert_eq!(run("1 && 2;"), Value::Number(2.0));
    assert_eq!(run("0 && 2;"), Value::Number(0.0));
}

#[test]
fn test_short_circuit_skips_evaluation() {
    let src = r#"
var calls = 0;
function bump() { calls++; return true; }
false && bump();
true || bump();
calls;
"#;
    assert_eq!(run(src), Value::Number(0.0));
    // The right operand would fault if evaluated.
    assert_eq!(run("null && missing.prop;"), Value::Null);
}

// ---------------------------------------------------------------------------
// Objects and arrays
// ---------------------------------------------------------------------------

#[test]
fn test_object_literals() {
    assert_eq!(run("var o = {a: 1, b: 2}; o.a + o.b;"), Value::Number(3.0));
    assert_eq!(run("var o = {'a b': 1}; o['a b'];"), Value::Number(1.0));
    assert_eq!(run("var o = {1: 'one'}; o[1];"), Value::str("one"));
    // Shorthand properties read the variable of the same name.
    assert_eq!(run("var a = 7; var o = {a}; o.a;"), Value::Number(7.0));
    assert_eq!(run("var o = {}; o.missing === undefined;"), Value::Bool(true));
}

#[test]
fn test_computed_property_access() {
    assert_eq!(run("var k = 'x'; var o = {}; o[k] = 5; o.x;"), Value::Number(5.0));
    assert_eq!(run("var o = {x: 9}; var k = 'x'; o[k];"), Value::Number(9.0));
}

#[test]
fn test_array_literals() {
    assert_eq!(run("[1, 2, 3].length;"), Value::Number(3.0));
    assert_eq!(run("var a = [10, 20]; a[0] + a[1];"), Value::Number(30.0));
    assert_eq!(run("var a = []; a[3] = 1; a.length;"), Value::Number(4.0));
    // An elision occupies its index with null.
    assert_eq!(run("var a = [1,,3]; a[1] === null;"), Value::Bool(true));
    assert_eq!(run("var a = [1]; a[9] === undefined;"), Value::Bool(true));
}

#[test]
fn test_array_length_assignment() {
    assert_eq!(run("var a = [1, 2, 3]; a.length = 1; a.length;"), Value::Number(1.0));
    assert_eq!(run("var a = [1, 2, 3]; a.length = 1; a[1] === undefined;"), Value::Bool(true));
}

#[test]
fn test_string_properties() {
    assert_eq!(run("'abc'.length;"), Value::Number(3.0));
    assert_eq!(run("'abc'[1];"), Value::str("b"));
    assert_eq!(run("var s = 'hi'; s[5] === undefined;"), Value::Bool(true));
}

#[test]
fn test_in_operator() {
    assert_eq!(run("var o = {a: 1}; 'a' in o;"), Value::Bool(true));
    assert_eq!(run("var o = {a: 1}; 'b' in o;"), Value::Bool(false));
    assert_eq!(run("var a = [1, 2]; 0 in a;"), Value::Bool(true));
    assert_eq!(run("var a = [1, 2]; 5 in a;"), Value::Bool(false));
    assert_eq!(run("var a = [1, 2]; 'length' in a;"), Value::Bool(true));
}

#[test]
fn test_delete() {
    assert_eq!(run("var o = {a: 1, b: 2}; delete o.a; 'a' in o;"), Value::Bool(false));
    assert_eq!(run("var o = {a: 1, b: 2}; delete o.a; o.b;"), Value::Number(2.0));
    assert_eq!(run("var o = {}; delete o.ghost;"), Value::Bool(false));
    assert_eq!(run("var x = 1; delete x;"), Value::Bool(true));
    assert_eq!(run("var a = [1, 2]; delete a[0]; a[0] === undefined;"), Value::Bool(true));
}

#[test]
fn test_objects_are_references() {
    assert_eq!(
        run("var a = {n: 1}; var b = a; b.n = 9; a.n;"),
        Value::Number(9.0)
    );
    assert_eq!(run("var a = {}; var b = a; a === b;"), Value::Bool(true));
    assert_eq!(run("({}) === ({});"), Value::Bool(false));
}

// ---------------------------------------------------------------------------
// Functions and closures
// ---------------------------------------------------------------------------

#[test]
fn test_function_declaration_and_call() {
    assert_eq!(
        run("function add(a, b) { return a + b; } add(2, 3);"),
        Value::Number(5.0)
    );
    // Missing arguments arrive as undefined; extras are ignored.
    assert_eq!(
        run("function f(a, b) { return b === undefined; } f(1);"),
        Value::Bool(true)
    );
    assert_eq!(
        run("function f(a) { return a; } f(1, 2, 3);"),
        Value::Number(1.0)
    );
}

#[test]
fn test_recursion() {
    assert_eq!(
        run("function fact(n) { return n < 2 ? 1 : n * fact(n - 1); } fact(5);"),
        Value::Number(120.0)
    );
}

#[test]
fn test_named_function_expression_self_reference() {
    assert_eq!(
        run("var f = function g(n) { return n < 1 ? 0 : n + g(n - 1); }; f(4);"),
        Value::Number(10.0)
    );
    // The inner name is invisible outside the function itself.
    assert_eq!(
        run("var f = function g() { return 1; }; typeof g;"),
        Value::str("undefined")
    );
}

#[test]
fn test_function_returns_undefined_by_default() {
    assert_eq!(run("function f() {} f() === undefined;"), Value::Bool(true));
    assert_eq!(run("function f() { return; } f() === undefined;"), Value::Bool(true));
}

#[test]
fn test_hoisting_typeof_before_declaration() {
    assert_eq!(
        run("function f() { var before = typeof x; var x = 1; return before; } f();"),
        Value::str("undefined")
    );
    // Assignment before the var statement still hits the hoisted binding.
    assert_eq!(run("function f() { x = 3; var x; return x; } f();"), Value::Number(3.0));
}

#[test]
fn test_var_does_not_reset_parameter() {
    assert_eq!(run("function f(x) { var x; return x; } f(7);"), Value::Number(7.0));
}

#[test]
fn test_closure_outlives_creator() {
    let src = r#"
function counter() {
    var n = 0;
    return function() { n++; return n; };
}
var tick = counter();
tick();
tick();
tick();
"#;
    assert_eq!(run(src), Value::Number(3.0));
}

#[test]
fn test_closures_share_var_bindings() {
    // var is function-scoped: every closure made in the loop sees the final i.
    let src = r#"
var fns = [];
for (var i = 0; i < 3; i++) fns[i] = function() { return i; };
fns[0]() + fns[1]() + fns[2]();
"#;
    assert_eq!(run(src), Value::Number(9.0));
}

#[test]
fn test_iife_captures_per_call() {
    let src = r#"
var a = [];
for (var i = 0; i < 3; i++) a[i] = (function(j) { return function() { return j; }; })(i);
a[0]() + a[1]() + a[2]();
"#;
    assert_eq!(run(src), Value::Number(3.0));
}

#[test]
fn test_two_closures_one_scope() {
    let src = r#"
function pair() {
    var n = 0;
    return { inc: function() { n++; }, get: function() { return n; } };
}
var p = pair();
p.inc();
p.inc();
p.get();
"#;
    assert_eq!(run(src), Value::Number(2.0));
}

#[test]
fn test_this_binding() {
    assert_eq!(
        run("var o = { v: 7, get: function() { return this.v; } }; o.get();"),
        Value::Number(7.0)
    );
    // A plain call receives null as its receiver.
    assert_eq!(run("function f() { return this; } f() === null;"), Value::Bool(true));
}

#[test]
fn test_method_call_receiver_is_evaluated_once() {
    let src = r#"
var made = 0;
function factory() { made++; return { m: function() { return 1; } }; }
factory().m();
made;
"#;
    assert_eq!(run(src), Value::Number(1.0));
}

#[test]
fn test_new_constructs_objects() {
    assert_eq!(
        run("function Point(x, y) { this.x = x; this.y = y; } var p = new Point(3, 4); p.x + p.y;"),
        Value::Number(7.0)
    );
    // A constructor returning an object overrides the fresh instance.
    assert_eq!(
        run("function F() { return { v: 9 }; } new F().v;"),
        Value::Number(9.0)
    );
    // A constructor returning a primitive keeps the fresh instance.
    assert_eq!(
        run("function F() { this.v = 1; return 5; } new F().v;"),
        Value::Number(1.0)
    );
}

#[test]
fn test_instanceof_without_prototypes() {
    assert_eq!(
        run("function F() {} var f = new F(); f instanceof F;"),
        Value::Bool(false)
    );
}

#[test]
fn test_function_introspection() {
    assert_eq!(run("function f(a, b, c) {} f.length;"), Value::Number(3.0));
    assert_eq!(run("function f() {} f.name;"), Value::str("f"));
    assert_eq!(run("typeof function() {};"), Value::str("function"));
}

#[test]
fn test_function_as_value() {
    assert_eq!(
        run("function twice(f, x) { return f(f(x)); } twice(function(n) { return n + 3; }, 1);"),
        Value::Number(7.0)
    );
}

// ---------------------------------------------------------------------------
// Scope semantics
// ---------------------------------------------------------------------------

#[test]
fn test_inner_function_reads_and_writes_outer() {
    let src = r#"
function outer() {
    var x = 1;
    function bump() { x += 10; }
    bump();
    return x;
}
outer();
"#;
    assert_eq!(run(src), Value::Number(11.0));
}

#[test]
fn test_assignment_without_declaration_creates_global() {
    let src = r#"
function f() { created = 9; }
f();
created;
"#;
    assert_eq!(run(src), Value::Number(9.0));
}

#[test]
fn test_shadowing() {
    let src = r#"
var x = 'outer';
function f() { var x = 'inner'; return x; }
f() + '/' + x;
"#;
    assert_eq!(run(src), Value::str("inner/outer"));
}

// ---------------------------------------------------------------------------
// Engine embedding surface
// ---------------------------------------------------------------------------

#[test]
fn test_globals_persist_across_runs() {
    let mut engine = Engine::with_builtins();
    engine.run("var k = 1;").unwrap();
    assert_eq!(engine.run("k + 1;").unwrap(), Value::Number(2.0));
    assert_eq!(engine.global("k"), Value::Number(1.0));
}

#[test]
fn test_set_global_and_host_function() {
    let mut engine = Engine::with_builtins();
    engine.set_global("seed", Value::Number(10.0));
    engine.register_fn("double", |_this, args| {
        let n = match args.first() {
            Some(Value::Number(n)) => *n,
            _ => 0.0,
        };
        Ok(Value::Number(n * 2.0))
    });
    assert_eq!(engine.run("double(seed) + 1;").unwrap(), Value::Number(21.0));
}

#[test]
fn test_host_function_receives_receiver() {
    let mut engine = Engine::with_builtins();
    engine.register_fn("self_v", |this, _args| {
        Ok(match this {
            Value::Object(obj) => obj.borrow().get("v").unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        })
    });
    assert_eq!(
        engine.run("var o = { v: 5, m: self_v }; o.m();").unwrap(),
        Value::Number(5.0)
    );
}

#[test]
fn test_print_capture() {
    let mut engine = Engine::with_builtins();
    engine.run("print('a', 1); print('b');").unwrap();
    assert_eq!(engine.take_print_output(), vec!["a 1".to_string(), "b".to_string()]);
    assert!(engine.take_print_output().is_empty());
}

#[test]
fn test_host_calls_guest_function() {
    let mut engine = Engine::with_builtins();
    let adder = engine
        .run("function make(n) { return function(x) { return x + n; } } make(10);")
        .unwrap();
    let result = engine
        .call_function(&adder, &Value::Null, vec![Value::Number(5.0)])
        .unwrap();
    assert_eq!(result, Value::Number(15.0));
}

#[test]
fn test_compile_then_run_bytecode() {
    let bytes = minijs::compile("var x = 6; x * 7;").unwrap();
    let mut engine = Engine::with_builtins();
    assert_eq!(engine.run_bytecode(&bytes).unwrap(), Value::Number(42.0));
    // The same bytes run again against the same engine.
    assert_eq!(engine.run_bytecode(&bytes).unwrap(), Value::Number(42.0));
}

#[test]
fn test_builtin_globals() {
    assert_eq!(run("Math.floor(2.7);"), Value::Number(2.0));
    assert_eq!(run("Math.max(1, 9, 4);"), Value::Number(9.0));
    assert_eq!(run("Math.min(3, -2, 8);"), Value::Number(-2.0));
    assert_eq!(run("Math.pow(2, 10);"), Value::Number(1024.0));
    assert_eq!(run("String(123);"), Value::str("123"));
    assert_eq!(run("Number('8') + 1;"), Value::Number(9.0));
    assert_eq!(run("Boolean('');"), Value::Bool(false));
    assert_eq!(run("isNaN('x');"), Value::Bool(true));
    assert_eq!(run("parseInt('2a');"), Value::Number(2.0));
    assert_eq!(run("parseInt('ff', 16);"), Value::Number(255.0));
    assert_eq!(run("parseFloat('3.5px');"), Value::Number(3.5));
    assert_eq!(run("1 / 0 === Infinity;"), Value::Bool(true));
}

#[test]
fn test_directives_are_plain_statements() {
    assert_eq!(run("'use strict'; 1 + 1;"), Value::Number(2.0));
    assert_eq!(run("'lone directive';"), Value::str("lone directive"));
}

// ---------------------------------------------------------------------------
// Limits and errors
// ---------------------------------------------------------------------------

#[test]
fn test_instruction_limit_stops_infinite_loop() {
    let mut engine = Engine::with_builtins();
    engine.set_limits(Limits {
        max_instructions: Some(10_000),
        max_recursion_depth: Some(1000),
    });
    assert_eq!(
        engine.run("while (true) {}"),
        Err(Error::InstructionLimitExceeded(10_000))
    );
}

#[test]
fn test_recursion_limit() {
    let mut engine = Engine::with_builtins();
    engine.set_limits(Limits {
        max_instructions: None,
        max_recursion_depth: Some(100),
    });
    assert_eq!(
        engine.run("function f() { return f(); } f();"),
        Err(Error::RecursionLimitExceeded(100))
    );
}

#[test]
fn test_parse_error() {
    assert!(matches!(minijs::run("var = ;"), Err(Error::Parse(_))));
}

#[test]
fn test_unsupported_syntax_errors() {
    for src in [
        "try { f(); } catch (e) {}",
        "throw 1;",
        "outer: for (;;) break outer;",
        "for (var k in {}) {}",
        "let x = 1;",
    ] {
        assert!(
            matches!(minijs::run(src), Err(Error::Unsupported(_))),
            "expected {src:?} to be unsupported"
        );
    }
}

#[test]
fn test_calling_a_non_function_fails() {
    assert!(matches!(minijs::run("nope();"), Err(Error::Type { .. })));
    assert!(matches!(minijs::run("var x = 1; x();"), Err(Error::Type { .. })));
}

#[test]
fn test_property_access_on_nullish_fails() {
    assert!(matches!(minijs::run("var x; x.y;"), Err(Error::Runtime(_))));
    assert!(matches!(minijs::run("null.y = 1;"), Err(Error::Runtime(_))));
}
