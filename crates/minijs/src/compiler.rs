//! Bytecode compiler: lowers AST blocks into the symbolic instruction
//! stream and assembles the final byte sequence.
//!
//! This module (together with the [`hoist`](crate::hoist) pre-pass) is the
//! only place that touches the parser's AST. Compilation runs in three
//! steps: parse, discover blocks (hoisting), then lower every block in
//! discovery order into one [`CodeBuilder`] and assemble it. The script
//! root is lowered first, so the packed program always starts executing at
//! offset 0.
//!
//! Every statement lowering leaves the operand stack exactly as deep as it
//! found it; every expression lowering leaves it exactly one value deeper.
//! All control flow reduces to `Jump`/`JumpIf`/`JumpNot` over labels that
//! the assembler later resolves to absolute offsets.

use resast::prelude::*;

use crate::bytecode::{CodeBuilder, Opcode};
use crate::error::{Error, Result};
use crate::hoist::{self, Block, BlockBody, Blocks};
use crate::uid::UniqueId;

/// Compile source text into a packed bytecode program.
pub fn compile(source: &str) -> Result<Vec<u8>> {
    let mut parser = ressa::Parser::new(source).map_err(|e| Error::Parse(e.to_string()))?;
    let program = parser.parse().map_err(|e| Error::Parse(e.to_string()))?;
    let parts = match &program {
        Program::Script(parts) | Program::Mod(parts) => parts.as_slice(),
    };

    let mut uid = UniqueId::new();
    let blocks = hoist::discover(parts, &mut uid)?;

    let mut compiler = Compiler {
        code: CodeBuilder::new(),
        blocks: &blocks,
        control_stack: Vec::new(),
        uid: &mut uid,
    };
    for block in &blocks.list {
        compiler.lower_block(block)?;
    }
    compiler.code.assemble()
}

/// An enclosing loop or switch, for `break`/`continue` target resolution.
struct ControlBlock {
    /// `continue` target; `None` for switches, which `continue` skips over.
    continue_label: Option<String>,
    /// `break` target.
    break_label: String,
}

struct Compiler<'a, 'b> {
    code: CodeBuilder,
    blocks: &'b Blocks<'a>,
    control_stack: Vec<ControlBlock>,
    uid: &'b mut UniqueId,
}

impl<'a> Compiler<'a, '_> {
    /// Mint a fresh control-flow label.
    fn fresh(&mut self, stem: &str) -> String {
        format!(".{}_{}", stem, self.uid.get())
    }

    /// The entry label minted for a function node during block discovery.
    fn label_of(&self, func: &Func<'a>) -> Result<String> {
        Ok(self.blocks.label_of(func)?.to_string())
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    fn lower_block(&mut self, block: &Block<'a>) -> Result<()> {
        self.code.write_label(block.label.clone());
        match &block.body {
            BlockBody::Script(parts) => {
                let parts: &'a [ProgramPart<'a>] = *parts;
                for name in &block.declarations {
                    self.code.write_string(name)?;
                    self.code.write_op(Opcode::Var);
                }
                let has_value = self.lower_script_body(parts)?;
                if !has_value {
                    self.code.write_op(Opcode::Undef);
                }
                self.code.write_op(Opcode::Ret);
            }
            BlockBody::Function(func) => {
                let func: &'a Func<'a> = *func;
                // On entry the operand stack holds exactly the caller's
                // argument array. Declare each parameter and pull its value
                // out of the array, then discard the array.
                for (i, name) in block.params.iter().enumerate() {
                    self.code.write_string(name)?;
                    self.code.write_op(Opcode::Var);
                    self.code.write_op(Opcode::Top);
                    self.code.write_number(i as f64);
                    self.code.write_op(Opcode::Get);
                    self.code.write_string(name)?;
                    self.code.write_op(Opcode::Out);
                    self.code.write_op(Opcode::Pop);
                }
                self.code.write_op(Opcode::Pop);
                for name in &block.declarations {
                    self.code.write_string(name)?;
                    self.code.write_op(Opcode::Var);
                }
                for part in &func.body.0 {
                    self.lower_part(part)?;
                }
                self.code.write_op(Opcode::Undef);
                self.code.write_op(Opcode::Ret);
            }
        }
        Ok(())
    }

    /// Lower the script root's statements. When the script ends in an
    /// expression statement its value is left on the stack as the script's
    /// completion value; returns whether that happened.
    fn lower_script_body(&mut self, parts: &'a [ProgramPart<'a>]) -> Result<bool> {
        let count = parts.len();
        for (i, part) in parts.iter().enumerate() {
            if i + 1 == count {
                match part {
                    ProgramPart::Stmt(Stmt::Expr(expr)) => {
                        self.lower_expr(expr)?;
                        return Ok(true);
                    }
                    ProgramPart::Dir(dir) => {
                        self.lower_lit(&dir.expr)?;
                        return Ok(true);
                    }
                    _ => self.lower_part(part)?,
                }
            } else {
                self.lower_part(part)?;
            }
        }
        Ok(false)
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn lower_part(&mut self, part: &'a ProgramPart<'a>) -> Result<()> {
        match part {
            ProgramPart::Dir(dir) => {
                // A directive is an expression statement made of a string
                // literal; it evaluates and discards like any other.
                self.lower_lit(&dir.expr)?;
                self.code.write_op(Opcode::Pop);
                Ok(())
            }
            ProgramPart::Decl(Decl::Var(_, declarators)) => self.lower_var_decls(declarators),
            ProgramPart::Decl(Decl::Func(func)) => self.lower_function_decl(func),
            ProgramPart::Decl(_) => Err(Error::Unsupported(
                "only var and function declarations are supported".to_string(),
            )),
            ProgramPart::Stmt(stmt) => self.lower_stmt(stmt),
        }
    }

    fn lower_stmt(&mut self, stmt: &'a Stmt<'a>) -> Result<()> {
        match stmt {
            Stmt::Empty | Stmt::Debugger => Ok(()),

            Stmt::Expr(expr) => {
                self.lower_expr(expr)?;
                self.code.write_op(Opcode::Pop);
                Ok(())
            }

            Stmt::Block(block) => {
                for part in &block.0 {
                    self.lower_part(part)?;
                }
                Ok(())
            }

            Stmt::Var(declarators) => self.lower_var_decls(declarators),

            Stmt::If(if_stmt) => self.lower_if(if_stmt),
            Stmt::While(while_stmt) => self.lower_while(while_stmt),
            Stmt::DoWhile(do_while) => self.lower_do_while(do_while),
            Stmt::For(for_stmt) => self.lower_for(for_stmt),
            Stmt::Switch(switch) => self.lower_switch(switch),

            Stmt::Break(None) => {
                let target = self
                    .control_stack
                    .last()
                    .map(|ctl| ctl.break_label.clone())
                    .ok_or_else(|| {
                        Error::Unsupported("'break' outside loop or switch".to_string())
                    })?;
                self.code.write_ref(target);
                self.code.write_op(Opcode::Jump);
                Ok(())
            }

            Stmt::Continue(None) => {
                let target = self
                    .control_stack
                    .iter()
                    .rev()
                    .find_map(|ctl| ctl.continue_label.clone())
                    .ok_or_else(|| Error::Unsupported("'continue' outside loop".to_string()))?;
                self.code.write_ref(target);
                self.code.write_op(Opcode::Jump);
                Ok(())
            }

            Stmt::Return(arg) => {
                match arg {
                    Some(expr) => self.lower_expr(expr)?,
                    None => self.code.write_op(Opcode::Undef),
                }
                self.code.write_op(Opcode::Ret);
                Ok(())
            }

            other => Err(Error::Unsupported(format!(
                "statement kind {:?}",
                std::mem::discriminant(other)
            ))),
        }
    }

    /// A declaration list lowers to one assignment per initialized
    /// declarator; the names themselves were already hoisted.
    fn lower_var_decls(&mut self, declarators: &'a [VarDecl<'a>]) -> Result<()> {
        for declarator in declarators {
            let Pat::Ident(id) = &declarator.id else {
                return Err(Error::Unsupported("destructuring declarations".to_string()));
            };
            if let Some(init) = &declarator.init {
                self.lower_expr(init)?;
                self.code.write_string(&id.name)?;
                self.code.write_op(Opcode::Out);
                self.code.write_op(Opcode::Pop);
            }
        }
        Ok(())
    }

    fn lower_if(&mut self, if_stmt: &'a IfStmt<'a>) -> Result<()> {
        let end = self.fresh("if_end");
        self.lower_expr(&if_stmt.test)?;
        match &if_stmt.alternate {
            Some(alternate) => {
                let alt = self.fresh("if_alt");
                self.code.write_ref(alt.clone());
                self.code.write_op(Opcode::JumpNot);
                self.lower_stmt(&if_stmt.consequent)?;
                self.code.write_ref(end.clone());
                self.code.write_op(Opcode::Jump);
                self.code.write_label(alt);
                self.lower_stmt(alternate)?;
            }
            None => {
                self.code.write_ref(end.clone());
                self.code.write_op(Opcode::JumpNot);
                self.lower_stmt(&if_stmt.consequent)?;
            }
        }
        self.code.write_label(end);
        Ok(())
    }

    fn lower_while(&mut self, while_stmt: &'a WhileStmt<'a>) -> Result<()> {
        let start = self.fresh("loop_start");
        let end = self.fresh("loop_end");

        self.code.write_label(start.clone());
        self.lower_expr(&while_stmt.test)?;
        self.code.write_ref(end.clone());
        self.code.write_op(Opcode::JumpNot);

        self.control_stack.push(ControlBlock {
            continue_label: Some(start.clone()),
            break_label: end.clone(),
        });
        self.lower_stmt(&while_stmt.body)?;
        self.control_stack.pop();

        self.code.write_ref(start);
        self.code.write_op(Opcode::Jump);
        self.code.write_label(end);
        Ok(())
    }

    fn lower_do_while(&mut self, do_while: &'a DoWhileStmt<'a>) -> Result<()> {
        let start = self.fresh("loop_start");
        let test = self.fresh("loop_test");
        let end = self.fresh("loop_end");

        self.code.write_label(start.clone());
        self.control_stack.push(ControlBlock {
            continue_label: Some(test.clone()),
            break_label: end.clone(),
        });
        self.lower_stmt(&do_while.body)?;
        self.control_stack.pop();

        self.code.write_label(test);
        self.lower_expr(&do_while.test)?;
        self.code.write_ref(start);
        self.code.write_op(Opcode::JumpIf);
        self.code.write_label(end);
        Ok(())
    }

    /// Bottom-tested loop with an entry jump to the test, so a false test
    /// skips the body entirely. `continue` targets the update site.
    fn lower_for(&mut self, for_stmt: &'a ForStmt<'a>) -> Result<()> {
        let start = self.fresh("loop_start");
        let update = self.fresh("loop_update");
        let test = self.fresh("loop_test");
        let end = self.fresh("loop_end");

        match &for_stmt.init {
            Some(LoopInit::Variable(_, declarators)) => self.lower_var_decls(declarators)?,
            Some(LoopInit::Expr(expr)) => {
                self.lower_expr(expr)?;
                self.code.write_op(Opcode::Pop);
            }
            None => {}
        }

        self.code.write_ref(test.clone());
        self.code.write_op(Opcode::Jump);

        self.code.write_label(start.clone());
        self.control_stack.push(ControlBlock {
            continue_label: Some(update.clone()),
            break_label: end.clone(),
        });
        self.lower_stmt(&for_stmt.body)?;
        self.control_stack.pop();

        self.code.write_label(update);
        if let Some(update_expr) = &for_stmt.update {
            self.lower_expr(update_expr)?;
            self.code.write_op(Opcode::Pop);
        }

        self.code.write_label(test);
        match &for_stmt.test {
            Some(test_expr) => {
                self.lower_expr(test_expr)?;
                self.code.write_ref(start);
                self.code.write_op(Opcode::JumpIf);
            }
            None => {
                self.code.write_ref(start);
                self.code.write_op(Opcode::Jump);
            }
        }
        self.code.write_label(end);
        Ok(())
    }

    /// Switch: the discriminant stays on the stack through dispatch and all
    /// case bodies; fall-through between cases is intentional. The `end`
    /// label sits on the discriminant `Pop`, so `break`, the no-match jump,
    /// and plain fall-through all discard it exactly once.
    fn lower_switch(&mut self, switch: &'a SwitchStmt<'a>) -> Result<()> {
        let end = self.fresh("switch_end");

        self.lower_expr(&switch.discriminant)?;

        let mut case_labels = Vec::with_capacity(switch.cases.len());
        let mut default_label: Option<String> = None;
        for case in &switch.cases {
            let label = self.fresh("switch_case");
            if case.test.is_none() {
                if default_label.is_some() {
                    return Err(Error::Unsupported(
                        "more than one default clause".to_string(),
                    ));
                }
                default_label = Some(label.clone());
            }
            case_labels.push(label);
        }

        // Dispatch: strict-compare the discriminant against each case test.
        for (case, label) in switch.cases.iter().zip(&case_labels) {
            if let Some(test) = &case.test {
                self.code.write_op(Opcode::Top);
                self.lower_expr(test)?;
                self.code.write_op(Opcode::Seq);
                self.code.write_ref(label.clone());
                self.code.write_op(Opcode::JumpIf);
            }
        }
        self.code.write_ref(default_label.unwrap_or_else(|| end.clone()));
        self.code.write_op(Opcode::Jump);

        self.control_stack.push(ControlBlock {
            continue_label: None,
            break_label: end.clone(),
        });
        for (case, label) in switch.cases.iter().zip(&case_labels) {
            self.code.write_label(label.clone());
            for part in &case.consequent {
                self.lower_part(part)?;
            }
        }
        self.control_stack.pop();

        self.code.write_label(end);
        self.code.write_op(Opcode::Pop);
        Ok(())
    }

    /// `function f(…) {…}` creates the closure and binds it in place.
    fn lower_function_decl(&mut self, func: &'a Func<'a>) -> Result<()> {
        let name = func
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .ok_or_else(|| Error::Unsupported("function declarations must be named".to_string()))?;
        let label = self.label_of(func)?;

        self.code.write_op(Opcode::Null);
        self.code.write_number(func.params.len() as f64);
        self.code.write_ref(label);
        self.code.write_op(Opcode::Func);
        self.code.write_string(&name)?;
        self.code.write_op(Opcode::Out);
        self.code.write_op(Opcode::Pop);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn lower_expr(&mut self, expr: &'a Expr<'a>) -> Result<()> {
        match expr {
            Expr::Ident(id) => {
                if id.name == "undefined" {
                    self.code.write_op(Opcode::Undef);
                } else {
                    self.code.write_string(&id.name)?;
                    self.code.write_op(Opcode::Load);
                }
                Ok(())
            }

            Expr::This => {
                self.code.write_string("this")?;
                self.code.write_op(Opcode::Load);
                Ok(())
            }

            Expr::Lit(lit) => self.lower_lit(lit),

            Expr::Array(elements) => {
                self.code.write_op(Opcode::Arr);
                for (i, element) in elements.iter().enumerate() {
                    self.code.write_op(Opcode::Top);
                    self.code.write_number(i as f64);
                    match element {
                        Some(expr) => self.lower_expr(expr)?,
                        // An elision still occupies its index.
                        None => self.code.write_op(Opcode::Null),
                    }
                    self.code.write_op(Opcode::Set);
                    self.code.write_op(Opcode::Pop);
                }
                Ok(())
            }

            Expr::Obj(props) => {
                self.code.write_op(Opcode::Obj);
                for prop in props {
                    let ObjProp::Prop(prop) = prop else {
                        return Err(Error::Unsupported("spread properties".to_string()));
                    };
                    self.code.write_op(Opcode::Top);
                    self.lower_prop(prop)?;
                    self.code.write_op(Opcode::Set);
                    self.code.write_op(Opcode::Pop);
                }
                Ok(())
            }

            Expr::Func(func) => {
                let label = self.label_of(func)?;
                match &func.id {
                    Some(id) => self.code.write_string(&id.name)?,
                    None => self.code.write_op(Opcode::Null),
                }
                self.code.write_number(func.params.len() as f64);
                self.code.write_ref(label);
                self.code.write_op(Opcode::Func);
                Ok(())
            }

            Expr::Unary(unary) => self.lower_unary(unary),
            Expr::Update(update) => self.lower_update(update),
            Expr::Binary(binary) => self.lower_binary(binary),
            Expr::Logical(logical) => self.lower_logical(logical),
            Expr::Assign(assign) => self.lower_assign(assign),

            Expr::Conditional(cond) => {
                let alt = self.fresh("ternary_alt");
                let end = self.fresh("ternary_end");
                self.lower_expr(&cond.test)?;
                self.code.write_ref(alt.clone());
                self.code.write_op(Opcode::JumpNot);
                self.lower_expr(&cond.consequent)?;
                self.code.write_ref(end.clone());
                self.code.write_op(Opcode::Jump);
                self.code.write_label(alt);
                self.lower_expr(&cond.alternate)?;
                self.code.write_label(end);
                Ok(())
            }

            Expr::Member(member) => {
                self.lower_expr(&member.object)?;
                self.lower_member_key(member)?;
                self.code.write_op(Opcode::Get);
                Ok(())
            }

            Expr::Call(call) => {
                // A method call keeps the receiver below the function; a
                // plain call passes null for `this`.
                if let Expr::Member(member) = call.callee.as_ref() {
                    self.lower_expr(&member.object)?;
                    self.code.write_op(Opcode::Top);
                    self.lower_member_key(member)?;
                    self.code.write_op(Opcode::Get);
                } else {
                    self.code.write_op(Opcode::Null);
                    self.lower_expr(&call.callee)?;
                }
                self.lower_arguments(&call.arguments)?;
                self.code.write_op(Opcode::Call);
                Ok(())
            }

            Expr::New(new) => {
                self.lower_expr(&new.callee)?;
                self.lower_arguments(&new.arguments)?;
                self.code.write_op(Opcode::New);
                Ok(())
            }

            Expr::Sequence(exprs) => {
                let count = exprs.len();
                for (i, expr) in exprs.iter().enumerate() {
                    self.lower_expr(expr)?;
                    if i + 1 != count {
                        self.code.write_op(Opcode::Pop);
                    }
                }
                Ok(())
            }

            other => Err(Error::Unsupported(format!(
                "expression kind {:?}",
                std::mem::discriminant(other)
            ))),
        }
    }

    fn lower_lit(&mut self, lit: &'a Lit<'a>) -> Result<()> {
        match lit {
            Lit::Null => self.code.write_op(Opcode::Null),
            Lit::Boolean(true) => self.code.write_op(Opcode::True),
            Lit::Boolean(false) => self.code.write_op(Opcode::False),
            Lit::Number(raw) => {
                let n = parse_number_literal(raw)?;
                self.code.write_number(n);
            }
            Lit::String(s) => {
                let raw = match s {
                    StringLit::Double(inner) | StringLit::Single(inner) => inner,
                };
                self.code.write_string(&unescape_string_literal(raw))?;
            }
            _ => {
                return Err(Error::Unsupported(
                    "regex and template literals".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Push a property key and value for an object literal entry.
    fn lower_prop(&mut self, prop: &'a Prop<'a>) -> Result<()> {
        if !matches!(prop.kind, PropKind::Init) {
            return Err(Error::Unsupported("getter/setter properties".to_string()));
        }

        let key_name = match &prop.key {
            PropKey::Expr(Expr::Ident(id)) => Some(id.name.to_string()),
            PropKey::Pat(Pat::Ident(id)) => Some(id.name.to_string()),
            _ => None,
        };

        if prop.computed {
            match &prop.key {
                PropKey::Expr(expr) => self.lower_expr(expr)?,
                PropKey::Lit(lit) => self.lower_lit(lit)?,
                PropKey::Pat(_) => {
                    return Err(Error::Unsupported("computed pattern key".to_string()));
                }
            }
        } else {
            match (&prop.key, &key_name) {
                (_, Some(name)) => self.code.write_string(name)?,
                (PropKey::Lit(lit), None) => self.lower_lit(lit)?,
                _ => {
                    return Err(Error::Unsupported("object property key".to_string()));
                }
            }
        }

        match &prop.value {
            PropValue::Expr(value) => self.lower_expr(value)?,
            // Shorthand `{ a }` reads the variable of the same name.
            PropValue::None => {
                let name = key_name.ok_or_else(|| {
                    Error::Unsupported("shorthand property without a name".to_string())
                })?;
                self.code.write_string(&name)?;
                self.code.write_op(Opcode::Load);
            }
            PropValue::Pat(_) => {
                return Err(Error::Unsupported("pattern property value".to_string()));
            }
        }
        Ok(())
    }

    /// Push the key of a member expression: the evaluated expression when
    /// computed (`a[k]`), the property name string otherwise (`a.k`).
    fn lower_member_key(&mut self, member: &'a MemberExpr<'a>) -> Result<()> {
        if member.computed {
            self.lower_expr(&member.property)
        } else {
            match member.property.as_ref() {
                Expr::Ident(id) => self.code.write_string(&id.name),
                _ => Err(Error::Unsupported(
                    "non-identifier property access".to_string(),
                )),
            }
        }
    }

    fn lower_unary(&mut self, unary: &'a UnaryExpr<'a>) -> Result<()> {
        match unary.operator {
            UnaryOp::Plus => {
                // `+x` and `-x` reuse the binary operators against zero.
                self.code.write_number(0.0);
                self.lower_expr(&unary.argument)?;
                self.code.write_op(Opcode::Add);
            }
            UnaryOp::Minus => {
                self.code.write_number(0.0);
                self.lower_expr(&unary.argument)?;
                self.code.write_op(Opcode::Sub);
            }
            UnaryOp::Not => {
                self.lower_expr(&unary.argument)?;
                self.code.write_op(Opcode::Not);
            }
            UnaryOp::Tilde => {
                self.lower_expr(&unary.argument)?;
                self.code.write_op(Opcode::BNot);
            }
            UnaryOp::TypeOf => {
                self.lower_expr(&unary.argument)?;
                self.code.write_op(Opcode::TypeOf);
            }
            UnaryOp::Void => {
                self.lower_expr(&unary.argument)?;
                self.code.write_op(Opcode::Pop);
                self.code.write_op(Opcode::Undef);
            }
            UnaryOp::Delete => {
                if let Expr::Member(member) = unary.argument.as_ref() {
                    self.lower_expr(&member.object)?;
                    self.lower_member_key(member)?;
                    self.code.write_op(Opcode::Delete);
                } else {
                    // Deleting anything but a property always "succeeds".
                    self.code.write_op(Opcode::True);
                }
            }
        }
        Ok(())
    }

    /// `++`/`--` on an identifier or member. The stored value is always the
    /// updated number; a postfix expression then compensates on the stack so
    /// its own value is the pre-update number.
    fn lower_update(&mut self, update: &'a UpdateExpr<'a>) -> Result<()> {
        let step = match update.operator {
            UpdateOp::Increment => Opcode::Add,
            UpdateOp::Decrement => Opcode::Sub,
        };
        let undo = match update.operator {
            UpdateOp::Increment => Opcode::Sub,
            UpdateOp::Decrement => Opcode::Add,
        };

        match update.argument.as_ref() {
            Expr::Ident(id) => {
                self.code.write_string(&id.name)?;
                self.code.write_op(Opcode::Load);
                self.code.write_number(1.0);
                self.code.write_op(step);
                self.code.write_string(&id.name)?;
                self.code.write_op(Opcode::Out);
            }
            Expr::Member(member) => {
                self.lower_expr(&member.object)?;
                self.lower_member_key(member)?;
                self.code.write_op(Opcode::Top2);
                self.code.write_op(Opcode::Get);
                self.code.write_number(1.0);
                self.code.write_op(step);
                self.code.write_op(Opcode::Set);
            }
            _ => {
                return Err(Error::Unsupported(
                    "update target must be a variable or property".to_string(),
                ));
            }
        }

        if !update.prefix {
            self.code.write_number(1.0);
            self.code.write_op(undo);
        }
        Ok(())
    }

    fn lower_binary(&mut self, binary: &'a BinaryExpr<'a>) -> Result<()> {
        if matches!(binary.operator, BinaryOp::In) {
            // `key in obj` wants the object below the key, the same layout
            // the property opcodes use.
            self.lower_expr(&binary.right)?;
            self.lower_expr(&binary.left)?;
            self.code.write_op(Opcode::In);
            return Ok(());
        }
        self.lower_expr(&binary.left)?;
        self.lower_expr(&binary.right)?;
        self.code.write_op(binary_opcode(&binary.operator));
        Ok(())
    }

    /// Short-circuit `&&`/`||`: duplicate the left value, conditionally jump
    /// past the right operand keeping the duplicate as the result, otherwise
    /// drop it and evaluate the right operand. The result is whichever
    /// operand was selected, never coerced to a boolean.
    fn lower_logical(&mut self, logical: &'a LogicalExpr<'a>) -> Result<()> {
        let end = self.fresh("logic_end");
        let jump = match logical.operator {
            LogicalOp::And => Opcode::JumpNot,
            LogicalOp::Or => Opcode::JumpIf,
        };
        self.lower_expr(&logical.left)?;
        self.code.write_op(Opcode::Top);
        self.code.write_ref(end.clone());
        self.code.write_op(jump);
        self.code.write_op(Opcode::Pop);
        self.lower_expr(&logical.right)?;
        self.code.write_label(end);
        Ok(())
    }

    fn lower_assign(&mut self, assign: &'a AssignExpr<'a>) -> Result<()> {
        let op = assign_opcode(&assign.operator);

        // Identifier target?
        let ident = match &assign.left {
            AssignLeft::Pat(Pat::Ident(id)) => Some(id.name.to_string()),
            AssignLeft::Expr(expr) => match expr.as_ref() {
                Expr::Ident(id) => Some(id.name.to_string()),
                _ => None,
            },
            AssignLeft::Pat(_) => {
                return Err(Error::Unsupported("destructuring assignment".to_string()));
            }
        };

        if let Some(name) = ident {
            match op {
                None => self.lower_expr(&assign.right)?,
                Some(op) => {
                    // Left before right, so non-commutative compounds store
                    // `left op right`.
                    self.code.write_string(&name)?;
                    self.code.write_op(Opcode::Load);
                    self.lower_expr(&assign.right)?;
                    self.code.write_op(op);
                }
            }
            self.code.write_string(&name)?;
            self.code.write_op(Opcode::Out);
            return Ok(());
        }

        let AssignLeft::Expr(target) = &assign.left else {
            return Err(Error::Unsupported("assignment target".to_string()));
        };
        let Expr::Member(member) = target.as_ref() else {
            return Err(Error::Unsupported(
                "assignment target must be a variable or property".to_string(),
            ));
        };

        self.lower_expr(&member.object)?;
        self.lower_member_key(member)?;
        match op {
            None => self.lower_expr(&assign.right)?,
            Some(op) => {
                self.code.write_op(Opcode::Top2);
                self.code.write_op(Opcode::Get);
                self.lower_expr(&assign.right)?;
                self.code.write_op(op);
            }
        }
        self.code.write_op(Opcode::Set);
        Ok(())
    }

    /// Lower a call's argument list as an array literal.
    fn lower_arguments(&mut self, arguments: &'a [Expr<'a>]) -> Result<()> {
        self.code.write_op(Opcode::Arr);
        for (i, arg) in arguments.iter().enumerate() {
            self.code.write_op(Opcode::Top);
            self.code.write_number(i as f64);
            self.lower_expr(arg)?;
            self.code.write_op(Opcode::Set);
            self.code.write_op(Opcode::Pop);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Operator and literal translation
// ---------------------------------------------------------------------------

fn binary_opcode(op: &BinaryOp) -> Opcode {
    match op {
        BinaryOp::Equal => Opcode::Eq,
        BinaryOp::NotEqual => Opcode::Neq,
        BinaryOp::StrictEqual => Opcode::Seq,
        BinaryOp::StrictNotEqual => Opcode::Sneq,
        BinaryOp::LessThan => Opcode::Lt,
        BinaryOp::LessThanEqual => Opcode::Lte,
        BinaryOp::GreaterThan => Opcode::Gt,
        BinaryOp::GreaterThanEqual => Opcode::Gte,
        BinaryOp::Plus => Opcode::Add,
        BinaryOp::Minus => Opcode::Sub,
        BinaryOp::Times => Opcode::Mul,
        BinaryOp::Over => Opcode::Div,
        BinaryOp::Mod => Opcode::Mod,
        BinaryOp::PowerOf => Opcode::Exp,
        BinaryOp::Or => Opcode::BOr,
        BinaryOp::XOr => Opcode::BXor,
        BinaryOp::And => Opcode::BAnd,
        BinaryOp::LeftShift => Opcode::LShift,
        BinaryOp::RightShift => Opcode::RShift,
        BinaryOp::UnsignedRightShift => Opcode::UrShift,
        BinaryOp::In => Opcode::In,
        BinaryOp::InstanceOf => Opcode::InstanceOf,
    }
}

/// `None` for plain `=`, otherwise the compound operator's opcode.
fn assign_opcode(op: &AssignOp) -> Option<Opcode> {
    match op {
        AssignOp::Equal => None,
        AssignOp::PlusEqual => Some(Opcode::Add),
        AssignOp::MinusEqual => Some(Opcode::Sub),
        AssignOp::TimesEqual => Some(Opcode::Mul),
        AssignOp::DivEqual => Some(Opcode::Div),
        AssignOp::ModEqual => Some(Opcode::Mod),
        AssignOp::PowerOfEqual => Some(Opcode::Exp),
        AssignOp::LeftShiftEqual => Some(Opcode::LShift),
        AssignOp::RightShiftEqual => Some(Opcode::RShift),
        AssignOp::UnsignedRightShiftEqual => Some(Opcode::UrShift),
        AssignOp::OrEqual => Some(Opcode::BOr),
        AssignOp::XOrEqual => Some(Opcode::BXor),
        AssignOp::AndEqual => Some(Opcode::BAnd),
    }
}

/// Parse a numeric literal from its source text (decimal, hex, octal, or
/// binary form).
fn parse_number_literal(raw: &str) -> Result<f64> {
    let parsed = if let Some(digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(digits, 16).ok().map(|n| n as f64)
    } else if let Some(digits) = raw.strip_prefix("0o").or_else(|| raw.strip_prefix("0O")) {
        u64::from_str_radix(digits, 8).ok().map(|n| n as f64)
    } else if let Some(digits) = raw.strip_prefix("0b").or_else(|| raw.strip_prefix("0B")) {
        u64::from_str_radix(digits, 2).ok().map(|n| n as f64)
    } else {
        raw.parse::<f64>().ok()
    };
    parsed.ok_or_else(|| Error::Parse(format!("invalid numeric literal '{}'", raw)))
}

/// Process the escape sequences of a string literal's raw source text.
fn unescape_string_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000c}'),
            Some('v') => out.push('\u{000b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let code: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&code, 16).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => out.push(char::REPLACEMENT_CHARACTER),
                }
            }
            Some('u') => {
                let code: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&code, 16).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => out.push(char::REPLACEMENT_CHARACTER),
                }
            }
            // Line continuation: an escaped newline vanishes.
            Some('\n') => {}
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
