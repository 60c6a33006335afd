//! Block discovery and declaration hoisting.
//!
//! The compiler's first pass walks the parsed AST in pre-order and splits the
//! program into *blocks*: one for the script root and one per function
//! (declaration or literal). Each block gets a fresh entry label and the set
//! of names declared anywhere inside it — `var` declarators and function
//! declarations hoist to the enclosing function or script scope, so the
//! lowerer can bind them all in the block prologue before any code runs.
//!
//! Node kinds outside the language subset are rejected here, before any
//! instruction is emitted.

use std::collections::HashMap;

use resast::prelude::*;

use crate::error::{Error, Result};
use crate::uid::UniqueId;

/// What a block lowers: the script's top-level parts or a function node.
pub enum BlockBody<'a> {
    Script(&'a [ProgramPart<'a>]),
    Function(&'a Func<'a>),
}

/// A unit of compilation: entry label, parameter list, hoisted names, body.
pub struct Block<'a> {
    /// Symbolic entry point, e.g. `.main_1` or `.fact_2`.
    pub label: String,
    /// Ordered parameter names (empty for the script root).
    pub params: Vec<String>,
    /// Hoisted declarations in first-seen order, deduplicated.
    pub declarations: Vec<String>,
    pub body: BlockBody<'a>,
}

impl Block<'_> {
    fn hoist(&mut self, name: &str) {
        if !self.declarations.iter().any(|d| d == name) {
            self.declarations.push(name.to_string());
        }
    }
}

/// The discovered blocks, in pre-order, with a lookup from function node to
/// the label minted for it (the lowerer needs it when it reaches a function
/// mid-expression).
pub struct Blocks<'a> {
    pub list: Vec<Block<'a>>,
    by_node: HashMap<usize, usize>,
}

impl<'a> Blocks<'a> {
    /// The entry label of the block created for `func`.
    pub fn label_of(&self, func: &Func<'a>) -> Result<&str> {
        self.by_node
            .get(&node_key(func))
            .map(|&i| self.list[i].label.as_str())
            .ok_or_else(|| Error::Runtime("function was not visited by the pre-pass".to_string()))
    }
}

fn node_key(func: &Func<'_>) -> usize {
    func as *const _ as usize
}

/// Walk the program and return its blocks in discovery order. The script
/// root is always first.
pub fn discover<'a>(parts: &'a [ProgramPart<'a>], uid: &mut UniqueId) -> Result<Blocks<'a>> {
    let mut blocks = Blocks {
        list: vec![Block {
            label: format!(".main_{}", uid.get()),
            params: Vec::new(),
            declarations: Vec::new(),
            body: BlockBody::Script(parts),
        }],
        by_node: HashMap::new(),
    };
    walk_parts(parts, 0, &mut blocks, uid)?;
    Ok(blocks)
}

/// Create a block for a function node and walk its body.
fn enter_function<'a>(
    func: &'a Func<'a>,
    blocks: &mut Blocks<'a>,
    uid: &mut UniqueId,
) -> Result<()> {
    if func.generator || func.is_async {
        return Err(Error::Unsupported(
            "generator and async functions".to_string(),
        ));
    }

    let name = func
        .id
        .as_ref()
        .map(|id| id.name.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let mut params = Vec::with_capacity(func.params.len());
    for param in &func.params {
        params.push(param_name(param)?);
    }

    let idx = blocks.list.len();
    blocks.list.push(Block {
        label: format!(".{}_{}", name, uid.get()),
        params,
        declarations: Vec::new(),
        body: BlockBody::Function(func),
    });
    blocks.by_node.insert(node_key(func), idx);

    walk_parts(&func.body.0, idx, blocks, uid)
}

fn param_name(arg: &FuncArg<'_>) -> Result<String> {
    match arg {
        FuncArg::Pat(Pat::Ident(id)) => Ok(id.name.to_string()),
        FuncArg::Expr(Expr::Ident(id)) => Ok(id.name.to_string()),
        _ => Err(Error::Unsupported(
            "only plain identifier parameters are supported".to_string(),
        )),
    }
}

fn declarator_name(decl: &VarDecl<'_>) -> Result<String> {
    match &decl.id {
        Pat::Ident(id) => Ok(id.name.to_string()),
        _ => Err(Error::Unsupported(
            "destructuring declarations".to_string(),
        )),
    }
}

fn walk_parts<'a>(
    parts: &'a [ProgramPart<'a>],
    current: usize,
    blocks: &mut Blocks<'a>,
    uid: &mut UniqueId,
) -> Result<()> {
    for part in parts {
        walk_part(part, current, blocks, uid)?;
    }
    Ok(())
}

fn walk_part<'a>(
    part: &'a ProgramPart<'a>,
    current: usize,
    blocks: &mut Blocks<'a>,
    uid: &mut UniqueId,
) -> Result<()> {
    match part {
        // Directive prologues ("use strict" and friends) carry no bindings.
        ProgramPart::Dir(_) => Ok(()),
        ProgramPart::Decl(decl) => walk_decl(decl, current, blocks, uid),
        ProgramPart::Stmt(stmt) => walk_stmt(stmt, current, blocks, uid),
    }
}

fn walk_decl<'a>(
    decl: &'a Decl<'a>,
    current: usize,
    blocks: &mut Blocks<'a>,
    uid: &mut UniqueId,
) -> Result<()> {
    match decl {
        Decl::Var(kind, declarators) => {
            walk_var_decls(*kind, declarators, current, blocks, uid)
        }
        Decl::Func(func) => {
            // A function declaration hoists its name into the enclosing
            // block; its body becomes a block of its own.
            let name = func
                .id
                .as_ref()
                .map(|id| id.name.to_string())
                .ok_or_else(|| {
                    Error::Unsupported("function declarations must be named".to_string())
                })?;
            blocks.list[current].hoist(&name);
            enter_function(func, blocks, uid)
        }
        _ => Err(Error::Unsupported(
            "only var and function declarations are supported".to_string(),
        )),
    }
}

fn walk_var_decls<'a>(
    kind: VarKind,
    declarators: &'a [VarDecl<'a>],
    current: usize,
    blocks: &mut Blocks<'a>,
    uid: &mut UniqueId,
) -> Result<()> {
    if !matches!(kind, VarKind::Var) {
        return Err(Error::Unsupported(
            "let/const block scoping (declarations hoist to function scope; use var)".to_string(),
        ));
    }
    for declarator in declarators {
        let name = declarator_name(declarator)?;
        blocks.list[current].hoist(&name);
        if let Some(init) = &declarator.init {
            walk_expr(init, current, blocks, uid)?;
        }
    }
    Ok(())
}

fn walk_stmt<'a>(
    stmt: &'a Stmt<'a>,
    current: usize,
    blocks: &mut Blocks<'a>,
    uid: &mut UniqueId,
) -> Result<()> {
    match stmt {
        Stmt::Expr(expr) => walk_expr(expr, current, blocks, uid),
        Stmt::Block(block) => walk_parts(&block.0, current, blocks, uid),
        Stmt::Empty | Stmt::Debugger => Ok(()),
        Stmt::Return(arg) => match arg {
            Some(expr) => walk_expr(expr, current, blocks, uid),
            None => Ok(()),
        },
        Stmt::Break(label) | Stmt::Continue(label) => {
            if label.is_some() {
                return Err(Error::Unsupported("labeled statements".to_string()));
            }
            Ok(())
        }
        Stmt::If(if_stmt) => {
            walk_expr(&if_stmt.test, current, blocks, uid)?;
            walk_stmt(&if_stmt.consequent, current, blocks, uid)?;
            if let Some(alt) = &if_stmt.alternate {
                walk_stmt(alt, current, blocks, uid)?;
            }
            Ok(())
        }
        Stmt::Switch(switch) => {
            walk_expr(&switch.discriminant, current, blocks, uid)?;
            for case in &switch.cases {
                if let Some(test) = &case.test {
                    walk_expr(test, current, blocks, uid)?;
                }
                walk_parts(&case.consequent, current, blocks, uid)?;
            }
            Ok(())
        }
        Stmt::While(while_stmt) => {
            walk_expr(&while_stmt.test, current, blocks, uid)?;
            walk_stmt(&while_stmt.body, current, blocks, uid)
        }
        Stmt::DoWhile(do_while) => {
            walk_stmt(&do_while.body, current, blocks, uid)?;
            walk_expr(&do_while.test, current, blocks, uid)
        }
        Stmt::For(for_stmt) => {
            match &for_stmt.init {
                Some(LoopInit::Variable(kind, declarators)) => {
                    walk_var_decls(*kind, declarators, current, blocks, uid)?;
                }
                Some(LoopInit::Expr(expr)) => walk_expr(expr, current, blocks, uid)?,
                None => {}
            }
            if let Some(test) = &for_stmt.test {
                walk_expr(test, current, blocks, uid)?;
            }
            if let Some(update) = &for_stmt.update {
                walk_expr(update, current, blocks, uid)?;
            }
            walk_stmt(&for_stmt.body, current, blocks, uid)
        }
        Stmt::Var(declarators) => {
            walk_var_decls(VarKind::Var, declarators, current, blocks, uid)
        }
        Stmt::Labeled(_) => Err(Error::Unsupported("labeled statements".to_string())),
        Stmt::Throw(_) => Err(Error::Unsupported("throw statements".to_string())),
        Stmt::Try(_) => Err(Error::Unsupported("try statements".to_string())),
        Stmt::ForIn(_) => Err(Error::Unsupported("for-in loops".to_string())),
        _ => Err(Error::Unsupported(format!(
            "statement kind {:?}",
            std::mem::discriminant(stmt)
        ))),
    }
}

fn walk_expr<'a>(
    expr: &'a Expr<'a>,
    current: usize,
    blocks: &mut Blocks<'a>,
    uid: &mut UniqueId,
) -> Result<()> {
    match expr {
        Expr::Ident(_) | Expr::This => Ok(()),
        Expr::Lit(lit) => match lit {
            Lit::Null | Lit::String(_) | Lit::Number(_) | Lit::Boolean(_) => Ok(()),
            _ => Err(Error::Unsupported(
                "regex and template literals".to_string(),
            )),
        },
        Expr::Func(func) => enter_function(func, blocks, uid),
        Expr::Array(elements) => {
            for element in elements.iter().flatten() {
                walk_expr(element, current, blocks, uid)?;
            }
            Ok(())
        }
        Expr::Obj(props) => {
            for prop in props {
                let ObjProp::Prop(prop) = prop else {
                    return Err(Error::Unsupported("spread properties".to_string()));
                };
                if !matches!(prop.kind, PropKind::Init) {
                    return Err(Error::Unsupported(
                        "getter/setter properties".to_string(),
                    ));
                }
                if prop.computed && let PropKey::Expr(key) = &prop.key {
                    walk_expr(key, current, blocks, uid)?;
                }
                if let PropValue::Expr(value) = &prop.value {
                    walk_expr(value, current, blocks, uid)?;
                }
            }
            Ok(())
        }
        Expr::Unary(unary) => walk_expr(&unary.argument, current, blocks, uid),
        Expr::Update(update) => walk_expr(&update.argument, current, blocks, uid),
        Expr::Binary(binary) => {
            walk_expr(&binary.left, current, blocks, uid)?;
            walk_expr(&binary.right, current, blocks, uid)
        }
        Expr::Logical(logical) => {
            walk_expr(&logical.left, current, blocks, uid)?;
            walk_expr(&logical.right, current, blocks, uid)
        }
        Expr::Assign(assign) => {
            match &assign.left {
                AssignLeft::Expr(target) => walk_expr(target, current, blocks, uid)?,
                AssignLeft::Pat(Pat::Ident(_)) => {}
                AssignLeft::Pat(_) => {
                    return Err(Error::Unsupported(
                        "destructuring assignment".to_string(),
                    ));
                }
            }
            walk_expr(&assign.right, current, blocks, uid)
        }
        Expr::Conditional(cond) => {
            walk_expr(&cond.test, current, blocks, uid)?;
            walk_expr(&cond.consequent, current, blocks, uid)?;
            walk_expr(&cond.alternate, current, blocks, uid)
        }
        Expr::Call(call) => {
            walk_expr(&call.callee, current, blocks, uid)?;
            for arg in &call.arguments {
                walk_expr(arg, current, blocks, uid)?;
            }
            Ok(())
        }
        Expr::New(new) => {
            walk_expr(&new.callee, current, blocks, uid)?;
            for arg in &new.arguments {
                walk_expr(arg, current, blocks, uid)?;
            }
            Ok(())
        }
        Expr::Member(member) => {
            walk_expr(&member.object, current, blocks, uid)?;
            if member.computed {
                walk_expr(&member.property, current, blocks, uid)?;
            }
            Ok(())
        }
        Expr::Sequence(exprs) => {
            for expr in exprs {
                walk_expr(expr, current, blocks, uid)?;
            }
            Ok(())
        }
        _ => Err(Error::Unsupported(format!(
            "expression kind {:?}",
            std::mem::discriminant(expr)
        ))),
    }
}
