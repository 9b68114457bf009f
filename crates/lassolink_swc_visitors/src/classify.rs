use ast::{CallExpr, Callee, Expr, Lit, Stmt, Str};
use swc_core::ecma::{ast, atoms::JsWord, visit as swc_ecma_visit};
use swc_ecma_visit::{noop_visit_type, Visit, VisitWith};

/// Prefix shared by every namespace variable the registration runtime can
/// be bound to, `$_mod` itself included. Noconflict builds append a
/// suffix, e.g. `$_mod_gh_fe`.
pub const NS_PREFIX: &str = "$_mod";

/// The registration calls the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
  Def,
  Remap,
  Main,
  Installed,
  Builtin,
  Run,
  SearchPath,
  LoaderMetadata,
}

impl CallKind {
  fn from_prop(prop: &str) -> Option<Self> {
    Some(match prop {
      "def" => CallKind::Def,
      "remap" => CallKind::Remap,
      "main" => CallKind::Main,
      "installed" => CallKind::Installed,
      "builtin" => CallKind::Builtin,
      "run" => CallKind::Run,
      "searchPath" => CallKind::SearchPath,
      "loaderMetadata" => CallKind::LoaderMetadata,
      _ => return None,
    })
  }
}

/// Classifies `$_mod.xxx(...)` shaped calls. Only the prefix of the
/// namespace variable is checked.
pub fn classify_call(call: &CallExpr) -> Option<CallKind> {
  let callee = match &call.callee {
    Callee::Expr(callee) => callee,
    _ => return None,
  };
  let member = match &**callee {
    Expr::Member(member) => member,
    _ => return None,
  };
  let obj = member.obj.as_ident()?;
  if !obj.sym.starts_with(NS_PREFIX) {
    return None;
  }
  let prop = match &member.prop {
    ast::MemberProp::Ident(prop) => prop,
    _ => return None,
  };
  CallKind::from_prop(&prop.sym)
}

/// Returns the registration call when the statement is exactly one.
pub fn module_sys_call(stmt: &Stmt) -> Option<(CallKind, &CallExpr)> {
  let expr_stmt = match stmt {
    Stmt::Expr(expr_stmt) => expr_stmt,
    _ => return None,
  };
  let call = match &*expr_stmt.expr {
    Expr::Call(call) => call,
    _ => return None,
  };
  let kind = classify_call(call)?;
  Some((kind, call))
}

pub(crate) fn str_arg<'a>(call: &'a CallExpr, index: usize) -> Option<&'a Str> {
  let arg = call.args.get(index)?;
  if arg.spread.is_some() {
    return None;
  }
  match &*arg.expr {
    Expr::Lit(Lit::Str(s)) => Some(s),
    _ => None,
  }
}

/// Literal boolean, including the minified `!0` and `!1` forms.
pub(crate) fn bool_value(expr: &Expr) -> Option<bool> {
  match expr {
    Expr::Lit(Lit::Bool(b)) => Some(b.value),
    Expr::Unary(unary) if unary.op == ast::UnaryOp::Bang => match &*unary.arg {
      Expr::Lit(Lit::Num(n)) => Some(n.value == 0.0),
      Expr::Lit(Lit::Bool(b)) => Some(!b.value),
      _ => None,
    },
    _ => None,
  }
}

/// Detects the client bootstrap statement: an IIFE whose body publishes a
/// `$_mod`-prefixed namespace variable from both branches of its export
/// conditional. Returns the namespace name.
pub fn detect_client_bootstrap(stmt: &Stmt) -> Option<JsWord> {
  let expr_stmt = match stmt {
    Stmt::Expr(expr_stmt) => expr_stmt,
    _ => return None,
  };
  if !is_iife(&expr_stmt.expr) {
    return None;
  }
  let mut finder = BootstrapFinder::default();
  expr_stmt.expr.visit_with(&mut finder);
  finder.ns
}

fn is_iife(expr: &Expr) -> bool {
  match expr {
    Expr::Unary(unary) => is_iife(&unary.arg),
    Expr::Paren(paren) => is_iife(&paren.expr),
    Expr::Call(call) => match &call.callee {
      Callee::Expr(callee) => matches!(unwrap_parens(callee), Expr::Fn(_) | Expr::Arrow(_)),
      _ => false,
    },
    _ => false,
  }
}

fn unwrap_parens(expr: &Expr) -> &Expr {
  match expr {
    Expr::Paren(paren) => unwrap_parens(&paren.expr),
    _ => expr,
  }
}

#[derive(Default)]
struct BootstrapFinder {
  ns: Option<JsWord>,
}

impl Visit for BootstrapFinder {
  noop_visit_type!();

  fn visit_if_stmt(&mut self, n: &ast::IfStmt) {
    if self.ns.is_none() {
      let cons = branch_assigned_ns(&n.cons);
      let alt = n.alt.as_deref().and_then(branch_assigned_ns);
      if let (Some(ns), Some(_)) = (cons, alt) {
        self.ns = Some(ns);
      }
    }
    n.visit_children_with(self);
  }

  fn visit_cond_expr(&mut self, n: &ast::CondExpr) {
    if self.ns.is_none() {
      if let (Some(ns), Some(_)) = (expr_assigned_ns(&n.cons), expr_assigned_ns(&n.alt)) {
        self.ns = Some(ns);
      }
    }
    n.visit_children_with(self);
  }
}

fn branch_assigned_ns(stmt: &Stmt) -> Option<JsWord> {
  let stmt = match stmt {
    Stmt::Block(block) => block.stmts.first()?,
    other => other,
  };
  match stmt {
    Stmt::Expr(expr_stmt) => expr_assigned_ns(&expr_stmt.expr),
    _ => None,
  }
}

/// The namespace name published by an assignment, either as the target
/// (`win.$_mod = ...`, `$_mod = ...`) or as the value
/// (`module.exports = $_mod`).
fn expr_assigned_ns(expr: &Expr) -> Option<JsWord> {
  let assign = match expr {
    Expr::Assign(assign) => assign,
    _ => return None,
  };
  if assign.op != ast::AssignOp::Assign {
    return None;
  }
  let target = match &assign.left {
    ast::PatOrExpr::Pat(pat) => match &**pat {
      ast::Pat::Ident(name) => Some(name.id.sym.clone()),
      ast::Pat::Expr(expr) => assigned_name(expr),
      _ => None,
    },
    ast::PatOrExpr::Expr(expr) => assigned_name(expr),
  };
  if let Some(name) = target {
    if name.starts_with(NS_PREFIX) {
      return Some(name);
    }
  }
  if let Expr::Ident(right) = &*assign.right {
    if right.sym.starts_with(NS_PREFIX) {
      return Some(right.sym.clone());
    }
  }
  None
}

fn assigned_name(expr: &Expr) -> Option<JsWord> {
  match expr {
    Expr::Ident(ident) => Some(ident.sym.clone()),
    Expr::Member(member) => match &member.prop {
      ast::MemberProp::Ident(prop) => Some(prop.sym.clone()),
      _ => None,
    },
    _ => None,
  }
}

pub(crate) fn prop_name(name: &ast::PropName) -> Option<JsWord> {
  match name {
    ast::PropName::Ident(ident) => Some(ident.sym.clone()),
    ast::PropName::Str(s) => Some(s.value.clone()),
    _ => None,
  }
}
