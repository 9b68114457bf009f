use std::mem;

use ast::{CallExpr, Callee, Expr, ExprOrSpread, ExprStmt, Lit, Stmt};
use lassolink_common::{DefKind, Registry, ResolvedRef};
use lassolink_error::{Error, Result};
use rustc_hash::FxHashMap;
use swc_core::{
  common::DUMMY_SP,
  ecma::{
    ast,
    atoms::JsWord,
    utils as swc_ecma_utils,
    visit as swc_ecma_visit,
  },
};
use swc_ecma_utils::{quote_ident, quote_str};
use swc_ecma_visit::{noop_visit_mut_type, VisitMut, VisitMutWith};

use crate::{
  classify_call, detect_client_bootstrap, require_sites, str_arg, CallKind, RequireSites,
};

#[derive(Debug, Clone)]
pub struct RewriteContext<'me> {
  pub registry: &'me Registry,
  /// Every dependency path the resolver settled, batch-wide.
  pub resolved: &'me FxHashMap<JsWord, ResolvedRef>,
  pub strip_loader_metadata: bool,
}

/// Rewrites one script in place: definitions become declarations, run
/// registrations become direct invocations and administrative calls
/// disappear.
pub fn rewrite(script: &mut ast::Script, ctx: &RewriteContext) -> Result<()> {
  let body = mem::take(&mut script.body);
  let mut rewritten = Vec::with_capacity(body.len());
  for stmt in body {
    if let Some(stmt) = rewrite_stmt(stmt, ctx)? {
      rewritten.push(stmt);
    }
  }
  script.body = rewritten;
  Ok(())
}

fn rewrite_stmt(stmt: Stmt, ctx: &RewriteContext) -> Result<Option<Stmt>> {
  let expr_stmt = match stmt {
    Stmt::Expr(expr_stmt) => expr_stmt,
    other => return Ok(Some(other)),
  };
  let kind = match &*expr_stmt.expr {
    Expr::Call(call) => classify_call(call),
    _ => None,
  };
  let kind = match kind {
    Some(kind) => kind,
    None => {
      let stmt = Stmt::Expr(expr_stmt);
      if is_client_bootstrap(&stmt, ctx.registry) {
        return Ok(None);
      }
      return Ok(Some(stmt));
    }
  };
  match kind {
    CallKind::Remap
    | CallKind::Main
    | CallKind::Installed
    | CallKind::Builtin
    | CallKind::SearchPath => Ok(None),
    CallKind::LoaderMetadata => {
      if ctx.strip_loader_metadata {
        Ok(None)
      } else {
        Ok(Some(Stmt::Expr(expr_stmt)))
      }
    }
    CallKind::Def | CallKind::Run => {
      let mut expr_stmt = expr_stmt;
      let call = match *expr_stmt.expr {
        Expr::Call(call) => call,
        other => {
          expr_stmt.expr = Box::new(other);
          return Ok(Some(Stmt::Expr(expr_stmt)));
        }
      };
      let stmt = if kind == CallKind::Def {
        rewrite_def(call, ctx.registry)?
      } else {
        rewrite_run(call, ctx.resolved)?
      };
      Ok(Some(stmt))
    }
  }
}

fn is_client_bootstrap(stmt: &Stmt, registry: &Registry) -> bool {
  match &registry.client_var {
    Some(client_var) => detect_client_bootstrap(stmt).map_or(false, |ns| &ns == client_var),
    None => false,
  }
}

/// `def(path, factory)` becomes a named function declaration and
/// `def(path, object)` a `var` declaration. Payload shapes the scanner
/// skipped pass through untouched.
fn rewrite_def(mut call: CallExpr, registry: &Registry) -> Result<Stmt> {
  let path = match str_arg(&call, 0) {
    Some(s) => s.value.clone(),
    None => return Ok(call_stmt(call)),
  };
  if call.args.len() < 2 || call.args[1].spread.is_some() {
    return Ok(call_stmt(call));
  }
  let payload = call.args.remove(1);
  match *payload.expr {
    Expr::Fn(fn_expr) => {
      let record = match registry.defs.get(&path) {
        Some(record) => record,
        None => return Err(Error::missing_definition(&*path)),
      };
      let dependencies = match &record.dependencies {
        Some(dependencies) => dependencies,
        None => return Err(Error::missing_dependencies(&*path)),
      };
      let mut function = fn_expr.function;
      rewrite_requires(&mut function, &dependencies.finalize, &path)?;
      Ok(Stmt::Decl(ast::Decl::Fn(ast::FnDecl {
        ident: quote_ident!(record.name.clone()),
        declare: false,
        function,
      })))
    }
    Expr::Object(object) => {
      let record = match registry.defs.get(&path) {
        Some(record) => record,
        None => return Err(Error::missing_definition(&*path)),
      };
      if record.referential_id.is_none() {
        return Err(Error::missing_referential_id(&*path));
      }
      Ok(Stmt::Decl(ast::Decl::Var(Box::new(ast::VarDecl {
        span: DUMMY_SP,
        kind: ast::VarDeclKind::Var,
        declare: false,
        decls: vec![ast::VarDeclarator {
          span: DUMMY_SP,
          name: ast::Pat::Ident(quote_ident!(record.name.clone()).into()),
          init: Some(Box::new(Expr::Object(object))),
          definite: false,
        }],
      }))))
    }
    other => {
      call.args.insert(
        1,
        ExprOrSpread {
          spread: None,
          expr: Box::new(other),
        },
      );
      Ok(call_stmt(call))
    }
  }
}

/// `run(path, options?)` becomes `run(ident, options?)`. A string option
/// names a second module to load first and is resolved the same way.
fn rewrite_run(mut call: CallExpr, resolved: &FxHashMap<JsWord, ResolvedRef>) -> Result<Stmt> {
  let path = match str_arg(&call, 0) {
    Some(s) => s.value.clone(),
    None => return Ok(call_stmt(call)),
  };
  let target = match resolved.get(&path) {
    Some(target) => target.clone(),
    None => return Err(Error::unresolved_run_target(&*path)),
  };
  let mut args = vec![ident_arg(&target.name)];
  if call.args.len() > 1 {
    let options = call.args.remove(1);
    match *options.expr {
      Expr::Lit(Lit::Str(s)) => {
        let dep = match resolved.get(&s.value) {
          Some(dep) => dep.clone(),
          None => return Err(Error::unresolved_run_target(&*s.value)),
        };
        args.push(ident_arg(&dep.name));
      }
      other => args.push(ExprOrSpread {
        spread: options.spread,
        expr: Box::new(other),
      }),
    }
  }
  Ok(Stmt::Expr(ExprStmt {
    span: call.span,
    expr: Box::new(Expr::Call(CallExpr {
      span: DUMMY_SP,
      callee: Callee::Expr(quote_ident!("run").into()),
      args,
      type_args: None,
    })),
  }))
}

fn rewrite_requires(
  function: &mut ast::Function,
  finalize: &FxHashMap<JsWord, ResolvedRef>,
  module_path: &JsWord,
) -> Result<()> {
  let sites = require_sites(function);
  if sites.calls.is_empty() && sites.resolves.is_empty() {
    return Ok(());
  }
  let mut rewriter = RequireRewriter {
    finalize,
    sites,
    module_path,
    error: None,
  };
  function.visit_mut_with(&mut rewriter);
  match rewriter.error {
    Some(error) => Err(error),
    None => Ok(()),
  }
}

struct RequireRewriter<'me> {
  finalize: &'me FxHashMap<JsWord, ResolvedRef>,
  sites: RequireSites,
  module_path: &'me JsWord,
  error: Option<Error>,
}

impl VisitMut for RequireRewriter<'_> {
  noop_visit_mut_type!();

  fn visit_mut_call_expr(&mut self, n: &mut CallExpr) {
    n.visit_mut_children_with(self);
    if self.sites.calls.contains(&n.span.lo) {
      self.rewrite_call(n);
    }
  }

  fn visit_mut_expr(&mut self, n: &mut Expr) {
    n.visit_mut_children_with(self);
    let replacement = match n {
      Expr::Call(call) if self.sites.resolves.contains(&call.span.lo) => {
        match self.resolve_replacement(call) {
          Some(replacement) => replacement,
          None => return,
        }
      }
      _ => return,
    };
    *n = replacement;
  }
}

impl RequireRewriter<'_> {
  fn lookup(&mut self, call: &CallExpr) -> Option<(JsWord, ResolvedRef)> {
    let target = str_arg(call, 0)?.value.clone();
    match self.finalize.get(&target) {
      Some(resolved) => Some((target, resolved.clone())),
      None => {
        self.record_error(Error::unresolved_require(&**self.module_path, &*target));
        None
      }
    }
  }

  /// `require("/p")` becomes `require(ident)`, with the referential id as
  /// a second argument when the target is an object definition.
  fn rewrite_call(&mut self, call: &mut CallExpr) {
    let (target, resolved) = match self.lookup(call) {
      Some(found) => found,
      None => return,
    };
    call.args.clear();
    call.args.push(ident_arg(&resolved.name));
    if resolved.kind == DefKind::Object {
      match resolved.referential_id {
        Some(referential_id) => call.args.push(string_arg(&referential_id)),
        None => self.record_error(Error::missing_referential_id(&*target)),
      }
    }
  }

  /// `require.resolve("/p")` becomes `ident.name` for function targets
  /// and the referential id literal for object targets.
  fn resolve_replacement(&mut self, call: &CallExpr) -> Option<Expr> {
    let (target, resolved) = self.lookup(call)?;
    match resolved.kind {
      DefKind::Function => Some(Expr::Member(ast::MemberExpr {
        span: DUMMY_SP,
        obj: quote_ident!(resolved.name.clone()).into(),
        prop: ast::MemberProp::Ident(quote_ident!("name")),
      })),
      DefKind::Object => match resolved.referential_id {
        Some(referential_id) => Some(Expr::Lit(Lit::Str(quote_str!(referential_id)))),
        None => {
          self.record_error(Error::missing_referential_id(&*target));
          None
        }
      },
    }
  }

  fn record_error(&mut self, error: Error) {
    if self.error.is_none() {
      self.error = Some(error);
    }
  }
}

fn ident_arg(name: &JsWord) -> ExprOrSpread {
  ExprOrSpread {
    spread: None,
    expr: Box::new(Expr::Ident(quote_ident!(name.clone()))),
  }
}

fn string_arg(value: &JsWord) -> ExprOrSpread {
  ExprOrSpread {
    spread: None,
    expr: Box::new(Expr::Lit(Lit::Str(quote_str!(value.clone())))),
  }
}

fn call_stmt(call: CallExpr) -> Stmt {
  Stmt::Expr(ExprStmt {
    span: call.span,
    expr: Box::new(Expr::Call(call)),
  })
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use lassolink_common::NameSource;
  use swc_core::common::{Globals, Mark, GLOBALS};

  use super::*;
  use crate::scan;

  fn rewrite_source(code: &str, strip_loader_metadata: bool) -> String {
    let compiler = lassolink_compiler::Compiler::default();
    let fm = compiler.create_source_file(PathBuf::from("test.js"), code.to_string());
    let mut script = compiler.parse_script(fm).unwrap();
    GLOBALS.set(&Globals::new(), || {
      crate::resolve(&mut script, Mark::new(), Mark::new());
    });

    let mut registry = Registry::new();
    let mut names = NameSource::Derived;
    scan(&script, &mut registry, &mut names).unwrap();

    let mut resolved = FxHashMap::default();
    for (path, record) in registry.defs.iter() {
      resolved.insert(
        path.clone(),
        ResolvedRef {
          name: record.name.clone(),
          kind: record.kind,
          referential_id: record.referential_id.clone(),
        },
      );
    }
    let paths = registry.defs.keys().cloned().collect::<Vec<_>>();
    for path in paths {
      let entries = {
        let record = registry.defs.get(&path).unwrap();
        let dependencies = record.dependencies.as_ref().unwrap();
        dependencies
          .deps
          .iter()
          .chain(dependencies.resolve.iter())
          .filter_map(|dep| resolved.get(dep).map(|r| (dep.clone(), r.clone())))
          .collect::<Vec<_>>()
      };
      let record = registry.defs.get_mut(&path).unwrap();
      if let Some(dependencies) = record.dependencies.as_mut() {
        dependencies.finalize.extend(entries);
      }
    }

    let ctx = RewriteContext {
      registry: &registry,
      resolved: &resolved,
      strip_loader_metadata,
    };
    rewrite(&mut script, &ctx).unwrap();
    compiler.print_script(&script).unwrap()
  }

  #[test]
  fn function_defs_become_named_declarations() {
    let output = rewrite_source(
      r#"$_mod.def("/foo$1.0.0/a", function(require, exports, module) {
        module.exports = 1;
      });"#,
      false,
    );
    assert!(output.contains("function __foo_1_0_0__a(require, exports, module)"));
    assert!(!output.contains("$_mod.def"));
  }

  #[test]
  fn require_literals_become_identifiers() {
    let output = rewrite_source(
      r#"$_mod.def("/foo$1.0.0/a", function(require, exports, module) {
        module.exports = require("/foo$1.0.0/b");
      });
      $_mod.def("/foo$1.0.0/b", function(require, exports, module) {});"#,
      false,
    );
    assert!(output.contains("require(__foo_1_0_0__b)"));
    assert!(!output.contains(r#"require("/foo$1.0.0/b")"#));
  }

  #[test]
  fn object_defs_become_vars_and_requires_carry_the_referential_id() {
    let output = rewrite_source(
      r#"$_mod.def("/cfg$1.0.0/settings", { debug: true });
      $_mod.def("/app$1.0.0/main", function(require) {
        var settings = require("/cfg$1.0.0/settings");
      });"#,
      false,
    );
    assert!(output.contains("var __cfg_1_0_0__settings = {"));
    assert!(output.contains(r#"require(__cfg_1_0_0__settings, "_o0")"#));
  }

  #[test]
  fn resolve_on_function_targets_reads_the_name() {
    let output = rewrite_source(
      r#"$_mod.def("/foo$1.0.0/a", function(require) {
        var p = require.resolve("/foo$1.0.0/b");
      });
      $_mod.def("/foo$1.0.0/b", function(require) {});"#,
      false,
    );
    assert!(output.contains("var p = __foo_1_0_0__b.name;"));
  }

  #[test]
  fn resolve_on_object_targets_becomes_the_referential_id() {
    let output = rewrite_source(
      r#"$_mod.def("/cfg$1.0.0/settings", { debug: true });
      $_mod.def("/app$1.0.0/main", function(require) {
        var p = require.resolve("/cfg$1.0.0/settings");
      });"#,
      false,
    );
    assert!(output.contains(r#"var p = "_o0";"#));
  }

  #[test]
  fn administrative_calls_disappear() {
    let output = rewrite_source(
      r#"$_mod.installed("app$1.0.0", "foo", "1.0.0");
      $_mod.main("/foo$1.0.0", "lib/index");
      $_mod.remap("/a$1.0.0/x", "/a$1.0.0/y");
      $_mod.builtin("stream", "/s$1.0.0/index");
      $_mod.searchPath("/node_modules/");
      keepMe();"#,
      false,
    );
    assert!(!output.contains("$_mod"));
    assert!(output.contains("keepMe();"));
  }

  #[test]
  fn loader_metadata_is_kept_by_default_and_stripped_on_demand() {
    let source = r#"$_mod.loaderMetadata({ "home": { css: [], js: [] } });"#;
    let kept = rewrite_source(source, false);
    assert!(kept.contains("$_mod.loaderMetadata"));
    let stripped = rewrite_source(source, true);
    assert!(!stripped.contains("loaderMetadata"));
  }

  #[test]
  fn run_calls_invoke_the_resolved_identifier() {
    let output = rewrite_source(
      r#"$_mod.def("/app$1.0.0/main", function(require) {});
      $_mod.run("/app$1.0.0/main", { wait: !1 });"#,
      false,
    );
    assert!(output.contains("run(__app_1_0_0__main, {"));
  }

  #[test]
  fn unresolved_requires_fail_the_rewrite() {
    let compiler = lassolink_compiler::Compiler::default();
    let fm = compiler.create_source_file(
      PathBuf::from("test.js"),
      r#"$_mod.def("/app$1.0.0/main", function(require) {
        require("/missing$1.0.0/x");
      });"#
        .to_string(),
    );
    let mut script = compiler.parse_script(fm).unwrap();
    GLOBALS.set(&Globals::new(), || {
      crate::resolve(&mut script, Mark::new(), Mark::new());
    });
    let mut registry = Registry::new();
    let mut names = NameSource::Derived;
    scan(&script, &mut registry, &mut names).unwrap();
    let resolved = FxHashMap::default();
    let ctx = RewriteContext {
      registry: &registry,
      resolved: &resolved,
      strip_loader_metadata: false,
    };
    let error = rewrite(&mut script, &ctx).unwrap_err();
    assert_eq!(
      error.kind.code(),
      lassolink_error::error_code::UNRESOLVED_REQUIRE
    );
  }
}
