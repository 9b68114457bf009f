use ast::{CallExpr, Callee, Expr, Lit, Stmt};
use lassolink_common::{
  DefKind, DefRecord, DepRecord, LoaderAssets, NameSource, Registry, RunOptions,
};
use lassolink_error::{Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use swc_core::{
  common::BytePos,
  ecma::{ast, atoms::JsWord, visit as swc_ecma_visit},
};
use swc_ecma_visit::{noop_visit_type, Visit, VisitWith};

use crate::{bool_value, detect_client_bootstrap, module_sys_call, prop_name, str_arg, CallKind};

/// Fills the registry from one script. Call once per source unit before
/// resolving; the registry is shared across the whole batch.
pub fn scan(script: &ast::Script, registry: &mut Registry, names: &mut NameSource) -> Result<()> {
  let mut scanner = Scanner { registry, names };
  for stmt in &script.body {
    scanner.scan_stmt(stmt)?;
  }
  Ok(())
}

struct Scanner<'a> {
  registry: &'a mut Registry,
  names: &'a mut NameSource,
}

impl Scanner<'_> {
  fn scan_stmt(&mut self, stmt: &Stmt) -> Result<()> {
    if let Some((kind, call)) = module_sys_call(stmt) {
      match kind {
        CallKind::Def => self.scan_def(call)?,
        CallKind::Remap => self.scan_remap(call),
        CallKind::Main => self.scan_main(call),
        CallKind::Installed => self.scan_installed(call),
        CallKind::Builtin => self.scan_builtin(call),
        CallKind::Run => self.scan_run(call),
        CallKind::SearchPath => self.scan_search_path(call),
        CallKind::LoaderMetadata => self.scan_loader_metadata(call),
      }
      return Ok(());
    }
    if self.registry.client_var.is_none() {
      if let Some(ns) = detect_client_bootstrap(stmt) {
        tracing::debug!("detected client bootstrap assigning {}", ns);
        self.registry.client_var = Some(ns);
      }
    }
    Ok(())
  }

  fn allocate_name(&mut self, path: &str) -> Result<JsWord> {
    match self.names.name_for(path) {
      Some(name) => Ok(name),
      None => Err(Error::name_pool_exhausted(
        self.names.capacity().unwrap_or(0),
      )),
    }
  }

  fn scan_def(&mut self, call: &CallExpr) -> Result<()> {
    let path = match str_arg(call, 0) {
      Some(s) => s.value.clone(),
      None => {
        tracing::warn!("def without a literal path, leaving the call untouched");
        return Ok(());
      }
    };
    // TODO: a third `{ globals: [...] }` argument is accepted here but not
    // yet forwarded to the runtime.
    let payload = match call.args.get(1) {
      Some(arg) if arg.spread.is_none() => &arg.expr,
      _ => {
        tracing::warn!("def {} without a payload, leaving the call untouched", path);
        return Ok(());
      }
    };
    let record = match &**payload {
      Expr::Fn(fn_expr) => {
        let dependencies = collect_dependencies(&fn_expr.function, &path);
        DefRecord {
          name: self.allocate_name(&path)?,
          kind: DefKind::Function,
          referential_id: None,
          dependencies,
        }
      }
      Expr::Object(_) => DefRecord {
        name: self.allocate_name(&path)?,
        kind: DefKind::Object,
        referential_id: Some(self.registry.next_referential_id()),
        dependencies: Some(DepRecord::default()),
      },
      _ => {
        tracing::warn!(
          "def {} with an unsupported payload, leaving the call untouched",
          path
        );
        return Ok(());
      }
    };
    self.registry.add_def(path, record);
    Ok(())
  }

  fn scan_remap(&mut self, call: &CallExpr) {
    if let (Some(from), Some(to)) = (str_arg(call, 0), str_arg(call, 1)) {
      self.registry.remap.insert(from.value.clone(), to.value.clone());
    } else {
      tracing::warn!("remap without literal arguments, skipping");
    }
  }

  fn scan_main(&mut self, call: &CallExpr) {
    if let (Some(dir), Some(entry)) = (str_arg(call, 0), str_arg(call, 1)) {
      self.registry.main.insert(dir.value.clone(), entry.value.clone());
    } else {
      tracing::warn!("main without literal arguments, skipping");
    }
  }

  fn scan_installed(&mut self, call: &CallExpr) {
    if let (Some(owner), Some(name), Some(version)) =
      (str_arg(call, 0), str_arg(call, 1), str_arg(call, 2))
    {
      self.registry.add_installed(
        owner.value.clone(),
        name.value.clone(),
        version.value.clone(),
      );
    } else {
      tracing::warn!("installed without literal arguments, skipping");
    }
  }

  fn scan_builtin(&mut self, call: &CallExpr) {
    if let (Some(name), Some(target)) = (str_arg(call, 0), str_arg(call, 1)) {
      self.registry.builtin.insert(name.value.clone(), target.value.clone());
    } else {
      tracing::warn!("builtin without literal arguments, skipping");
    }
  }

  fn scan_run(&mut self, call: &CallExpr) {
    let path = match str_arg(call, 0) {
      Some(s) => s.value.clone(),
      None => {
        tracing::warn!("run without a literal path, skipping");
        return;
      }
    };
    let options = match call.args.get(1) {
      None => RunOptions::None,
      Some(arg) => match &*arg.expr {
        Expr::Lit(Lit::Str(s)) => RunOptions::Target(s.value.clone()),
        Expr::Object(object) => RunOptions::Flags(run_flags(object)),
        _ => RunOptions::None,
      },
    };
    self.registry.run.insert(path, options);
  }

  fn scan_search_path(&mut self, call: &CallExpr) {
    if let Some(path) = str_arg(call, 0) {
      self.registry.search_paths.push(path.value.clone());
    } else {
      tracing::warn!("searchPath without a literal argument, skipping");
    }
  }

  fn scan_loader_metadata(&mut self, call: &CallExpr) {
    let object = match call.args.first() {
      Some(arg) if arg.spread.is_none() => match &*arg.expr {
        Expr::Object(object) => object,
        _ => {
          tracing::warn!("loaderMetadata without an object payload, skipping");
          return;
        }
      },
      _ => {
        tracing::warn!("loaderMetadata without an object payload, skipping");
        return;
      }
    };
    for prop in &object.props {
      let kv = match prop {
        ast::PropOrSpread::Prop(prop) => match &**prop {
          ast::Prop::KeyValue(kv) => kv,
          _ => continue,
        },
        _ => continue,
      };
      let name = match prop_name(&kv.key) {
        Some(name) => name,
        None => continue,
      };
      if let Expr::Object(value) = &*kv.value {
        self.registry.loader_metadata.insert(name, loader_assets(value));
      }
    }
  }
}

fn run_flags(object: &ast::ObjectLit) -> FxHashMap<JsWord, bool> {
  let mut flags = FxHashMap::default();
  for prop in &object.props {
    if let ast::PropOrSpread::Prop(prop) = prop {
      if let ast::Prop::KeyValue(kv) = &**prop {
        if let (Some(key), Some(value)) = (prop_name(&kv.key), bool_value(&kv.value)) {
          flags.insert(key, value);
        }
      }
    }
  }
  flags
}

fn loader_assets(object: &ast::ObjectLit) -> LoaderAssets {
  let mut assets = LoaderAssets::default();
  for prop in &object.props {
    if let ast::PropOrSpread::Prop(prop) = prop {
      if let ast::Prop::KeyValue(kv) = &**prop {
        let bucket = match prop_name(&kv.key).as_deref() {
          Some("css") => &mut assets.css,
          Some("js") => &mut assets.js,
          _ => continue,
        };
        if let Expr::Array(array) = &*kv.value {
          for element in array.elems.iter().flatten() {
            if element.spread.is_none() {
              if let Expr::Lit(Lit::Str(s)) = &*element.expr {
                bucket.push(s.value.clone());
              }
            }
          }
        }
      }
    }
  }
  assets
}

/// Walks a factory body and records the `require(...)` and
/// `require.resolve(...)` targets, in source order. Returns `None` when
/// the factory uses `require` in a way that makes static extraction
/// unsound, which later fails the whole batch.
pub fn collect_dependencies(function: &ast::Function, module_path: &str) -> Option<DepRecord> {
  let require_id = match require_param_id(function) {
    Some(id) => id,
    None => return Some(DepRecord::default()),
  };
  let body = match &function.body {
    Some(body) => body,
    None => return Some(DepRecord::default()),
  };
  let mut collector = RequireCollector::new(require_id);
  body.visit_with(&mut collector);

  let mut record = DepRecord::default();
  for require_ref in pruned_refs(collector) {
    match require_ref.shape {
      RefShape::Call {
        target: Some(target),
        argc: 1,
      } => record.deps.push(target),
      RefShape::Call { argc: 0, .. } => {
        tracing::warn!(
          "empty require() in {}, dependency extraction aborted",
          module_path
        );
        return None;
      }
      RefShape::Call { .. } => {
        tracing::warn!("dynamic require in {}, call left untouched", module_path);
      }
      RefShape::Resolve {
        target: Some(target),
        argc: 1,
      } => record.resolve.push(target),
      RefShape::Resolve { .. } => {
        tracing::warn!(
          "dynamic require.resolve in {}, dependency extraction aborted",
          module_path
        );
        return None;
      }
    }
  }
  Some(record)
}

/// Call sites the rewriter is allowed to touch, keyed by span start.
pub(crate) struct RequireSites {
  pub calls: FxHashSet<BytePos>,
  pub resolves: FxHashSet<BytePos>,
}

pub(crate) fn require_sites(function: &ast::Function) -> RequireSites {
  let mut sites = RequireSites {
    calls: FxHashSet::default(),
    resolves: FxHashSet::default(),
  };
  let require_id = match require_param_id(function) {
    Some(id) => id,
    None => return sites,
  };
  let body = match &function.body {
    Some(body) => body,
    None => return sites,
  };
  let mut collector = RequireCollector::new(require_id);
  body.visit_with(&mut collector);
  for require_ref in pruned_refs(collector) {
    match require_ref.shape {
      RefShape::Call {
        target: Some(_),
        argc: 1,
      } => {
        sites.calls.insert(require_ref.pos);
      }
      RefShape::Resolve {
        target: Some(_),
        argc: 1,
      } => {
        sites.resolves.insert(require_ref.pos);
      }
      _ => {}
    }
  }
  sites
}

fn require_param_id(function: &ast::Function) -> Option<ast::Id> {
  let param = function.params.first()?;
  match &param.pat {
    ast::Pat::Ident(binding) => Some(binding.id.to_id()),
    _ => None,
  }
}

#[derive(Debug)]
enum RefShape {
  Call { target: Option<JsWord>, argc: usize },
  Resolve { target: Option<JsWord>, argc: usize },
}

#[derive(Debug)]
struct RequireRef {
  pos: BytePos,
  shape: RefShape,
}

/// Collects references to the factory's `require` binding. Shadowed inner
/// bindings have a different syntax context and are ignored, which is why
/// the resolver pass has to run first.
struct RequireCollector {
  require_id: ast::Id,
  refs: Vec<RequireRef>,
  violations: Vec<BytePos>,
  self_reassigns: FxHashSet<BytePos>,
}

impl RequireCollector {
  fn new(require_id: ast::Id) -> Self {
    Self {
      require_id,
      refs: Vec::new(),
      violations: Vec::new(),
      self_reassigns: FxHashSet::default(),
    }
  }

  fn is_require_callee(&self, callee: &Callee) -> bool {
    match callee {
      Callee::Expr(callee) => match &**callee {
        Expr::Ident(ident) => ident.to_id() == self.require_id,
        _ => false,
      },
      _ => false,
    }
  }
}

impl Visit for RequireCollector {
  noop_visit_type!();

  fn visit_call_expr(&mut self, n: &CallExpr) {
    if let Callee::Expr(callee) = &n.callee {
      match &**callee {
        Expr::Ident(ident) if ident.to_id() == self.require_id => {
          self.refs.push(RequireRef {
            pos: n.span.lo,
            shape: RefShape::Call {
              target: literal_target(n),
              argc: n.args.len(),
            },
          });
        }
        Expr::Member(member) => {
          if let Some(obj) = member.obj.as_ident() {
            if obj.to_id() == self.require_id && prop_is(&member.prop, "resolve") {
              self.refs.push(RequireRef {
                pos: n.span.lo,
                shape: RefShape::Resolve {
                  target: literal_target(n),
                  argc: n.args.len(),
                },
              });
            }
          }
        }
        _ => {}
      }
    }
    n.visit_children_with(self);
  }

  fn visit_assign_expr(&mut self, n: &ast::AssignExpr) {
    if assign_target_id(n).map_or(false, |id| id == self.require_id) {
      self.violations.push(n.span.lo);
      if let Expr::Call(call) = &*n.right {
        if self.is_require_callee(&call.callee) {
          self.self_reassigns.insert(call.span.lo);
        }
      }
    }
    n.visit_children_with(self);
  }

  fn visit_update_expr(&mut self, n: &ast::UpdateExpr) {
    if let Expr::Ident(ident) = &*n.arg {
      if ident.to_id() == self.require_id {
        self.violations.push(n.span.lo);
      }
    }
    n.visit_children_with(self);
  }
}

/// Drops require references recorded past the first reassignment of the
/// binding. `require.resolve` sites and calls that feed the reassignment
/// itself survive.
fn pruned_refs(collector: RequireCollector) -> Vec<RequireRef> {
  let RequireCollector {
    mut refs,
    violations,
    self_reassigns,
    ..
  } = collector;
  refs.sort_by_key(|r| r.pos);
  if let Some(cutoff) = violations.iter().min().copied() {
    refs.retain(|r| {
      r.pos < cutoff
        || matches!(r.shape, RefShape::Resolve { .. })
        || self_reassigns.contains(&r.pos)
    });
  }
  refs
}

fn assign_target_id(n: &ast::AssignExpr) -> Option<ast::Id> {
  match &n.left {
    ast::PatOrExpr::Pat(pat) => match &**pat {
      ast::Pat::Ident(binding) => Some(binding.id.to_id()),
      ast::Pat::Expr(expr) => expr_ident_id(expr),
      _ => None,
    },
    ast::PatOrExpr::Expr(expr) => expr_ident_id(expr),
  }
}

fn expr_ident_id(expr: &Expr) -> Option<ast::Id> {
  match expr {
    Expr::Ident(ident) => Some(ident.to_id()),
    _ => None,
  }
}

fn literal_target(call: &CallExpr) -> Option<JsWord> {
  str_arg(call, 0).map(|s| s.value.clone())
}

fn prop_is(prop: &ast::MemberProp, name: &str) -> bool {
  match prop {
    ast::MemberProp::Ident(ident) => &*ident.sym == name,
    _ => false,
  }
}
