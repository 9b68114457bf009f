use lassolink_common::{ModulePath, Registry, ResolvedRef, RunOptions};
use lassolink_error::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use swc_core::ecma::atoms::JsWord;

/// Anchored semver shape, prerelease and build metadata included. A
/// requested version that does not look like semver never matches an
/// installed one.
static SEMVER_SHAPE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
  )
  .unwrap()
});

/// What the resolver produced for a batch: every settled dependency path
/// plus the errors met along the way. Errors do not stop the pass; they
/// fail the batch later, at rewrite time.
#[derive(Debug, Default)]
pub struct Resolution {
  pub resolved: FxHashMap<JsWord, ResolvedRef>,
  pub errors: Vec<Error>,
}

impl Resolution {
  pub fn is_complete(&self) -> bool {
    self.errors.is_empty()
  }
}

/// Resolves every recorded dependency path to its definition and fills
/// each definition's finalize table. Results are memoized per dependency
/// path across the whole batch.
pub fn resolve_paths(registry: &mut Registry) -> Resolution {
  let mut resolution = Resolution::default();

  let module_paths = registry.defs.keys().cloned().collect::<Vec<_>>();
  for module_path in &module_paths {
    let pending = {
      let record = match registry.defs.get(module_path) {
        Some(record) => record,
        None => continue,
      };
      match &record.dependencies {
        Some(dependencies) => dependencies
          .deps
          .iter()
          .chain(dependencies.resolve.iter())
          .cloned()
          .collect::<Vec<_>>(),
        None => {
          let error = Error::missing_dependencies(&**module_path);
          tracing::error!("{}", error);
          resolution.errors.push(error);
          continue;
        }
      }
    };

    let consumer = ModulePath::new(module_path.clone());
    let mut finalized = Vec::with_capacity(pending.len());
    for dep in pending {
      if let Some(resolved) = resolution.resolved.get(&dep) {
        finalized.push((dep, resolved.clone()));
        continue;
      }
      match resolve_dependency(&consumer, &ModulePath::new(dep.clone()), registry) {
        Some(resolved) => {
          resolution.resolved.insert(dep.clone(), resolved.clone());
          finalized.push((dep, resolved));
        }
        None => {
          let error = Error::unresolved_dependency(&**module_path, &*dep);
          tracing::error!("{}", error);
          resolution.errors.push(error);
        }
      }
    }
    if let Some(record) = registry.defs.get_mut(module_path) {
      if let Some(dependencies) = record.dependencies.as_mut() {
        dependencies.finalize.extend(finalized);
      }
    }
  }

  validate_finalization(registry, &mut resolution);
  resolve_run_entries(registry, &mut resolution);
  resolution
}

fn resolve_dependency(
  consumer: &ModulePath,
  dependency: &ModulePath,
  registry: &Registry,
) -> Option<ResolvedRef> {
  // References within one package need no version negotiation.
  if consumer.package_identity() == dependency.package_identity() {
    if let Some(resolved) = lookup_definition(dependency.value(), registry) {
      return Some(resolved);
    }
  }

  let mut version_matched = false;
  if let Some(requested) = dependency.requested_version() {
    if let Some(installed) =
      registry.installed_version(consumer.package_identity(), dependency.package_name())
    {
      if SEMVER_SHAPE.is_match(requested) && &**installed == requested {
        version_matched = true;
      } else {
        tracing::debug!(
          "version mismatch for {} in {}: requested {}, installed {}",
          dependency,
          consumer,
          requested,
          installed
        );
      }
    }
  }

  if version_matched {
    if let Some(resolved) = lookup_definition(dependency.value(), registry) {
      return Some(resolved);
    }
  } else {
    let builtin_target = registry
      .builtin
      .get(dependency.value())
      .or_else(|| registry.builtin.get(&JsWord::from(dependency.package_name())));
    if let Some(target) = builtin_target {
      if let Some(resolved) = lookup_definition(target, registry) {
        return Some(resolved);
      }
    }
  }

  lookup_definition(dependency.value(), registry)
}

/// Follows definitions, main expansions and remaps until a definition is
/// found. A visited set guards against remap cycles.
fn lookup_definition(path: &JsWord, registry: &Registry) -> Option<ResolvedRef> {
  let mut seen = FxHashSet::default();
  let mut current = path.clone();
  loop {
    if !seen.insert(current.clone()) {
      tracing::warn!("lookup cycle at {}, giving up", current);
      return None;
    }
    if let Some(record) = registry.defs.get(&current) {
      return Some(ResolvedRef {
        name: record.name.clone(),
        kind: record.kind,
        referential_id: record.referential_id.clone(),
      });
    }
    if let Some(entry) = registry.main.get(&current) {
      current = expand_main(&current, entry);
      continue;
    }
    if let Some(target) = registry.remap.get(&current) {
      current = target.clone();
      continue;
    }
    return None;
  }
}

fn expand_main(root: &JsWord, entry: &JsWord) -> JsWord {
  let entry = entry.trim_start_matches('/');
  if entry.is_empty() {
    format!("{}/index", root).into()
  } else {
    format!("{}/{}", root, entry).into()
  }
}

/// Every recorded dependency must have ended up in its finalize table.
/// Anything missing is reported again, per consuming module.
fn validate_finalization(registry: &Registry, resolution: &mut Resolution) {
  for (module_path, record) in registry.defs.iter() {
    let dependencies = match &record.dependencies {
      Some(dependencies) => dependencies,
      None => continue,
    };
    for dep in dependencies.deps.iter().chain(dependencies.resolve.iter()) {
      if !dependencies.finalize.contains_key(dep) {
        let error = Error::incomplete_finalization(&**module_path, &**dep);
        tracing::error!("{}", error);
        resolution.errors.push(error);
      }
    }
  }
}

/// Run entries name definitions directly; no version negotiation, no
/// builtin fallback.
fn resolve_run_entries(registry: &Registry, resolution: &mut Resolution) {
  let mut run_targets = Vec::new();
  for (path, options) in registry.run.iter() {
    run_targets.push(path.clone());
    if let RunOptions::Target(target) = options {
      run_targets.push(target.clone());
    }
  }
  for target in run_targets {
    if resolution.resolved.contains_key(&target) {
      continue;
    }
    match lookup_definition(&target, registry) {
      Some(resolved) => {
        resolution.resolved.insert(target, resolved);
      }
      None => {
        let error = Error::unresolved_run_target(&*target);
        tracing::error!("{}", error);
        resolution.errors.push(error);
      }
    }
  }
}
