use std::path::PathBuf;

use lassolink_common::{NamePool, NameSource, Registry};
use lassolink_error::Error;
use lassolink_swc_visitors::{rewrite, scan, RewriteContext, NS_PREFIX};
use swc_core::common::{Mark, GLOBALS};

use crate::{
  resolve_paths, InputOptions, LinkResult, NameStrategy, OutputOptions, OutputUnit, SourceUnit,
  COMPILER, SWC_GLOBALS,
};

/// Links a batch of module-registration scripts into statically wired
/// output, one [OutputUnit] per input. The whole batch shares one
/// registry, so requires may cross unit boundaries.
///
/// Any parse or rewrite failure fails the batch; callers that want to
/// ship the originals instead handle the error themselves.
pub fn link(
  input: &InputOptions,
  output: &OutputOptions,
  units: &[SourceUnit],
) -> LinkResult<Vec<OutputUnit>> {
  GLOBALS.set(&SWC_GLOBALS, || link_inner(input, output, units))
}

fn link_inner(
  input: &InputOptions,
  output: &OutputOptions,
  units: &[SourceUnit],
) -> LinkResult<Vec<OutputUnit>> {
  let mut scripts = Vec::with_capacity(units.len());
  for unit in units {
    let fm = COMPILER.create_source_file(PathBuf::from(&unit.name), unit.code.clone());
    let mut script = COMPILER
      .parse_script(fm.clone())
      .map_err(|source| Error::parse_js_failed(fm, source))?;
    lassolink_swc_visitors::resolve(&mut script, Mark::new(), Mark::new());
    scripts.push(script);
  }

  let mut registry = Registry::new();
  let mut names = name_source(input);
  for script in &scripts {
    scan(script, &mut registry, &mut names)?;
  }

  let resolution = resolve_paths(&mut registry);
  if !resolution.is_complete() {
    tracing::warn!(
      "{} resolution error(s), affected modules will fail at rewrite",
      resolution.errors.len()
    );
  }

  let ctx = RewriteContext {
    registry: &registry,
    resolved: &resolution.resolved,
    strip_loader_metadata: output.strip_loader_metadata,
  };
  let mut outputs = Vec::with_capacity(scripts.len());
  for (script, unit) in scripts.iter_mut().zip(units) {
    rewrite(script, &ctx)?;
    let code = COMPILER.print_script(script)?;
    outputs.push(OutputUnit {
      name: unit.name.clone(),
      code,
    });
  }

  if output.inject_client {
    let ns = ns_var(&registry, input);
    if let Some(first) = outputs.first_mut() {
      first.code = lassolink_runtime_shim::wrap_entry(&ns, &first.code);
    }
  }

  Ok(outputs)
}

fn name_source(input: &InputOptions) -> NameSource {
  match input.name_strategy {
    NameStrategy::PathDerived => NameSource::Derived,
    NameStrategy::Pooled { group_size } => NameSource::Pool(NamePool::with_group_size(group_size)),
  }
}

/// The namespace the injected client claims on `window`. An explicit
/// suffix wins over whatever bootstrap the scan detected.
fn ns_var(registry: &Registry, input: &InputOptions) -> String {
  match (&input.ns_suffix, &registry.client_var) {
    (Some(suffix), _) => format!("{}_{}", NS_PREFIX, suffix),
    (None, Some(detected)) => detected.to_string(),
    (None, None) => NS_PREFIX.to_string(),
  }
}
