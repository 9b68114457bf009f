/// Controls how finalized definitions are named.
#[derive(Debug, Clone, Default)]
pub enum NameStrategy {
  /// Derive a stable identifier from each module path.
  #[default]
  PathDerived,
  /// Hand out generated short names from a pre-computed pool, in
  /// registration order.
  Pooled { group_size: usize },
}

#[derive(Debug, Clone, Default)]
pub struct InputOptions {
  /// Suffix for the injected runtime's namespace variable, the `gh_fe`
  /// in `$_mod_gh_fe`. Without one, a namespace found in the sources is
  /// reused and `$_mod` is the fallback.
  pub ns_suffix: Option<String>,
  pub name_strategy: NameStrategy,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
  /// Prepend the client runtime to the first output unit.
  pub inject_client: bool,
  /// Drop `loaderMetadata` registrations instead of forwarding them.
  pub strip_loader_metadata: bool,
}

impl Default for OutputOptions {
  fn default() -> Self {
    Self {
      inject_client: true,
      strip_loader_metadata: false,
    }
  }
}

/// One input file: a name for diagnostics plus its source text.
#[derive(Debug, Clone)]
pub struct SourceUnit {
  pub name: String,
  pub code: String,
}

impl SourceUnit {
  pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      code: code.into(),
    }
  }
}

/// One rewritten file, same order as the inputs.
#[derive(Debug, Clone)]
pub struct OutputUnit {
  pub name: String,
  pub code: String,
}
