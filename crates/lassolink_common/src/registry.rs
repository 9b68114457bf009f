use hashlink::LinkedHashMap;
use rustc_hash::FxHashMap;
use swc_core::ecma::atoms::JsWord;

/// Whether a definition registered a factory function or a plain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
  Function,
  Object,
}

/// Outcome of resolving one dependency path: the identifier the target
/// definition is declared under, plus what that definition is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
  pub name: JsWord,
  pub kind: DefKind,
  pub referential_id: Option<JsWord>,
}

/// Dependency paths collected from one factory body, in source order.
/// `deps` holds `require(...)` targets and `resolve` holds
/// `require.resolve(...)` targets; the resolver fills `finalize`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DepRecord {
  pub deps: Vec<JsWord>,
  pub resolve: Vec<JsWord>,
  pub finalize: FxHashMap<JsWord, ResolvedRef>,
}

/// One `def(...)` registration.
#[derive(Debug)]
pub struct DefRecord {
  pub name: JsWord,
  pub kind: DefKind,
  pub referential_id: Option<JsWord>,
  /// `None` when dependency extraction was aborted for this factory.
  pub dependencies: Option<DepRecord>,
}

/// Second argument of a `run(...)` registration.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOptions {
  None,
  Flags(FxHashMap<JsWord, bool>),
  Target(JsWord),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoaderAssets {
  pub css: Vec<JsWord>,
  pub js: Vec<JsWord>,
}

/// Everything the scan pass learned about a batch of sources. Definition
/// and run order are preserved; the remaining tables are plain lookups.
#[derive(Debug, Default)]
pub struct Registry {
  pub defs: LinkedHashMap<JsWord, DefRecord>,
  pub remap: FxHashMap<JsWord, JsWord>,
  pub main: FxHashMap<JsWord, JsWord>,
  /// Keyed by the owning package identity, then by dependency name.
  pub installed: FxHashMap<JsWord, FxHashMap<JsWord, JsWord>>,
  pub builtin: FxHashMap<JsWord, JsWord>,
  pub run: LinkedHashMap<JsWord, RunOptions>,
  pub search_paths: Vec<JsWord>,
  pub loader_metadata: FxHashMap<JsWord, LoaderAssets>,
  /// Namespace variable assigned by a detected client bootstrap.
  pub client_var: Option<JsWord>,
  referential_seq: u32,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_def(&mut self, path: JsWord, record: DefRecord) {
    if let Some(previous) = self.defs.insert(path.clone(), record) {
      tracing::warn!(
        "module {} was defined twice, keeping the later definition over {}",
        path,
        previous.name
      );
    }
  }

  pub fn add_installed(&mut self, owner: JsWord, name: JsWord, version: JsWord) {
    self.installed.entry(owner).or_default().insert(name, version);
  }

  pub fn installed_version(&self, owner_identity: &str, dep_name: &str) -> Option<&JsWord> {
    self
      .installed
      .get(&JsWord::from(owner_identity))?
      .get(&JsWord::from(dep_name))
  }

  pub fn next_referential_id(&mut self) -> JsWord {
    let id = format!("_o{}", self.referential_seq);
    self.referential_seq += 1;
    id.into()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn def(name: &str) -> DefRecord {
    DefRecord {
      name: name.into(),
      kind: DefKind::Function,
      referential_id: None,
      dependencies: Some(DepRecord::default()),
    }
  }

  #[test]
  fn later_definition_wins() {
    let mut registry = Registry::new();
    registry.add_def("/foo$1.0.0/a".into(), def("first"));
    registry.add_def("/foo$1.0.0/a".into(), def("second"));
    assert_eq!(registry.defs.len(), 1);
    let record = registry.defs.get(&JsWord::from("/foo$1.0.0/a")).unwrap();
    assert_eq!(&*record.name, "second");
  }

  #[test]
  fn installed_versions_are_scoped_to_the_owner() {
    let mut registry = Registry::new();
    registry.add_installed("foo$1.0.0".into(), "bar".into(), "2.0.0".into());
    assert_eq!(
      registry.installed_version("foo$1.0.0", "bar").map(|v| &**v),
      Some("2.0.0")
    );
    assert_eq!(registry.installed_version("foo$1.0.0", "baz"), None);
    assert_eq!(registry.installed_version("other$1.0.0", "bar"), None);
  }

  #[test]
  fn referential_ids_count_up() {
    let mut registry = Registry::new();
    assert_eq!(&*registry.next_referential_id(), "_o0");
    assert_eq!(&*registry.next_referential_id(), "_o1");
  }
}
