use std::{fmt::Display, sync::Arc};

use swc_core::common::SourceFile;

use crate::ErrorKind;

#[derive(Debug)]
pub struct Error {
  contexts: Vec<String>,
  pub kind: ErrorKind,
}

impl PartialEq for Error {
  fn eq(&self, other: &Self) -> bool {
    self.kind.to_string().eq(&other.kind.to_string())
  }
}

impl Eq for Error {}

impl PartialOrd for Error {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    self.kind.to_string().partial_cmp(&other.kind.to_string())
  }
}

impl Ord for Error {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.kind.to_string().cmp(&other.kind.to_string())
  }
}

impl Error {
  fn with_kind(kind: ErrorKind) -> Self {
    Self {
      contexts: vec![],
      kind,
    }
  }

  pub fn context(mut self, context: String) -> Self {
    self.contexts.push(context);
    self
  }

  pub fn unresolved_dependency(consumer: impl AsRef<str>, dependency: impl AsRef<str>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedDependency {
      consumer: consumer.as_ref().to_string(),
      dependency: dependency.as_ref().to_string(),
    })
  }

  pub fn missing_dependencies(module: impl AsRef<str>) -> Self {
    Self::with_kind(ErrorKind::MissingDependencies {
      module: module.as_ref().to_string(),
    })
  }

  pub fn incomplete_finalization(module: impl AsRef<str>, dependency: impl AsRef<str>) -> Self {
    Self::with_kind(ErrorKind::IncompleteFinalization {
      module: module.as_ref().to_string(),
      dependency: dependency.as_ref().to_string(),
    })
  }

  pub fn unresolved_run_target(target: impl AsRef<str>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedRunTarget {
      target: target.as_ref().to_string(),
    })
  }

  pub fn missing_definition(path: impl AsRef<str>) -> Self {
    Self::with_kind(ErrorKind::MissingDefinition {
      path: path.as_ref().to_string(),
    })
  }

  pub fn missing_referential_id(path: impl AsRef<str>) -> Self {
    Self::with_kind(ErrorKind::MissingReferentialId {
      path: path.as_ref().to_string(),
    })
  }

  pub fn unresolved_require(module: impl AsRef<str>, target: impl AsRef<str>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedRequire {
      module: module.as_ref().to_string(),
      target: target.as_ref().to_string(),
    })
  }

  pub fn name_pool_exhausted(capacity: usize) -> Self {
    Self::with_kind(ErrorKind::NamePoolExhausted { capacity })
  }

  pub fn parse_js_failed(
    fm: Arc<SourceFile>,
    source: swc_core::ecma::parser::error::Error,
  ) -> Self {
    Self::with_kind(ErrorKind::ParseJsFailed {
      source_file: fm,
      source,
    })
  }

  pub fn panic(msg: String) -> Self {
    anyhow::format_err!(msg).into()
  }
}

impl std::convert::From<anyhow::Error> for Error {
  fn from(value: anyhow::Error) -> Self {
    Self::with_kind(ErrorKind::Panic { source: value })
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.kind {
      ErrorKind::Panic { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for ctx in self.contexts.iter().rev() {
      writeln!(f, "{}: {}", ansi_term::Color::Yellow.paint("context"), ctx)?;
    }

    self.kind.fmt(f)
  }
}
