use std::{fmt::Display, sync::Arc};

use swc_core::common::SourceFile;

pub mod error_code;

#[derive(Debug)]
pub enum ErrorKind {
  // --- Resolution
  UnresolvedDependency {
    consumer: String,
    dependency: String,
  },
  MissingDependencies {
    module: String,
  },
  IncompleteFinalization {
    module: String,
    dependency: String,
  },
  UnresolvedRunTarget {
    target: String,
  },

  // --- Rewriting
  MissingDefinition {
    path: String,
  },
  MissingReferentialId {
    path: String,
  },
  UnresolvedRequire {
    module: String,
    target: String,
  },
  NamePoolExhausted {
    capacity: usize,
  },

  ParseJsFailed {
    source_file: Arc<SourceFile>,
    source: swc_core::ecma::parser::error::Error,
  },

  /// Unrecoverable error. Used instead of `panic!()` for graceful shutdown,
  /// which is not recommended.
  Panic {
    source: anyhow::Error,
  },
}

impl Display for ErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ErrorKind::UnresolvedDependency {
        consumer,
        dependency,
      } => write!(
        f,
        r#"Unable to resolve dependency "{dependency}" in module "{consumer}"."#
      ),
      ErrorKind::MissingDependencies { module } => write!(
        f,
        r#"Definition "{module}" has no dependency record (extraction was aborted)."#
      ),
      ErrorKind::IncompleteFinalization { module, dependency } => write!(
        f,
        r#"Dependency "{dependency}" of module "{module}" was never finalized."#
      ),
      ErrorKind::UnresolvedRunTarget { target } => {
        write!(f, r#"Run target "{target}" does not match any definition."#)
      }
      ErrorKind::MissingDefinition { path } => {
        write!(f, r#"No resolved identifier recorded for definition "{path}"."#)
      }
      ErrorKind::MissingReferentialId { path } => {
        write!(f, r#"No referential id recorded for object module "{path}"."#)
      }
      ErrorKind::UnresolvedRequire { module, target } => write!(
        f,
        r#"require("{target}") in module "{module}" has no resolved replacement."#
      ),
      ErrorKind::NamePoolExhausted { capacity } => write!(
        f,
        "Identifier pool exhausted: the bundle needs more than {capacity} names."
      ),
      ErrorKind::ParseJsFailed { source_file, .. } => {
        write!(f, "Parse failed: {}", source_file.name)
      }
      ErrorKind::Panic { source } => source.fmt(f),
    }
  }
}

impl ErrorKind {
  pub fn code(&self) -> &'static str {
    match self {
      ErrorKind::UnresolvedDependency { .. } => error_code::UNRESOLVED_DEPENDENCY,
      ErrorKind::MissingDependencies { .. } => error_code::MISSING_DEPENDENCIES,
      ErrorKind::IncompleteFinalization { .. } => error_code::INCOMPLETE_FINALIZATION,
      ErrorKind::UnresolvedRunTarget { .. } => error_code::UNRESOLVED_RUN_TARGET,
      ErrorKind::MissingDefinition { .. } => error_code::MISSING_DEFINITION,
      ErrorKind::MissingReferentialId { .. } => error_code::MISSING_REFERENTIAL_ID,
      ErrorKind::UnresolvedRequire { .. } => error_code::UNRESOLVED_REQUIRE,
      ErrorKind::NamePoolExhausted { .. } => error_code::NAME_POOL_EXHAUSTED,
      ErrorKind::ParseJsFailed { .. } => error_code::PARSE_JS_FAILED,
      ErrorKind::Panic { .. } => error_code::PANIC,
    }
  }
}
