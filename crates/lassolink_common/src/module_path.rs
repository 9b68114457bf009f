use std::fmt::Display;

use swc_core::ecma::atoms::JsWord;

/// A path in the module registration namespace, e.g. `/foo$1.0.0/lib/index`
/// or `/@scope/pkg$2.1.0/main`. Builtin shims are registered under bare
/// names such as `stream`.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct ModulePath(JsWord);

impl ModulePath {
  pub fn new(value: impl Into<JsWord>) -> Self {
    Self(value.into())
  }

  pub fn value(&self) -> &JsWord {
    &self.0
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The `name$version` token. For scoped packages this is the second
  /// path segment: `pkg$1.0.0` in `/@scope/pkg$1.0.0/lib/file`.
  pub fn package_token(&self) -> &str {
    let trimmed = self.0.trim_start_matches('/');
    let mut segments = trimmed.split('/');
    let first = segments.next().unwrap_or(trimmed);
    if first.starts_with('@') {
      segments.next().unwrap_or(first)
    } else {
      first
    }
  }

  /// The key used in the installed table: `name$version` for plain
  /// packages, `@scope/name$version` for scoped ones.
  pub fn package_identity(&self) -> &str {
    let trimmed = self.0.trim_start_matches('/');
    let boundary = if trimmed.starts_with('@') {
      trimmed.match_indices('/').nth(1).map(|(i, _)| i)
    } else {
      trimmed.find('/')
    };
    match boundary {
      Some(i) => &trimmed[..i],
      None => trimmed,
    }
  }

  /// Package name without the version suffix, scope included.
  pub fn package_name(&self) -> &str {
    let identity = self.package_identity();
    match identity.split_once('$') {
      Some((name, _)) => name,
      None => identity,
    }
  }

  /// The version baked into the path, if any. Bare builtin names like
  /// `stream` carry none.
  pub fn requested_version(&self) -> Option<&str> {
    self.package_token().split_once('$').map(|(_, version)| version)
  }
}

impl Display for ModulePath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<JsWord> for ModulePath {
  fn from(value: JsWord) -> Self {
    Self(value)
  }
}

impl AsRef<str> for ModulePath {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_package_segments() {
    let path = ModulePath::new("/foo$1.0.0/lib/index");
    assert_eq!(path.package_token(), "foo$1.0.0");
    assert_eq!(path.package_identity(), "foo$1.0.0");
    assert_eq!(path.package_name(), "foo");
    assert_eq!(path.requested_version(), Some("1.0.0"));
  }

  #[test]
  fn scoped_package_segments() {
    let path = ModulePath::new("/@scope/pkg$2.1.0/lib/file");
    assert_eq!(path.package_token(), "pkg$2.1.0");
    assert_eq!(path.package_identity(), "@scope/pkg$2.1.0");
    assert_eq!(path.package_name(), "@scope/pkg");
    assert_eq!(path.requested_version(), Some("2.1.0"));
  }

  #[test]
  fn package_root_has_no_trailing_segments() {
    let path = ModulePath::new("/foo$1.0.0");
    assert_eq!(path.package_token(), "foo$1.0.0");
    assert_eq!(path.package_identity(), "foo$1.0.0");
  }

  #[test]
  fn bare_builtin_name() {
    let path = ModulePath::new("stream");
    assert_eq!(path.package_token(), "stream");
    assert_eq!(path.package_identity(), "stream");
    assert_eq!(path.package_name(), "stream");
    assert_eq!(path.requested_version(), None);
  }

  #[test]
  fn unversioned_path() {
    let path = ModulePath::new("/app/src/main");
    assert_eq!(path.package_token(), "app");
    assert_eq!(path.package_name(), "app");
    assert_eq!(path.requested_version(), None);
  }
}
