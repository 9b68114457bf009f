use std::collections::VecDeque;

use once_cell::sync::Lazy;
use phf::{phf_set, Set};
use swc_core::ecma::atoms::JsWord;

pub static RESERVED_NAMES: Set<&'static str> = phf_set! {
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "eval",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "NaN",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "undefined",
    "var",
    "void",
    "while",
    "with",
    "yield",
};

fn starts_with_digit(s: &str) -> bool {
  s.chars().next().map_or(false, |c| c.is_ascii_digit())
}

fn need_escape(s: &str) -> bool {
  starts_with_digit(s) || RESERVED_NAMES.contains(s) || s == "arguments"
}

static ILLEGAL_CHARACTERS: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r"[^\w$]").unwrap());

/// Turns a module path into a stable legal identifier. `/` becomes `__`,
/// `@` becomes `9999` and the remaining separator characters collapse to
/// `_`, so `/foo$1.0.0/lib/index` maps to `__foo_1_0_0__lib__index`.
pub fn derive_var_name(path: &str) -> JsWord {
  let mut out = String::with_capacity(path.len() + path.matches('/').count());
  for ch in path.chars() {
    match ch {
      '/' => out.push_str("__"),
      '@' => out.push_str("9999"),
      '$' | '.' | '-' | '[' | ']' => out.push('_'),
      _ => out.push(ch),
    }
  }
  make_legal(&out).into()
}

pub fn make_legal(value: &str) -> String {
  let value = ILLEGAL_CHARACTERS.replace_all(value, "_");

  let ret = if need_escape(&value) {
    format!("_{}", value)
  } else {
    value.to_string()
  };

  if ret != value {
    tracing::warn!("illegal identifier: {}, replaced with {}", value, ret);
  }

  ret
}

const LEAD_CHARS: &str = "_$abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const TAIL_CHARS: &str = "_$abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A pre-computed pool of short identifiers handed out in order, shortest
/// first. Lead characters never use digits; reserved words are skipped.
#[derive(Debug)]
pub struct NamePool {
  names: VecDeque<JsWord>,
  capacity: usize,
}

impl NamePool {
  /// Generates every candidate of length `1..=group_size`.
  pub fn with_group_size(group_size: usize) -> Self {
    let mut names = VecDeque::new();
    let mut prefixes = vec![String::new()];
    for _ in 0..group_size {
      let mut widened = Vec::new();
      for prefix in &prefixes {
        let alphabet = if prefix.is_empty() {
          LEAD_CHARS
        } else {
          TAIL_CHARS
        };
        for ch in alphabet.chars() {
          let mut name = prefix.clone();
          name.push(ch);
          widened.push(name);
        }
      }
      for name in &widened {
        if !RESERVED_NAMES.contains(name.as_str()) {
          names.push_back(JsWord::from(name.as_str()));
        }
      }
      prefixes = widened;
    }
    let capacity = names.len();
    Self { names, capacity }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn next_name(&mut self) -> Option<JsWord> {
    self.names.pop_front()
  }
}

/// How finalized definitions get their identifiers.
#[derive(Debug)]
pub enum NameSource {
  /// Path-derived names, stable across runs.
  Derived,
  /// Short pooled names handed out in registration order.
  Pool(NamePool),
}

impl NameSource {
  pub fn name_for(&mut self, path: &str) -> Option<JsWord> {
    match self {
      NameSource::Derived => Some(derive_var_name(path)),
      NameSource::Pool(pool) => pool.next_name(),
    }
  }

  pub fn capacity(&self) -> Option<usize> {
    match self {
      NameSource::Derived => None,
      NameSource::Pool(pool) => Some(pool.capacity()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derives_stable_names() {
    assert_eq!(&*derive_var_name("/foo$1.0.0/lib/index"), "__foo_1_0_0__lib__index");
    assert_eq!(
      &*derive_var_name("/@scope/pkg$2.1.0/main"),
      "__9999scope__pkg_2_1_0__main"
    );
    assert_eq!(&*derive_var_name("stream"), "stream");
  }

  #[test]
  fn legalizes_residual_characters() {
    assert_eq!(&*derive_var_name("/weird pkg$1.0.0/a"), "__weird_pkg_1_0_0__a");
  }

  #[test]
  fn escapes_reserved_words() {
    assert_eq!(make_legal("do"), "_do");
    assert_eq!(make_legal("arguments"), "_arguments");
    assert_eq!(make_legal("fine"), "fine");
  }

  #[test]
  fn pool_hands_out_shortest_first() {
    let mut pool = NamePool::with_group_size(1);
    assert_eq!(pool.capacity(), 54);
    assert_eq!(pool.next_name().as_deref(), Some("_"));
    assert_eq!(pool.next_name().as_deref(), Some("$"));
    assert_eq!(pool.next_name().as_deref(), Some("a"));
  }

  #[test]
  fn pool_skips_reserved_words() {
    let mut pool = NamePool::with_group_size(2);
    // 54 one-char names, 54 * 64 two-char names, minus "do", "if" and "in".
    assert_eq!(pool.capacity(), 54 + 54 * 64 - 3);
    let mut seen = Vec::new();
    while let Some(name) = pool.next_name() {
      seen.push(name);
    }
    assert!(seen.iter().all(|name| !RESERVED_NAMES.contains(&**name)));
    assert!(seen.iter().any(|name| &**name == "dn"));
    assert!(!seen.iter().any(|name| &**name == "do"));
  }

  #[test]
  fn pool_exhausts_loudly() {
    let mut pool = NamePool::with_group_size(1);
    for _ in 0..54 {
      assert!(pool.next_name().is_some());
    }
    assert_eq!(pool.next_name(), None);
  }
}
