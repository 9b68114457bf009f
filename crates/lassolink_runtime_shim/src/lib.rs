const CLIENT_SNIPPET: &str = include_str!("./snippets/client.js");
const NS_PLACEHOLDER: &str = "__NS__";

/// Renders the self-contained client runtime with its namespace variable
/// substituted in.
pub fn render_client(ns_var: &str) -> String {
  CLIENT_SNIPPET.replace(NS_PLACEHOLDER, ns_var)
}

/// Wraps the first output unit: the client runtime goes first, then a
/// top-level `run` binding, then the rewritten code. Later units share the
/// namespace through `window` and need no wrapping.
pub fn wrap_entry(ns_var: &str, code: &str) -> String {
  format!(
    "{}\nvar run = window.{}.run;\n{}",
    render_client(ns_var),
    ns_var,
    code
  )
}
