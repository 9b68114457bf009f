use lassolink::{InputOptions, NameStrategy, Optimizer, OutputOptions};

fn plain_output() -> OutputOptions {
  OutputOptions {
    inject_client: false,
    strip_loader_metadata: false,
  }
}

fn optimize(code: &str) -> String {
  Optimizer::new(InputOptions::default()).optimize("page.js", code, &plain_output())
}

#[test]
fn links_two_packages_end_to_end() {
  let source = r#"$_mod.installed("app$1.0.0", "widget", "2.0.0");
$_mod.main("/widget$2.0.0", "lib/index");
$_mod.def("/widget$2.0.0/lib/index", function(require, exports, module, __filename, __dirname) {
    exports.render = function() {
        return "widget";
    };
});
$_mod.def("/app$1.0.0/main", function(require, exports, module, __filename, __dirname) {
    var widget = require('/widget$2.0.0');
    widget.render();
});
$_mod.run("/app$1.0.0/main");
"#;

  let out = optimize(source);
  assert!(out.contains(
    "function __widget_2_0_0__lib__index(require, exports, module, __filename, __dirname)"
  ));
  assert!(out.contains("function __app_1_0_0__main("));
  assert!(out.contains("require(__widget_2_0_0__lib__index)"));
  assert!(out.contains("run(__app_1_0_0__main)"));
  assert!(!out.contains("$_mod"));
}

#[test]
fn removes_administrative_calls() {
  let source = r#"$_mod.remap("/app$1.0.0/env", "/app$1.0.0/env-browser");
$_mod.builtin("stream", "/stream-browserify$2.0.2/index");
$_mod.searchPath("/node_modules/");
$_mod.def("/app$1.0.0/env-browser", function(require, exports, module) {
    exports.browser = true;
});
keepMe();
"#;

  let out = optimize(source);
  assert!(out.contains("function __app_1_0_0__env_browser("));
  assert!(out.contains("keepMe();"));
  assert!(!out.contains("remap("));
  assert!(!out.contains("builtin("));
  assert!(!out.contains("searchPath("));
}

#[test]
fn falls_back_on_unresolved_dependency() {
  let source = r#"$_mod.def("/app$1.0.0/main", function(require, exports, module) {
    var missing = require('/ghost$1.0.0/nothing');
});
"#;

  let out = optimize(source);
  assert_eq!(out, source);
}

#[test]
fn falls_back_on_parse_error() {
  let source = "){";
  let out = optimize(source);
  assert_eq!(out, source);
}

#[test]
fn links_scoped_packages() {
  let source = r#"$_mod.installed("app$1.0.0", "@scope/kit", "3.1.4");
$_mod.def("/@scope/kit$3.1.4/main", function(require, exports, module) {
    exports.kit = true;
});
$_mod.def("/app$1.0.0/main", function(require, exports, module) {
    require('/@scope/kit$3.1.4/main');
});
"#;

  let out = optimize(source);
  assert!(out.contains("function __9999scope__kit_3_1_4__main("));
  assert!(out.contains("require(__9999scope__kit_3_1_4__main)"));
}

#[test]
fn object_definitions_use_referential_ids() {
  let source = r#"$_mod.def("/cfg$1.0.0/settings", { "theme": "dark" });
$_mod.def("/app$1.0.0/main", function(require, exports, module) {
    var settings = require('/cfg$1.0.0/settings');
});
"#;

  let out = optimize(source);
  assert!(out.contains("var __cfg_1_0_0__settings = {"));
  assert!(out.contains(r#"require(__cfg_1_0_0__settings, "_o0")"#));
}

#[test]
fn rewrites_require_resolve() {
  let source = r#"$_mod.def("/util$1.0.0/index", function(require, exports, module) {
    exports.u = 1;
});
$_mod.def("/cfg$1.0.0/data", { "k": 1 });
$_mod.def("/app$1.0.0/main", function(require, exports, module) {
    var fnPath = require.resolve('/util$1.0.0/index');
    var objPath = require.resolve('/cfg$1.0.0/data');
});
"#;

  let out = optimize(source);
  assert!(out.contains("var fnPath = __util_1_0_0__index.name;"));
  assert!(out.contains(r#"var objPath = "_o0";"#));
}

#[test]
fn run_entries_invoke_directly() {
  let source = r#"$_mod.def("/app$1.0.0/main", function(require, exports, module) {});
$_mod.run("/app$1.0.0/main", { "wait": !1 });
"#;

  let out = optimize(source);
  assert!(out.contains("run(__app_1_0_0__main, {"));
  assert!(!out.contains("$_mod.run"));
}

#[test]
fn string_run_options_resolve_to_a_second_module() {
  let source = r#"$_mod.def("/app$1.0.0/init", function(require, exports, module) {});
$_mod.def("/app$1.0.0/extra", function(require, exports, module) {});
$_mod.run("/app$1.0.0/init", "/app$1.0.0/extra");
"#;

  let out = optimize(source);
  assert!(out.contains("run(__app_1_0_0__init, __app_1_0_0__extra)"));
}

#[test]
fn injected_client_wraps_the_output() {
  let source = r#"$_mod.def("/app$1.0.0/main", function(require, exports, module) {});
$_mod.run("/app$1.0.0/main");
"#;

  let out = Optimizer::new(InputOptions::default()).optimize(
    "page.js",
    source,
    &OutputOptions::default(),
  );
  assert!(out.starts_with("!(function(win) {"));
  assert!(out.contains("var run = window.$_mod.run;"));
  assert!(out.contains("win.$_mod = $_mod"));
  assert!(out.contains("run(__app_1_0_0__main)"));
}

#[test]
fn namespace_suffix_isolates_the_client() {
  let source = r#"$_mod.def("/app$1.0.0/main", function(require, exports, module) {});
$_mod.run("/app$1.0.0/main");
"#;

  let input = InputOptions {
    ns_suffix: Some("gh_fe".to_string()),
    ..Default::default()
  };
  let out = Optimizer::new(input).optimize("page.js", source, &OutputOptions::default());
  assert!(out.contains("var run = window.$_mod_gh_fe.run;"));
  assert!(out.contains("win.$_mod_gh_fe = $_mod_gh_fe"));
}

#[test]
fn detected_bootstrap_is_replaced_and_its_namespace_reused() {
  let source = r#"!(function(win) {
    var $_mod_ext = { stub: true };
    if (win) {
        win.$_mod_ext = $_mod_ext;
    } else {
        module.exports = $_mod_ext;
    }
})(window);
$_mod_ext.def("/app$1.0.0/main", function(require, exports, module) {});
$_mod_ext.run("/app$1.0.0/main");
"#;

  let out = Optimizer::new(InputOptions::default()).optimize(
    "page.js",
    source,
    &OutputOptions::default(),
  );
  assert!(!out.contains("stub"));
  assert!(out.contains("var run = window.$_mod_ext.run;"));
  assert!(out.contains("run(__app_1_0_0__main)"));
}

#[test]
fn loader_metadata_is_kept_by_default() {
  let source = r#"$_mod.def("/app$1.0.0/main", function(require, exports, module) {});
$_mod.loaderMetadata({ "about": { "css": ["/about.css"], "js": ["/about.js"] } });
"#;

  let out = optimize(source);
  assert!(out.contains("$_mod.loaderMetadata({"));

  let stripping = OutputOptions {
    inject_client: false,
    strip_loader_metadata: true,
  };
  let stripped =
    Optimizer::new(InputOptions::default()).optimize("page.js", source, &stripping);
  assert!(!stripped.contains("loaderMetadata"));
}

#[test]
fn pooled_names_are_handed_out_in_registration_order() {
  let source = r#"$_mod.def("/app$1.0.0/first", function(require, exports, module) {});
$_mod.def("/app$1.0.0/second", function(require, exports, module) {
    require('/app$1.0.0/first');
});
"#;

  let input = InputOptions {
    name_strategy: NameStrategy::Pooled { group_size: 2 },
    ..Default::default()
  };
  let out = Optimizer::new(input).optimize("page.js", source, &plain_output());
  assert!(out.contains("function _(require"));
  assert!(out.contains("function $(require"));
  assert!(out.contains("require(_)"));
}

#[test]
fn an_exhausted_name_pool_falls_back() {
  let mut source = String::new();
  for i in 0..60 {
    source.push_str(&format!(
      "$_mod.def(\"/app$1.0.0/m{}\", function(require, exports, module) {{}});\n",
      i
    ));
  }

  let input = InputOptions {
    name_strategy: NameStrategy::Pooled { group_size: 1 },
    ..Default::default()
  };
  let out = Optimizer::new(input).optimize("page.js", &source, &plain_output());
  assert_eq!(out, source);
}

#[test]
fn duplicate_definitions_rewrite_to_one_name() {
  let source = r#"$_mod.def("/app$1.0.0/dup", function(require, exports, module) {
    exports.v = 1;
});
$_mod.def("/app$1.0.0/dup", function(require, exports, module) {
    exports.v = 2;
});
"#;

  let out = optimize(source);
  assert_eq!(out.matches("function __app_1_0_0__dup(").count(), 2);
  assert!(out.contains("exports.v = 2;"));
}
