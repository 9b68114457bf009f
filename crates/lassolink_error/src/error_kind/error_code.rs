pub const UNRESOLVED_DEPENDENCY: &str = "UNRESOLVED_DEPENDENCY";
pub const MISSING_DEPENDENCIES: &str = "MISSING_DEPENDENCIES";
pub const INCOMPLETE_FINALIZATION: &str = "INCOMPLETE_FINALIZATION";
pub const UNRESOLVED_RUN_TARGET: &str = "UNRESOLVED_RUN_TARGET";
pub const MISSING_DEFINITION: &str = "MISSING_DEFINITION";
pub const MISSING_REFERENTIAL_ID: &str = "MISSING_REFERENTIAL_ID";
pub const UNRESOLVED_REQUIRE: &str = "UNRESOLVED_REQUIRE";
pub const NAME_POOL_EXHAUSTED: &str = "NAME_POOL_EXHAUSTED";
pub const PARSE_JS_FAILED: &str = "PARSE_JS_FAILED";
pub const PANIC: &str = "PANIC";
