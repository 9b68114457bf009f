mod classify;
pub use classify::*;
mod resolve;
pub use resolve::*;
mod scan;
pub use scan::*;
mod rewrite;
pub use rewrite::*;
