mod module_path;
pub use module_path::*;
mod names;
pub use names::*;
mod registry;
pub use registry::*;
