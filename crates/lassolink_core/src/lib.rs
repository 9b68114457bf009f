use std::sync::Arc;

mod linker;
pub use linker::*;
mod options;
pub use options::*;
mod resolve;
pub use resolve::*;

use once_cell::sync::Lazy;
use swc_core::common::{FilePathMapping, Globals, SourceMap};

pub(crate) static SOURCE_MAP: Lazy<Arc<SourceMap>> =
  Lazy::new(|| Arc::new(SourceMap::new(FilePathMapping::empty())));

pub(crate) static COMPILER: Lazy<Arc<lassolink_compiler::Compiler>> = Lazy::new(|| {
  let cm = SOURCE_MAP.clone();
  let compiler = lassolink_compiler::Compiler::with_cm(cm);
  Arc::new(compiler)
});

pub(crate) static SWC_GLOBALS: Lazy<Arc<Globals>> = Lazy::new(|| Arc::new(Globals::new()));

// public exports

pub type LinkResult<T> = lassolink_error::Result<T>;
pub type LinkError = lassolink_error::Error;
