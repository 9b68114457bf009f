mod optimizer;
pub use {
  lassolink_core::{InputOptions, NameStrategy, OutputOptions, OutputUnit, SourceUnit},
  optimizer::Optimizer,
};
