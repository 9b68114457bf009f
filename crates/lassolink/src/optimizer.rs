use lassolink_core::{link, InputOptions, OutputOptions, OutputUnit, SourceUnit};

pub struct Optimizer {
  input_options: InputOptions,
}

impl Optimizer {
  pub fn new(input_options: InputOptions) -> Self {
    lassolink_tracing::init();
    Self { input_options }
  }

  /// Optimizes a single script. On any fatal error the original source
  /// is returned untouched, so the caller always has something to ship.
  pub fn optimize(&self, name: &str, code: &str, output_options: &OutputOptions) -> String {
    let units = [SourceUnit::new(name, code)];
    match link(&self.input_options, output_options, &units) {
      Ok(mut outputs) => match outputs.pop() {
        Some(output) => output.code,
        None => code.to_string(),
      },
      Err(error) => {
        tracing::error!("optimization of {} failed, keeping original: {}", name, error);
        code.to_string()
      }
    }
  }

  /// Optimizes a batch of scripts that register modules into one shared
  /// registry. The batch falls back as a whole: a fatal error in any
  /// unit returns every original untouched.
  pub fn optimize_files(
    &self,
    units: Vec<SourceUnit>,
    output_options: &OutputOptions,
  ) -> Vec<OutputUnit> {
    match link(&self.input_options, output_options, &units) {
      Ok(outputs) => outputs,
      Err(error) => {
        tracing::error!("optimization failed, keeping originals: {}", error);
        units
          .into_iter()
          .map(|unit| OutputUnit {
            name: unit.name,
            code: unit.code,
          })
          .collect()
      }
    }
  }
}
