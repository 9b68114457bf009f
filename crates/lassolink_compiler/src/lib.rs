use std::{path::PathBuf, sync::Arc};

use ast::EsVersion;
use swc_common::{
  errors::{ColorConfig, Handler},
  FileName, SourceMap,
};
use swc_core::{
  common::{self as swc_common, SourceFile},
  ecma::{
    ast, codegen as swc_ecma_codegen,
    parser::{self as swc_ecma_parser, PResult},
  },
};
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};

#[derive(Default)]
pub struct Compiler {
  pub cm: Arc<SourceMap>,
}

impl Compiler {
  pub fn with_cm(cm: Arc<SourceMap>) -> Self {
    Self { cm }
  }

  pub fn create_source_file(&self, filename: PathBuf, code: String) -> Arc<SourceFile> {
    self.cm.new_source_file(FileName::Real(filename), code)
  }

  pub fn print_script(&self, ast: &ast::Script) -> anyhow::Result<String> {
    let mut output = Vec::new();

    let mut emitter = swc_ecma_codegen::Emitter {
      cfg: swc_ecma_codegen::Config {
        ..Default::default()
      },
      cm: self.cm.clone(),
      comments: None,
      wr: Box::new(JsWriter::new(self.cm.clone(), "\n", &mut output, None)),
    };

    emitter.emit_script(ast)?;
    String::from_utf8(output).map_err(Into::into)
  }

  /// Bundled sources predate ES modules, so the input is always parsed as
  /// a script.
  pub fn parse_script(&self, source_file: Arc<SourceFile>) -> PResult<ast::Script> {
    let handler = Handler::with_tty_emitter(ColorConfig::Auto, true, false, Some(self.cm.clone()));

    let lexer = Lexer::new(
      Syntax::Es(Default::default()),
      EsVersion::latest(),
      StringInput::from(source_file.as_ref()),
      None,
    );
    let mut parser = Parser::new_from(lexer);
    let result = parser.parse_script();
    parser.take_errors().into_iter().for_each(|e| {
      e.into_diagnostic(&handler).emit();
    });
    result
  }
}
