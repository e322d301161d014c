//! TSX to JavaScript for the live preview.
//!
//! Parse as TSX, strip the type layer, lower JSX with the classic runtime
//! (`React.createElement`), then print. Each call gets its own `SourceMap`
//! and `Globals`, so marks and spans never cross requests.

use swc_core::common::comments::SingleThreadedComments;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceMap, Spanned, GLOBALS};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config, Emitter};
use swc_core::ecma::parser::error::Error as ParseError;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{Parser, StringInput, Syntax, TsConfig};
use swc_core::ecma::transforms::react::{react, Options as ReactOptions, Runtime};
use swc_core::ecma::transforms::typescript::strip;
use swc_core::ecma::visit::FoldWith;

use super::Compiler;
use crate::VectraError;

const SOURCE_NAME: &str = "component.tsx";

/// Compiles one TSX module to JavaScript.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsxCompiler;

impl Compiler for TsxCompiler {
    fn compile(&self, source: &str) -> Result<String, VectraError> {
        let cm: Lrc<SourceMap> = Default::default();
        let globals = Globals::new();
        GLOBALS.set(&globals, || transpile(&cm, source))
    }
}

fn transpile(cm: &Lrc<SourceMap>, source: &str) -> Result<String, VectraError> {
    let comments = SingleThreadedComments::default();
    let fm = cm.new_source_file(FileName::Custom(SOURCE_NAME.into()), source.to_string());

    let syntax = Syntax::Typescript(TsConfig {
        tsx: true,
        decorators: true,
        ..Default::default()
    });
    let lexer = Lexer::new(syntax, Default::default(), StringInput::from(&*fm), Some(&comments));
    let mut parser = Parser::new_from(lexer);

    let program = parser
        .parse_program()
        .map_err(|e| parse_error(cm, &e))?;
    // Recovered errors still mean the input was not valid TSX.
    if let Some(e) = parser.take_errors().first() {
        return Err(parse_error(cm, e));
    }

    let top_level_mark = Mark::new();
    let unresolved_mark = Mark::new();
    let program = program.fold_with(&mut strip(top_level_mark));
    let program = program.fold_with(&mut react::<SingleThreadedComments>(
        cm.clone(),
        Some(comments.clone()),
        ReactOptions {
            runtime: Some(Runtime::Classic),
            ..Default::default()
        },
        top_level_mark,
        unresolved_mark,
    ));

    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: Config { minify: false, ..Config::default() },
            cm: cm.clone(),
            comments: Some(&comments),
            wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
        };
        emitter
            .emit_program(&program)
            .map_err(|e| VectraError::Compile(format!("emit failed: {}", e)))?;
    }

    let js = String::from_utf8(buf)
        .map_err(|e| VectraError::Compile(format!("emitted invalid UTF-8: {}", e)))?;
    tracing::trace!(input = source.len(), output = js.len(), "tsx compiled");
    Ok(js)
}

fn parse_error(cm: &SourceMap, e: &ParseError) -> VectraError {
    let loc = cm.lookup_char_pos(e.span().lo);
    VectraError::Compile(format!(
        "{}:{}:{}: {}",
        SOURCE_NAME,
        loc.line,
        loc.col.0 + 1,
        e.kind().msg()
    ))
}
