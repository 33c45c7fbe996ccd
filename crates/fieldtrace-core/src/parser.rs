//! Parser module for JavaScript/TypeScript source code
//!
//! Integrates with SWC for parsing source files into AST. Comments are
//! collected alongside the AST because tracking roots are designated by
//! leading line comments.

use swc_common::comments::SingleThreadedComments;
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_parser::{
    EsSyntax, StringInput, Syntax, TsSyntax, lexer::Lexer, parse_file_as_module,
};

pub use swc_ecma_ast::{EsVersion, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

pub fn detect_language(filename: &str) -> Language {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "jsx" => Language::Jsx,
        _ => Language::JavaScript,
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub span_lo: u32,
    pub span_hi: u32,
    pub message: String,
}

#[derive(Debug)]
pub struct ParseResult {
    pub module: Option<Module>,
    pub comments: SingleThreadedComments,
    pub errors: Vec<ParseError>,
}

pub struct ParsedFile {
    ast_module: Option<Module>,
    comments: SingleThreadedComments,
    errors: Vec<ParseError>,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("has_module", &self.ast_module.is_some())
            .field("error_count", &self.errors.len())
            .finish()
    }
}

impl ParsedFile {
    pub fn from_source(filename: &str, source: &str) -> Self {
        let parser = Parser::for_file(filename);
        let parse_result = parser.parse_module_recovering(source);

        Self {
            ast_module: parse_result.module,
            comments: parse_result.comments,
            errors: parse_result.errors,
        }
    }

    pub fn module(&self) -> Option<&Module> {
        self.ast_module.as_ref()
    }

    pub fn comments(&self) -> &SingleThreadedComments {
        &self.comments
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    jsx: bool,
    typescript: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jsx(mut self, enabled: bool) -> Self {
        self.jsx = enabled;
        self
    }

    pub fn typescript(mut self, enabled: bool) -> Self {
        self.typescript = enabled;
        self
    }

    pub fn build(self) -> Parser {
        let syntax = if self.typescript {
            Syntax::Typescript(TsSyntax {
                tsx: self.jsx,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.jsx,
                ..Default::default()
            })
        };

        Parser { syntax }
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
        }
    }

    pub fn for_file(filename: &str) -> Self {
        match detect_language(filename) {
            Language::JavaScript | Language::Jsx => Self::builder().jsx(true).build(),
            Language::TypeScript => Self::builder().typescript(true).build(),
            Language::Tsx => Self::builder().typescript(true).jsx(true).build(),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn parse_module(&self, code: &str) -> Result<Module, ParseError> {
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map
            .new_source_file(FileName::Custom("input.js".into()).into(), code.to_string());

        let lexer = Lexer::new(
            self.syntax,
            Default::default(),
            StringInput::from(&*fm),
            None,
        );

        let mut parser = swc_ecma_parser::Parser::new_from(lexer);

        parser.parse_module().map_err(|e| {
            let span = e.span();
            let loc = source_map.lookup_char_pos(span.lo);
            ParseError {
                line: loc.line,
                column: loc.col_display,
                span_lo: span.lo.0,
                span_hi: span.hi.0,
                message: e.kind().msg().to_string(),
            }
        })
    }

    pub fn parse_module_recovering(&self, code: &str) -> ParseResult {
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map
            .new_source_file(FileName::Custom("input.js".into()).into(), code.to_string());

        let comments = SingleThreadedComments::default();
        let mut recovered_errors = Vec::new();

        let result = parse_file_as_module(
            &fm,
            self.syntax,
            EsVersion::latest(),
            Some(&comments),
            &mut recovered_errors,
        );

        let errors: Vec<ParseError> = recovered_errors
            .into_iter()
            .map(|e| {
                let span = e.span();
                let loc = source_map.lookup_char_pos(span.lo);
                ParseError {
                    line: loc.line,
                    column: loc.col_display,
                    span_lo: span.lo.0,
                    span_hi: span.hi.0,
                    message: e.kind().msg().to_string(),
                }
            })
            .collect();

        match result {
            Ok(module) => ParseResult {
                module: Some(module),
                comments,
                errors,
            },
            Err(e) => {
                let span = e.span();
                let loc = source_map.lookup_char_pos(span.lo);
                let fatal_error = ParseError {
                    line: loc.line,
                    column: loc.col_display,
                    span_lo: span.lo.0,
                    span_hi: span.hi.0,
                    message: e.kind().msg().to_string(),
                };
                let mut all_errors = errors;
                all_errors.push(fatal_error);
                ParseResult {
                    module: None,
                    comments,
                    errors: all_errors,
                }
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
