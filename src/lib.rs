//! detype: TypeScript to JavaScript by span edits
//!
//! detype turns TypeScript source into plain JavaScript without rebuilding
//! the text from a tree. The file is parsed and bound, a planner schedules
//! edits against the original text (remove a type annotation, rewrite an enum
//! into its closure idiom, qualify a reference to an import), and the edits
//! are applied in one sweep. Everything the transform does not touch keeps
//! its formatting and comments.
//!
//! # Quick Start
//!
//! ```
//! let js = detype::transpile("let x: number = 1;").unwrap();
//! assert_eq!(js, "let x = 1;");
//! ```
//!
//! # Module Overview
//!
//! The pipeline flows: Source → [`lexer`] → [`parser`] → [`binder`] →
//! [`transform`] (planner, transformers, resolver, applier) → JavaScript
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Front end** | [`lexer`], [`parser`], [`ast`], [`binder`] |
//! | **Transform** | [`transform`] |
//! | **Programs** | [`program`], [`driver`], [`tsconfig`] |
//! | **Configuration** | [`options`], [`error`](Error) |

#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_match)]
#![allow(clippy::too_many_arguments)]

pub mod ast;
pub mod binder;
pub mod driver;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod program;
pub mod transform;
pub mod tsconfig;

mod error;

pub use error::{Diagnostic, Error, Result, SourceLocation};
pub use options::{JsTarget, ModuleKind, RemovalMode, TranspileOptions};
pub use program::Program;
pub use transform::TranspileOutput;

use ast::Ast;
use binder::Binder;

/// Version of detype
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Transpile TypeScript source with the default options
pub fn transpile(source: &str) -> Result<String> {
    transpile_with_options(source, &TranspileOptions::default()).map(|output| output.code)
}

/// Transpile TypeScript source
pub fn transpile_with_options(source: &str, options: &TranspileOptions) -> Result<TranspileOutput> {
    let (ast, binder) = analyze(source)?;
    Ok(transform::transpile_ast(&ast, &binder, options, None))
}

/// Parse and bind only, returning the syntax diagnostics
pub fn check(source: &str) -> Result<Vec<Diagnostic>> {
    let ast = parser::parse(source).map_err(|e| e.with_source_context(source))?;
    let binder = Binder::bind(&ast);
    Ok(binder.syntax_diagnostics().to_vec())
}

/// Parse and bind a file; any syntax diagnostic is an error
pub(crate) fn analyze(source: &str) -> Result<(Ast, Binder)> {
    let ast = parser::parse(source).map_err(|e| e.with_source_context(source))?;
    let binder = Binder::bind(&ast);
    if let Some(first) = binder.syntax_diagnostics().first() {
        return Err(Error::parse_error_with_context(
            first.message.clone(),
            first.location,
            source,
        ));
    }
    tracing::debug!(nodes = ast.len(), "parsed and bound");
    Ok((ast, binder))
}
