//! Multi-file programs
//!
//! A [`Program`] parses and binds every file up front, in parallel. The
//! parsed files are then shared read-only by the per-file transforms, which
//! use them to inline `const enum` members declared in other files.

use std::fs;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::ast::Ast;
use crate::binder::{Binder, ConstValue, SymbolFlags, SymbolId};
use crate::error::{Error, Result};
use crate::options::TranspileOptions;
use crate::transform::{self, EnumLookup, EnumReference, TranspileOutput};

struct ProgramFile {
    path: PathBuf,
    analyzed: Result<(Ast, Binder)>,
}

/// A set of files transpiled together
pub struct Program {
    files: Vec<ProgramFile>,
    /// Normalized path to file index
    index: FxHashMap<PathBuf, usize>,
}

impl Program {
    /// Parse and bind `(path, source)` pairs
    pub fn new(files: Vec<(PathBuf, String)>) -> Self {
        Self::analyze_all(files.into_iter().map(|(path, source)| (path, Ok(source))).collect())
    }

    /// Read and analyze files from disk; a file that cannot be read is
    /// recorded as a failure like one that does not parse
    pub fn from_paths(paths: &[PathBuf]) -> Self {
        let sources = paths
            .iter()
            .map(|path| (path.clone(), fs::read_to_string(path).map_err(Error::from)))
            .collect();
        Self::analyze_all(sources)
    }

    fn analyze_all(sources: Vec<(PathBuf, Result<String>)>) -> Self {
        let files: Vec<ProgramFile> = sources
            .into_par_iter()
            .map(|(path, source)| {
                let analyzed = source.and_then(|source| crate::analyze(&source));
                match &analyzed {
                    Ok(_) => tracing::debug!(path = %path.display(), "parsed"),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping file"),
                }
                ProgramFile { path, analyzed }
            })
            .collect();
        let index = files
            .iter()
            .enumerate()
            .map(|(i, file)| (normalize(&file.path), i))
            .collect();
        Self { files, index }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }

    /// Transpile every file in parallel, in input order
    pub fn transpile_all(
        &self,
        options: &TranspileOptions,
    ) -> Vec<(PathBuf, Result<TranspileOutput>)> {
        self.files
            .par_iter()
            .map(|file| {
                let result = match &file.analyzed {
                    Ok((ast, binder)) => {
                        let view = ProgramView {
                            program: self,
                            file: &file.path,
                        };
                        let output = transform::transpile_ast(ast, binder, options, Some(&view));
                        tracing::debug!(
                            path = %file.path.display(),
                            bytes = output.code.len(),
                            "transpiled"
                        );
                        Ok(output)
                    }
                    Err(e) => Err(e.clone()),
                };
                (file.path.clone(), result)
            })
            .collect()
    }

    /// Files that could not be read, parsed or bound, with their error
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &Error)> {
        self.files.iter().filter_map(|file| match &file.analyzed {
            Ok(_) => None,
            Err(e) => Some((file.path.as_path(), e)),
        })
    }

    fn analyzed(&self, index: usize) -> Option<(&Ast, &Binder)> {
        self.files[index]
            .analyzed
            .as_ref()
            .ok()
            .map(|(ast, binder)| (ast, binder))
    }

    /// File imported as `specifier` from `from`: `./m` finds `m.ts` or
    /// `m/index.ts`, and `./m.js` finds `m.ts`
    fn resolve_module(&self, from: &Path, specifier: &str) -> Option<usize> {
        if !specifier.starts_with('.') {
            return None;
        }
        let base = from.parent().unwrap_or_else(|| Path::new("")).join(specifier);
        let base = normalize(&base);
        let text = base.to_string_lossy();
        let mut candidates = vec![
            PathBuf::from(format!("{}.ts", text)),
            base.join("index.ts"),
            base.clone(),
        ];
        if let Some(stem) = text.strip_suffix(".js") {
            candidates.insert(0, PathBuf::from(format!("{}.ts", stem)));
        }
        candidates
            .iter()
            .find_map(|candidate| self.index.get(candidate).copied())
    }
}

/// Read-only view of a program from one of its files
struct ProgramView<'p> {
    program: &'p Program,
    file: &'p Path,
}

impl EnumLookup for ProgramView<'_> {
    fn const_enum_member(&self, reference: EnumReference<'_>) -> Option<ConstValue> {
        match reference {
            EnumReference::Imported {
                module,
                name,
                member,
            } => {
                let index = self.program.resolve_module(self.file, module)?;
                let (_, binder) = self.program.analyzed(index)?;
                enum_member(binder, binder.exported_symbol(name)?, member)
            }
            EnumReference::Global { name, member } => {
                (0..self.program.files.len()).find_map(|index| {
                    let (_, binder) = self.program.analyzed(index)?;
                    if binder.is_external_module() {
                        return None;
                    }
                    enum_member(binder, binder.file_symbol(name)?, member)
                })
            }
        }
    }
}

fn enum_member(binder: &Binder, symbol: SymbolId, member: &str) -> Option<ConstValue> {
    if !binder.symbol(symbol).has(SymbolFlags::CONST_ENUM) {
        return None;
    }
    let member = binder.member(symbol, member)?;
    let declaration = binder.symbol(member).declarations.first()?;
    binder.constant_value(declaration.node)
}

/// Lexically normalize `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn program(files: &[(&str, &str)]) -> Program {
        Program::new(
            files
                .iter()
                .map(|(path, source)| (PathBuf::from(path), source.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("src/./a/../b.ts")), PathBuf::from("src/b.ts"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_transpile_all_keeps_order_and_failures() {
        let program = program(&[
            ("a.ts", "let a: number = 1;"),
            ("b.ts", "let = ;"),
            ("c.ts", "let c = 3;"),
        ]);
        let results = program.transpile_all(&TranspileOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, PathBuf::from("a.ts"));
        assert_eq!(results[0].1.as_ref().unwrap().code, "let a = 1;");
        assert!(matches!(results[1].1, Err(Error::ParseError { .. })));
        let failures: Vec<&Path> = program.failures().map(|(path, _)| path).collect();
        assert_eq!(failures, vec![Path::new("b.ts")]);
        assert_eq!(results[2].1.as_ref().unwrap().code, "let c = 3;");
    }

    #[test]
    fn test_imported_const_enum_is_inlined() {
        let program = program(&[
            ("src/enums.ts", "export const enum Flag { A = 1, B = A << 1 }"),
            (
                "src/main.ts",
                "import { Flag } from \"./enums\";\nexport const x = Flag.B;",
            ),
        ]);
        let results = program.transpile_all(&TranspileOptions::default());
        let main = results[1].1.as_ref().unwrap();
        assert!(main.code.contains("exports.x = 2 /* Flag.B */;"));
        assert!(!main.code.contains("require"));
    }

    #[test]
    fn test_global_const_enum_from_script_file() {
        let program = program(&[
            ("globals.ts", "const enum Mode { On = \"on\" }"),
            ("use.ts", "let m = Mode.On;"),
        ]);
        let results = program.transpile_all(&TranspileOptions::default());
        assert_eq!(results[1].1.as_ref().unwrap().code, "let m = \"on\" /* Mode.On */;");
    }

    #[test]
    fn test_module_resolution_candidates() {
        let program = program(&[("lib/index.ts", ""), ("lib/util.ts", ""), ("app.ts", "")]);
        let from = Path::new("app.ts");
        assert_eq!(program.resolve_module(from, "./lib"), Some(0));
        assert_eq!(program.resolve_module(from, "./lib/util.js"), Some(1));
        assert_eq!(program.resolve_module(from, "lib"), None);
    }
}
