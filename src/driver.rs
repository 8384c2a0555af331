//! Batch transpilation of files and directory trees
//!
//! Directory inputs are searched recursively for `.ts` files (declaration
//! files excluded). Each file is written with the `.js` extension, either
//! next to its source or under an output directory that mirrors the tree
//! below the input directory. A file that fails to parse is reported and
//! skipped; the others are still written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Diagnostic, Error, Result};
use crate::options::TranspileOptions;
use crate::program::Program;

/// Directories never searched for sources
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// What a batch run reads and writes
#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    pub inputs: Vec<PathBuf>,
    /// Mirror the input trees here; `None` writes next to the sources
    pub out_dir: Option<PathBuf>,
    /// Remove and recreate `out_dir` first
    pub clean: bool,
    pub transpile: TranspileOptions,
}

/// A discovered source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Directory whose layout the output mirrors
    pub root: PathBuf,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct Summary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
    /// Files with partially overlapping edits that were dropped
    pub overlapping: Vec<PathBuf>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `.ts` but not `.d.ts`
pub fn is_typescript_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".ts") && !name.ends_with(".d.ts")
}

/// Collect the source files of every input, sorted per input
pub fn discover(inputs: &[PathBuf]) -> Result<Vec<SourceFile>> {
    let mut sources = Vec::new();
    for input in inputs {
        let metadata = fs::metadata(input).map_err(|e| {
            io::Error::new(e.kind(), format!("{}: {}", input.display(), e))
        })?;
        if metadata.is_file() {
            let root = input.parent().map(Path::to_path_buf).unwrap_or_default();
            sources.push(SourceFile {
                path: input.clone(),
                root,
            });
            continue;
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(input).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !SKIPPED_DIRS.iter().any(|d| entry.file_name() == *d)
        });
        for entry in walker {
            let entry = entry.map_err(|e| Error::from(io::Error::from(e)))?;
            if entry.file_type().is_file() && is_typescript_source(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        tracing::debug!(input = %input.display(), files = found.len(), "discovered sources");
        sources.extend(found.into_iter().map(|path| SourceFile {
            path,
            root: input.clone(),
        }));
    }
    Ok(sources)
}

/// Where the JavaScript for a source file is written
pub fn output_path(source: &SourceFile, out_dir: Option<&Path>) -> PathBuf {
    let target = match out_dir {
        Some(out_dir) => {
            let relative = source
                .path
                .strip_prefix(&source.root)
                .unwrap_or(&source.path);
            out_dir.join(relative)
        }
        None => source.path.clone(),
    };
    target.with_extension("js")
}

/// Transpile every input and write the results
pub fn run(options: &DriverOptions) -> Result<Summary> {
    if let (true, Some(out_dir)) = (options.clean, &options.out_dir) {
        if out_dir.exists() {
            tracing::debug!(dir = %out_dir.display(), "cleaning output directory");
            fs::remove_dir_all(out_dir)?;
        }
        fs::create_dir_all(out_dir)?;
    }

    let sources = discover(&options.inputs)?;
    let paths: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
    let program = Program::from_paths(&paths);
    let results = program.transpile_all(&options.transpile);

    let mut summary = Summary::default();
    for (source, (path, result)) in sources.iter().zip(results) {
        match result {
            Ok(output) => {
                if !output.overlaps.is_empty() {
                    tracing::warn!(
                        path = %path.display(),
                        overlaps = output.overlaps.len(),
                        "dropped overlapping edits"
                    );
                    summary.overlapping.push(path.clone());
                }
                for diagnostic in &output.diagnostics {
                    tracing::info!(path = %path.display(), %diagnostic, "left unchanged");
                }
                let target = output_path(source, options.out_dir.as_deref());
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, output.code)?;
                tracing::debug!(from = %path.display(), to = %target.display(), "wrote");
                summary.written.push(target);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipped file");
                summary.failed.push((path, e));
            }
        }
    }

    if let Some(out_dir) = &options.out_dir {
        if out_dir.exists() {
            let pruned = prune_empty_dirs(out_dir)?;
            tracing::debug!(pruned, "pruned empty directories");
        }
    }
    Ok(summary)
}

/// Remove empty directories below `root`, deepest first
pub fn prune_empty_dirs(root: &Path) -> Result<usize> {
    let mut pruned = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| Error::from(io::Error::from(e)))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if fs::read_dir(entry.path())?.next().is_none() {
            fs::remove_dir(entry.path())?;
            pruned += 1;
        }
    }
    Ok(pruned)
}

/// Parse and bind every input, returning each file's diagnostics or the
/// error that stopped parsing
pub fn check(inputs: &[PathBuf]) -> Result<Vec<(PathBuf, Result<Vec<Diagnostic>>)>> {
    let sources = discover(inputs)?;
    let mut results = Vec::with_capacity(sources.len());
    for source in sources {
        let result = fs::read_to_string(&source.path)
            .map_err(Error::from)
            .and_then(|text| crate::check(&text));
        results.push((source.path, result));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_is_typescript_source() {
        assert!(is_typescript_source(Path::new("a/b.ts")));
        assert!(!is_typescript_source(Path::new("a/b.d.ts")));
        assert!(!is_typescript_source(Path::new("a/b.tsx")));
        assert!(!is_typescript_source(Path::new("a/b.js")));
    }

    #[test]
    fn test_discover_skips_declarations_and_node_modules() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        write(&root.join("a.ts"), "");
        write(&root.join("sub/b.ts"), "");
        write(&root.join("types.d.ts"), "");
        write(&root.join("node_modules/pkg/c.ts"), "");
        write(&root.join("notes.txt"), "");

        let sources = discover(&[root.clone()]).unwrap();
        let paths: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
        assert_eq!(paths, vec![root.join("a.ts"), root.join("sub/b.ts")]);
        assert!(sources.iter().all(|s| s.root == root));
    }

    #[test]
    fn test_discover_missing_input_fails() {
        assert!(discover(&[PathBuf::from("/nonexistent/input")]).is_err());
    }

    #[test]
    fn test_output_path_mirrors_tree() {
        let source = SourceFile {
            path: PathBuf::from("src/lib/a.ts"),
            root: PathBuf::from("src"),
        };
        assert_eq!(
            output_path(&source, Some(Path::new("out"))),
            PathBuf::from("out/lib/a.js")
        );
        assert_eq!(output_path(&source, None), PathBuf::from("src/lib/a.js"));
    }

    #[test]
    fn test_run_writes_mirrored_tree_and_reports_failures() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        write(&src.join("a.ts"), "export const a: number = 1;");
        write(&src.join("nested/b.ts"), "let b = <string>\"x\";");
        write(&src.join("broken.ts"), "let = ;");
        write(&out.join("stale/old.js"), "old");

        let options = DriverOptions {
            inputs: vec![src.clone()],
            out_dir: Some(out.clone()),
            clean: true,
            transpile: TranspileOptions::default(),
        };
        let summary = run(&options).unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, src.join("broken.ts"));
        assert_eq!(summary.written.len(), 2);
        assert_eq!(
            fs::read_to_string(out.join("nested/b.js")).unwrap(),
            "let b = \"x\";"
        );
        assert!(fs::read_to_string(out.join("a.js")).unwrap().contains("exports.a = 1;"));
        assert!(!out.join("stale").exists());
        assert!(!out.join("broken.js").exists());
    }

    #[test]
    fn test_run_without_out_dir_writes_next_to_source() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("single.ts");
        write(&file, "function f(a: string): void {}");
        let options = DriverOptions {
            inputs: vec![file],
            ..Default::default()
        };
        let summary = run(&options).unwrap();
        assert!(summary.is_success());
        assert_eq!(
            fs::read_to_string(dir.path().join("single.js")).unwrap(),
            "function f(a) {}"
        );
    }

    #[test]
    fn test_unreadable_file_does_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        write(&src.join("a.ts"), "let a: number = 1;");
        fs::write(src.join("b.ts"), [0xff, 0xfe, 0x00]).unwrap();

        let summary = run(&DriverOptions {
            inputs: vec![src.clone()],
            ..Default::default()
        })
        .unwrap();

        assert_eq!(summary.written, vec![src.join("a.js")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, src.join("b.ts"));
        assert!(matches!(summary.failed[0].1, Error::IoError { .. }));
        assert_eq!(fs::read_to_string(src.join("a.js")).unwrap(), "let a = 1;");
        assert!(!src.join("b.js").exists());

        let checked = check(&[src]).unwrap();
        assert!(checked[0].1.is_ok());
        assert!(checked[1].1.is_err());
    }

    #[test]
    fn test_prune_empty_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        write(&dir.path().join("d/keep.js"), "");
        assert_eq!(prune_empty_dirs(dir.path()).unwrap(), 3);
        assert!(!dir.path().join("a").exists());
        assert!(dir.path().join("d/keep.js").exists());
    }

    #[test]
    fn test_check_collects_errors() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("ok.ts"), "let a: number = 1;");
        write(&dir.path().join("bad.ts"), "let = ;");
        let results = check(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].0.ends_with("bad.ts"));
        assert!(results[0].1.is_err());
        assert!(results[1].1.as_ref().unwrap().is_empty());
    }
}
