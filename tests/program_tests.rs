//! Multi-file programs, the batch driver and tsconfig handling

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::MARKER;
use detype::driver::{self, DriverOptions};
use detype::tsconfig::TsConfig;
use detype::{Error, ModuleKind, Program, TranspileOptions};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

mod programs {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_program_from_disk_inlines_imported_const_enum() {
        let dir = tempdir().unwrap();
        let enums = dir.path().join("enums.ts");
        let main = dir.path().join("main.ts");
        write(&enums, "export const enum Status { Ok = 200, NotFound = 404 }");
        write(
            &main,
            "import { Status } from \"./enums\";\nexport function code(): number { return Status.NotFound; }",
        );

        let program = Program::from_paths(&[enums.clone(), main.clone()]);
        assert_eq!(program.len(), 2);
        let results = program.transpile_all(&TranspileOptions::default());
        assert_eq!(results[0].0, enums);
        assert_eq!(results[1].0, main);

        let main_js = &results[1].1.as_ref().unwrap().code;
        assert!(main_js.contains("return 404 /* Status.NotFound */;"));
        assert!(!main_js.contains("require(\"./enums\")"));
    }

    #[test]
    fn test_program_in_memory_keeps_input_order() {
        let files: Vec<(PathBuf, String)> = (0..16)
            .map(|i| {
                (
                    PathBuf::from(format!("m{}.ts", i)),
                    format!("export const v{}: number = {};", i, i),
                )
            })
            .collect();
        let program = Program::new(files);
        let results = program.transpile_all(&TranspileOptions::default());
        for (i, (path, result)) in results.iter().enumerate() {
            assert_eq!(path, &PathBuf::from(format!("m{}.ts", i)));
            let code = &result.as_ref().unwrap().code;
            assert!(code.starts_with(MARKER));
            assert!(code.ends_with(&format!("exports.v{} = {};", i, i)));
        }
    }

    #[test]
    fn test_broken_file_does_not_stop_the_others() {
        let program = Program::new(vec![
            (PathBuf::from("ok.ts"), "let a: string = \"\";".to_string()),
            (PathBuf::from("bad.ts"), "class {".to_string()),
        ]);
        let results = program.transpile_all(&TranspileOptions::default());
        assert_eq!(results[0].1.as_ref().unwrap().code, "let a = \"\";");
        assert!(matches!(results[1].1, Err(Error::ParseError { .. })));
        assert_eq!(program.failures().count(), 1);
    }

    #[test]
    fn test_unreadable_files_fail_alone() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.ts");
        let binary = dir.path().join("binary.ts");
        write(&good, "export const g: boolean = true;");
        fs::write(&binary, b"\xff\xfe let").unwrap();
        let missing = dir.path().join("missing.ts");

        let program = Program::from_paths(&[good.clone(), binary.clone(), missing.clone()]);
        let results = program.transpile_all(&TranspileOptions::default());
        assert!(results[0].1.as_ref().unwrap().code.ends_with("exports.g = true;"));
        assert!(matches!(results[1].1, Err(Error::IoError { .. })));
        assert!(matches!(results[2].1, Err(Error::IoError { .. })));

        let failed: Vec<&Path> = program.failures().map(|(path, _)| path).collect();
        assert_eq!(failed, vec![binary.as_path(), missing.as_path()]);
    }
}

mod batch {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_mirrors_tree_into_out_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("dist");
        write(&src.join("index.ts"), "export * from \"./util/strings\";");
        write(
            &src.join("util/strings.ts"),
            "export function upper(s: string): string { return s.toUpperCase(); }",
        );
        write(&src.join("util/types.d.ts"), "declare const X: number;");

        let summary = driver::run(&DriverOptions {
            inputs: vec![src.clone()],
            out_dir: Some(out.clone()),
            clean: false,
            transpile: TranspileOptions::default(),
        })
        .unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.written.len(), 2);
        assert!(summary.overlapping.is_empty());
        let strings = fs::read_to_string(out.join("util/strings.js")).unwrap();
        assert!(strings.contains("function upper(s) { return s.toUpperCase(); }"));
        assert!(out.join("index.js").exists());
        assert!(!out.join("util/types.js").exists());
    }

    #[test]
    fn test_run_with_es_module_output() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.ts");
        write(&file, "export const a: number[] = [];");
        let options = TranspileOptions {
            module: ModuleKind::EsModule,
            ..Default::default()
        };
        driver::run(&DriverOptions {
            inputs: vec![file],
            out_dir: None,
            clean: false,
            transpile: options,
        })
        .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("a.js")).unwrap(),
            "export const a = [];"
        );
    }
}

mod tsconfig {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_project_options_drive_the_run() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("tsconfig.json"),
            r#"{
                // comments and trailing commas are accepted
                "compilerOptions": {
                    "target": "es2017",
                    "module": "commonjs",
                    "outDir": "build",
                    "strict": true,
                },
            }"#,
        );
        write(&dir.path().join("src/a.ts"), "export const a = 1 as const;");

        let config = TsConfig::load_file(&dir.path().join("tsconfig.json")).unwrap();
        let options = config.to_transpile_options().unwrap();
        assert_eq!(options.module, ModuleKind::CommonJs);
        assert!(options.emit_use_strict);
        assert_eq!(config.out_dir(), Some(dir.path().join("build")));

        let summary = driver::run(&DriverOptions {
            inputs: vec![dir.path().join("src")],
            out_dir: config.out_dir(),
            clean: true,
            transpile: options,
        })
        .unwrap();
        assert!(summary.is_success());
        let a = fs::read_to_string(dir.path().join("build/a.js")).unwrap();
        assert!(a.starts_with("\"use strict\";"));
        assert!(a.contains("exports.a = 1;"));
    }

    #[test]
    fn test_unknown_target_is_a_config_error() {
        let config = TsConfig::load(r#"{ "compilerOptions": { "target": "es1999" } }"#).unwrap();
        assert!(matches!(
            config.to_transpile_options(),
            Err(Error::ConfigError { .. })
        ));
    }
}
