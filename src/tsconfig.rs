//! tsconfig.json support
//!
//! Reads the `compilerOptions` that affect emit and converts them into
//! [`TranspileOptions`]. The file is JSON with comments and trailing commas,
//! which are blanked out before `serde_json` sees the text, keeping line
//! numbers of parse errors intact. A relative `extends` chain is followed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::options::{JsTarget, ModuleKind, TranspileOptions};

/// Depth limit for `extends` chains
const MAX_EXTENDS: usize = 8;

/// TypeScript configuration parsed from tsconfig.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TsConfig {
    #[serde(default, rename = "compilerOptions")]
    pub compiler_options: CompilerOptions,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Path to a base tsconfig to extend
    #[serde(default)]
    pub extends: Option<String>,
    /// Directory of the file the configuration was read from
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Compiler options from tsconfig.json; only emit-related ones are read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    pub target: Option<String>,
    pub module: Option<String>,
    pub preserve_const_enums: Option<bool>,
    pub out_dir: Option<String>,
    pub root_dir: Option<String>,
    pub remove_comments: Option<bool>,
    pub experimental_decorators: Option<bool>,
    pub emit_decorator_metadata: Option<bool>,
    pub import_helpers: Option<bool>,
    pub no_emit_helpers: Option<bool>,
    pub always_strict: Option<bool>,
    pub strict: Option<bool>,
}

impl CompilerOptions {
    /// Fill every option unset here from `base`
    fn inherit(&mut self, base: &CompilerOptions) {
        macro_rules! inherit {
            ($($field:ident),*) => {
                $(if self.$field.is_none() {
                    self.$field = base.$field.clone();
                })*
            };
        }
        inherit!(
            target,
            module,
            preserve_const_enums,
            out_dir,
            root_dir,
            remove_comments,
            experimental_decorators,
            emit_decorator_metadata,
            import_helpers,
            no_emit_helpers,
            always_strict,
            strict
        );
    }
}

impl TsConfig {
    /// Parse the contents of a tsconfig.json
    pub fn load(json: &str) -> Result<Self> {
        let cleaned = strip_json_extensions(json);
        serde_json::from_str(&cleaned)
            .map_err(|e| Error::config_error(format!("invalid tsconfig.json: {}", e), None))
    }

    /// Read a tsconfig.json file, following `extends`
    pub fn load_file(path: &Path) -> Result<Self> {
        Self::load_chain(path, 0)
    }

    fn load_chain(path: &Path, depth: usize) -> Result<Self> {
        if depth > MAX_EXTENDS {
            return Err(Error::config_error(
                "extends chain is too deep",
                Some(path.to_path_buf()),
            ));
        }
        let text = fs::read_to_string(path).map_err(|e| {
            Error::config_error(format!("cannot read config: {}", e), Some(path.to_path_buf()))
        })?;
        let mut config = Self::load(&text).map_err(|e| match e {
            Error::ConfigError { message, .. } => {
                Error::config_error(message, Some(path.to_path_buf()))
            }
            other => other,
        })?;
        let base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        tracing::debug!(path = %path.display(), "loaded tsconfig");

        if let Some(extends) = config.extends.clone() {
            if !extends.starts_with('.') {
                tracing::warn!(extends = %extends, "package configs in extends are not resolved");
            } else {
                let mut base_path = base_dir.join(&extends);
                if base_path.extension().is_none() {
                    base_path.set_extension("json");
                }
                let base = Self::load_chain(&base_path, depth + 1)?;
                config.compiler_options.inherit(&base.compiler_options);
                if config.compiler_options.out_dir.is_none() {
                    config.compiler_options.out_dir = base.out_dir().map(|p| p.display().to_string());
                }
            }
        }
        config.base_dir = Some(base_dir);
        Ok(config)
    }

    /// Output directory, relative to the config file's directory
    pub fn out_dir(&self) -> Option<PathBuf> {
        let out_dir = self.compiler_options.out_dir.as_ref()?;
        Some(match &self.base_dir {
            Some(base) => base.join(out_dir),
            None => PathBuf::from(out_dir),
        })
    }

    /// Convert this configuration into transpiler options
    pub fn to_transpile_options(&self) -> Result<TranspileOptions> {
        let defaults = TranspileOptions::default();
        let options = &self.compiler_options;
        let target = match options.target.as_deref() {
            Some(target) => target
                .parse::<JsTarget>()
                .map_err(|e| self.config_error(e.to_string()))?,
            None => defaults.target,
        };
        let module = match options.module.as_deref() {
            Some(module) => module
                .parse::<ModuleKind>()
                .map_err(|e| self.config_error(e.to_string()))?,
            None if target >= JsTarget::ES2015 && options.target.is_some() => ModuleKind::EsModule,
            None => ModuleKind::CommonJs,
        };
        Ok(TranspileOptions {
            target,
            module,
            preserve_const_enums: options.preserve_const_enums.unwrap_or(false),
            emit_helpers: !options.import_helpers.unwrap_or(false)
                && !options.no_emit_helpers.unwrap_or(false),
            emit_use_strict: options.always_strict.or(options.strict).unwrap_or(false),
            ..defaults
        })
    }

    /// Options that are read but have no effect, as warnings
    pub fn validate(&self) -> Vec<String> {
        let options = &self.compiler_options;
        let mut warnings = Vec::new();
        if options.remove_comments == Some(true) {
            warnings.push("removeComments is ignored; comments are kept".to_string());
        }
        if options.emit_decorator_metadata == Some(true) {
            warnings.push("emitDecoratorMetadata is not supported".to_string());
        }
        if options.experimental_decorators == Some(false) {
            warnings.push(
                "experimentalDecorators is false; decorators are still emitted as __decorate calls"
                    .to_string(),
            );
        }
        if options.import_helpers == Some(true) {
            warnings.push("importHelpers: helpers are neither imported nor inlined".to_string());
        }
        warnings
    }

    fn config_error(&self, message: String) -> Error {
        let path = self.base_dir.as_ref().map(|dir| dir.join("tsconfig.json"));
        Error::config_error(message, path)
    }
}

/// Blank out comments and trailing commas so that strict JSON parsing
/// accepts the text. Line breaks are kept.
pub fn strip_json_extensions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                out.push(' ');
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                    out.push(' ');
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                let mut previous = '\0';
                for next in chars.by_ref() {
                    out.push(if next == '\n' { '\n' } else { ' ' });
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            _ => out.push(c),
        }
    }
    remove_trailing_commas(&out)
}

fn remove_trailing_commas(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = bytes[i + 1..]
                .iter()
                .find(|b| !b.is_ascii_whitespace())
                .copied();
            if matches!(next, Some(b'}') | Some(b']')) {
                out.push(' ');
                continue;
            }
        }
        out.push(c);
    }
    out
}
