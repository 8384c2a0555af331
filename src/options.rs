//! Transpiler configuration

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Configuration options for transpilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOptions {
    /// Target JavaScript version of the synthetic code
    pub target: JsTarget,
    /// Module syntax of the output
    pub module: ModuleKind,
    /// Emit `const enum`s like regular enums instead of inlining them
    pub preserve_const_enums: bool,
    /// Delete ambient declarations instead of keeping them as comments
    pub suppress_ambient: bool,
    /// What happens to removed type syntax
    pub removal_mode: RemovalMode,
    /// Prepend `__decorate`, `__param` and `__exportStar` when used
    pub emit_helpers: bool,
    /// Prepend `"use strict";` in CommonJS output
    pub emit_use_strict: bool,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            target: JsTarget::ES2020,
            module: ModuleKind::CommonJs,
            preserve_const_enums: false,
            suppress_ambient: true,
            removal_mode: RemovalMode::Strip,
            emit_helpers: false,
            emit_use_strict: false,
        }
    }
}

impl TranspileOptions {
    /// Whether synthetic code may use `let`, `const` and arrow functions
    pub fn es2015(&self) -> bool {
        self.target >= JsTarget::ES2015
    }

    /// Keyword for a synthetic block-scoped binding
    pub fn let_keyword(&self) -> &'static str {
        if self.es2015() {
            "let"
        } else {
            "var"
        }
    }

    /// Keyword for a synthetic constant binding
    pub fn const_keyword(&self) -> &'static str {
        if self.es2015() {
            "const"
        } else {
            "var"
        }
    }

    pub fn commonjs(&self) -> bool {
        self.module == ModuleKind::CommonJs
    }
}

/// JavaScript target version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JsTarget {
    ES5,
    ES2015,
    ES2016,
    ES2017,
    ES2018,
    ES2019,
    ES2020,
    ES2021,
    ES2022,
    ESNext,
}

impl FromStr for JsTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let target = match s.to_lowercase().as_str() {
            "es3" | "es5" => JsTarget::ES5,
            "es6" | "es2015" => JsTarget::ES2015,
            "es2016" => JsTarget::ES2016,
            "es2017" => JsTarget::ES2017,
            "es2018" => JsTarget::ES2018,
            "es2019" => JsTarget::ES2019,
            "es2020" => JsTarget::ES2020,
            "es2021" => JsTarget::ES2021,
            "es2022" => JsTarget::ES2022,
            "es2023" | "es2024" | "esnext" | "latest" => JsTarget::ESNext,
            _ => return Err(Error::InvalidOption(format!("unknown target '{}'", s))),
        };
        Ok(target)
    }
}

impl fmt::Display for JsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsTarget::ES5 => "ES5",
            JsTarget::ES2015 => "ES2015",
            JsTarget::ES2016 => "ES2016",
            JsTarget::ES2017 => "ES2017",
            JsTarget::ES2018 => "ES2018",
            JsTarget::ES2019 => "ES2019",
            JsTarget::ES2020 => "ES2020",
            JsTarget::ES2021 => "ES2021",
            JsTarget::ES2022 => "ES2022",
            JsTarget::ESNext => "ESNext",
        };
        f.write_str(name)
    }
}

/// Module syntax of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// `require` and `exports.x`
    CommonJs,
    /// `import` and `export` kept, types stripped
    EsModule,
}

impl FromStr for ModuleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "commonjs" | "cjs" | "node16" | "nodenext" => Ok(ModuleKind::CommonJs),
            "es6" | "es2015" | "es2020" | "es2022" | "esnext" | "esm" | "preserve" => {
                Ok(ModuleKind::EsModule)
            }
            _ => Err(Error::InvalidOption(format!("unknown module kind '{}'", s))),
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModuleKind::CommonJs => "commonjs",
            ModuleKind::EsModule => "esnext",
        })
    }
}

/// What happens to removed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RemovalMode {
    /// Delete it, keeping its line breaks
    #[default]
    Strip,
    /// Keep it inside a block comment
    Preserve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!("ES2019".parse::<JsTarget>().unwrap(), JsTarget::ES2019);
        assert_eq!("es6".parse::<JsTarget>().unwrap(), JsTarget::ES2015);
        assert_eq!("ESNext".parse::<JsTarget>().unwrap(), JsTarget::ESNext);
        assert!(matches!(
            "es1999".parse::<JsTarget>(),
            Err(Error::InvalidOption(_))
        ));
    }

    #[test]
    fn test_parse_module_kind() {
        assert_eq!("CommonJS".parse::<ModuleKind>().unwrap(), ModuleKind::CommonJs);
        assert_eq!("esnext".parse::<ModuleKind>().unwrap(), ModuleKind::EsModule);
        assert!("amd".parse::<ModuleKind>().is_err());
    }

    #[test]
    fn test_keywords_follow_target() {
        let mut options = TranspileOptions::default();
        assert_eq!(options.let_keyword(), "let");
        assert_eq!(options.const_keyword(), "const");
        options.target = JsTarget::ES5;
        assert_eq!(options.let_keyword(), "var");
        assert_eq!(options.const_keyword(), "var");
    }

    #[test]
    fn test_target_display_round_trips() {
        for target in [JsTarget::ES5, JsTarget::ES2022, JsTarget::ESNext] {
            assert_eq!(target.to_string().parse::<JsTarget>().unwrap(), target);
        }
    }
}
