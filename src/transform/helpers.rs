//! Runtime helpers and small text utilities shared by the transformers

use bitflags::bitflags;
use unicode_xid::UnicodeXID;

bitflags! {
    /// Runtime helpers a file refers to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Helpers: u8 {
        const DECORATE = 1 << 0;
        const PARAM = 1 << 1;
        const EXPORT_STAR = 1 << 2;
    }
}

const DECORATE: &str = "var __decorate = (this && this.__decorate) || function (decorators, target, key, desc) { var c = arguments.length, r = c < 3 ? target : desc === null ? desc = Object.getOwnPropertyDescriptor(target, key) : desc, d; if (typeof Reflect === \"object\" && typeof Reflect.decorate === \"function\") r = Reflect.decorate(decorators, target, key, desc); else for (var i = decorators.length - 1; i >= 0; i--) if (d = decorators[i]) r = (c < 3 ? d(r) : c > 3 ? d(target, key, r) : d(target, key)) || r; return c > 3 && r && Object.defineProperty(target, key, r), r; };\n";

const PARAM: &str = "var __param = (this && this.__param) || function (paramIndex, decorator) { return function (target, key) { decorator(target, key, paramIndex); } };\n";

const CREATE_BINDING: &str = "var __createBinding = (this && this.__createBinding) || (Object.create ? (function(o, m, k, k2) { if (k2 === undefined) k2 = k; var desc = Object.getOwnPropertyDescriptor(m, k); if (!desc || (\"get\" in desc ? !m.__esModule : desc.writable || desc.configurable)) { desc = { enumerable: true, get: function() { return m[k]; } }; } Object.defineProperty(o, k2, desc); }) : (function(o, m, k, k2) { if (k2 === undefined) k2 = k; o[k2] = m[k]; }));\n";

const EXPORT_STAR: &str = "var __exportStar = (this && this.__exportStar) || function(m, exports) { for (var p in m) if (p !== \"default\" && !Object.prototype.hasOwnProperty.call(exports, p)) __createBinding(exports, m, p); };\n";

impl Helpers {
    /// Definitions of the used helpers, one per line
    pub fn definitions(self) -> String {
        let mut out = String::new();
        if self.contains(Helpers::DECORATE) {
            out.push_str(DECORATE);
        }
        if self.contains(Helpers::PARAM) {
            out.push_str(PARAM);
        }
        if self.contains(Helpers::EXPORT_STAR) {
            out.push_str(CREATE_BINDING);
            out.push_str(EXPORT_STAR);
        }
        out
    }
}

/// A string as a double-quoted JavaScript literal
pub fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Whether a name can follow a `.` in a member access
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c == '$' || c.is_xid_start())
        && chars.all(|c| c == '$' || c.is_xid_continue())
}

/// `object.name`, or `object["name"]` when the name is not an identifier
pub fn property_access(object: &str, name: &str) -> String {
    if is_identifier_name(name) {
        format!("{}.{}", object, name)
    } else {
        format!("{}[{}]", object, quote(name))
    }
}

/// Leading whitespace of the line containing `offset`
pub fn line_indent(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let rest = &source[line_start..];
    let width = rest
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(rest.len());
    &rest[..width]
}

/// Offset of the first non-whitespace character at or after `offset`
pub fn skip_whitespace(source: &str, offset: usize) -> usize {
    source[offset..]
        .find(|c: char| !c.is_whitespace())
        .map(|i| offset + i)
        .unwrap_or(source.len())
}

/// Identifier derived from a module specifier: its last path segment with
/// the extension dropped and every other non-identifier character mapped
/// to `_`
pub fn module_base_name(specifier: &str) -> String {
    let segment = specifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(specifier);
    let segment = match segment.rfind('.') {
        Some(dot) if dot > 0 => &segment[..dot],
        _ => segment,
    };
    let mut name: String = segment
        .trim_start_matches('.')
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if name.is_empty() {
        name.push_str("module");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Text that ends the statement before `end` and starts a new one
pub fn statement_separator(source: &str, end: usize) -> &'static str {
    let before = source[..end].trim_end();
    if before.ends_with(';') || before.ends_with('}') {
        " "
    } else {
        "; "
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_base_name() {
        assert_eq!(module_base_name("./mod"), "mod");
        assert_eq!(module_base_name("../utils/string-helpers"), "string_helpers");
        assert_eq!(module_base_name("@scope/pkg"), "pkg");
        assert_eq!(module_base_name("./2d.js"), "_2d");
        assert_eq!(module_base_name("fs"), "fs");
        assert_eq!(module_base_name("."), "module");
    }

    #[test]
    fn test_line_indent() {
        let source = "a\n    enum E {}\n\tb";
        assert_eq!(line_indent(source, 6), "    ");
        assert_eq!(line_indent(source, 0), "");
        assert_eq!(line_indent(source, source.len() - 1), "\t");
    }

    #[test]
    fn test_helper_definitions_follow_flags() {
        assert!(Helpers::empty().definitions().is_empty());
        let text = (Helpers::DECORATE | Helpers::EXPORT_STAR).definitions();
        assert!(text.starts_with("var __decorate"));
        assert!(text.contains("var __createBinding"));
        assert!(!text.contains("__param = "));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_property_access() {
        assert_eq!(property_access("exports", "a"), "exports.a");
        assert_eq!(property_access("exports", "$b_1"), "exports.$b_1");
        assert_eq!(property_access("exports", "a-b"), "exports[\"a-b\"]");
        assert!(!is_identifier_name(""));
        assert!(!is_identifier_name("1a"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("x"), "\"x\"");
    }
}
