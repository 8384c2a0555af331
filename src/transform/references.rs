//! Reference tracking
//!
//! Declarations that move to a different home (imports that become
//! `m_1.a`, exported variables that become `exports.a`, namespace exports
//! that become `N.a`) register a [`ReferenceRecord`] keyed by the offset of
//! their declaring identifier. Every identifier the binder resolves to such a
//! declaration is rewritten where it occurs, and the record (and its group)
//! is marked used so that unused imports can be elided afterwards.

use super::edit::GroupKey;
use crate::ast::{Ast, NodeId, Span};
use crate::binder::Binder;
use rustc_hash::{FxHashMap, FxHashSet};

/// How an occurrence is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    /// Insert the text in front of the identifier
    Prefix,
    /// Replace the identifier by the text
    Replace,
}

/// Where a record applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordScope {
    Everywhere,
    /// Occurrences inside the span keep the local name
    OutsideOf(Span),
}

#[derive(Debug, Clone)]
pub struct ReferenceRecord {
    /// Start offset of the declaring identifier
    pub decl_pos: usize,
    pub text: String,
    pub mode: RewriteMode,
    pub group: Option<GroupKey>,
    /// Marks usage without rewriting, e.g. `import * as ns`
    pub alias_only: bool,
    /// Reads a named export of another module, which may still change
    pub live: bool,
    pub scope: RecordScope,
}

impl ReferenceRecord {
    pub fn prefix(decl_pos: usize, text: impl Into<String>) -> Self {
        Self {
            decl_pos,
            text: text.into(),
            mode: RewriteMode::Prefix,
            group: None,
            alias_only: false,
            live: false,
            scope: RecordScope::Everywhere,
        }
    }

    pub fn replace(decl_pos: usize, text: impl Into<String>) -> Self {
        Self {
            mode: RewriteMode::Replace,
            ..Self::prefix(decl_pos, text)
        }
    }

    pub fn alias(decl_pos: usize) -> Self {
        Self {
            alias_only: true,
            ..Self::prefix(decl_pos, "")
        }
    }

    pub fn in_group(mut self, group: GroupKey) -> Self {
        self.group = Some(group);
        self
    }

    pub fn outside_of(mut self, span: Span) -> Self {
        self.scope = RecordScope::OutsideOf(span);
        self
    }

    pub fn live_binding(mut self) -> Self {
        self.live = true;
        self
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub mode: RewriteMode,
    /// Re-exports of the occurrence must stay live
    pub live: bool,
}

impl Rewrite {
    /// The full replacement of an occurrence named `name`
    pub fn rewritten(&self, name: &str) -> String {
        match self.mode {
            RewriteMode::Prefix => format!("{}{}", self.text, name),
            RewriteMode::Replace => self.text.clone(),
        }
    }
}

/// Per-file registry of rewritten declarations
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    records: Vec<ReferenceRecord>,
    by_pos: FxHashMap<usize, Vec<usize>>,
    used_groups: FxHashSet<GroupKey>,
    next_group: u32,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_group(&mut self) -> GroupKey {
        self.next_group += 1;
        GroupKey(self.next_group)
    }

    pub fn register(&mut self, record: ReferenceRecord) {
        tracing::trace!(pos = record.decl_pos, text = %record.text, "registered reference");
        self.by_pos
            .entry(record.decl_pos)
            .or_default()
            .push(self.records.len());
        self.records.push(record);
    }

    /// Rewrite for an identifier occurrence, marking its record used.
    ///
    /// The identifier is resolved through the binder, so a closer
    /// declaration with the same name shadows the registered one.
    pub fn lookup(&mut self, ast: &Ast, binder: &Binder, ident: NodeId) -> Option<Rewrite> {
        let symbol = binder.resolve_identifier(ident)?;
        let site = ast.span(ident);
        let declarations = &binder.symbol(symbol).declarations;
        if declarations.iter().any(|d| d.name == ident) {
            return None;
        }

        let index = declarations
            .iter()
            .filter_map(|d| self.by_pos.get(&ast.span(d.name).start))
            .flatten()
            .copied()
            .find(|&i| match self.records[i].scope {
                RecordScope::Everywhere => true,
                RecordScope::OutsideOf(span) => !span.contains(site),
            })?;

        let record = &self.records[index];
        if let Some(group) = record.group {
            self.used_groups.insert(group);
        }
        if record.alias_only {
            return None;
        }
        Some(Rewrite {
            text: record.text.clone(),
            mode: record.mode,
            live: record.live,
        })
    }

    /// Whether an identifier resolves to an alias-only record
    pub fn is_alias(&self, ast: &Ast, binder: &Binder, ident: NodeId) -> bool {
        let Some(symbol) = binder.resolve_identifier(ident) else {
            return false;
        };
        binder
            .symbol(symbol)
            .declarations
            .iter()
            .filter_map(|d| self.by_pos.get(&ast.span(d.name).start))
            .flatten()
            .any(|&i| self.records[i].alias_only)
    }

    pub fn is_group_used(&self, group: GroupKey) -> bool {
        self.used_groups.contains(&group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn identifiers(ast: &Ast, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        ast.walk(ast.root(), &mut |id| {
            if ast.identifier(id) == Some(name) {
                found.push(id);
            }
            true
        });
        found
    }

    #[test]
    fn test_lookup_rewrites_and_marks_group() {
        let ast = parse("const a = 1;\na + a;").unwrap();
        let binder = Binder::bind(&ast);
        let ids = identifiers(&ast, "a");
        let mut tracker = ReferenceTracker::new();
        let group = tracker.new_group();
        tracker.register(ReferenceRecord::prefix(ast.span(ids[0]).start, "m_1.").in_group(group));

        assert!(!tracker.is_group_used(group));
        assert_eq!(tracker.lookup(&ast, &binder, ids[0]), None);
        let rewrite = tracker.lookup(&ast, &binder, ids[1]).unwrap();
        assert_eq!(rewrite.text, "m_1.");
        assert_eq!(rewrite.mode, RewriteMode::Prefix);
        assert!(tracker.is_group_used(group));
    }

    #[test]
    fn test_shadowed_name_is_not_rewritten() {
        let ast = parse("const a = 1;\nfunction f(a) { return a; }\na;").unwrap();
        let binder = Binder::bind(&ast);
        let ids = identifiers(&ast, "a");
        let mut tracker = ReferenceTracker::new();
        let group = tracker.new_group();
        tracker.register(
            ReferenceRecord::replace(ast.span(ids[0]).start, "exports.a").in_group(group),
        );

        assert_eq!(tracker.lookup(&ast, &binder, ids[2]), None);
        assert!(!tracker.is_group_used(group));
        assert!(tracker.lookup(&ast, &binder, ids[3]).is_some());
        assert!(tracker.is_group_used(group));
    }

    #[test]
    fn test_outside_of_scope_and_alias_records() {
        let source = "function f() {}\n{ f; }\nf;";
        let ast = parse(source).unwrap();
        let binder = Binder::bind(&ast);
        let ids = identifiers(&ast, "f");
        let block = ast.statements(ast.root())[1];
        let mut tracker = ReferenceTracker::new();
        tracker.register(
            ReferenceRecord::prefix(ast.span(ids[0]).start, "N.").outside_of(ast.span(block)),
        );

        assert_eq!(tracker.lookup(&ast, &binder, ids[1]), None);
        assert_eq!(
            tracker.lookup(&ast, &binder, ids[2]).map(|r| r.text),
            Some("N.".into())
        );

        let mut aliases = ReferenceTracker::new();
        let group = aliases.new_group();
        aliases.register(ReferenceRecord::alias(ast.span(ids[0]).start).in_group(group));
        assert_eq!(aliases.lookup(&ast, &binder, ids[2]), None);
        assert!(aliases.is_group_used(group));
        assert!(aliases.is_alias(&ast, &binder, ids[1]));
    }

    #[test]
    fn test_rewritten_text_and_live_flag() {
        let ast = parse("let a = 1, d = 2;\na; d;").unwrap();
        let binder = Binder::bind(&ast);
        let a = identifiers(&ast, "a");
        let d = identifiers(&ast, "d");
        let mut tracker = ReferenceTracker::new();
        tracker.register(ReferenceRecord::prefix(ast.span(a[0]).start, "m_1.").live_binding());
        tracker.register(ReferenceRecord::replace(ast.span(d[0]).start, "m_1.default"));

        let named = tracker.lookup(&ast, &binder, a[1]).unwrap();
        assert_eq!(named.rewritten("a"), "m_1.a");
        assert!(named.live);
        let default = tracker.lookup(&ast, &binder, d[1]).unwrap();
        assert_eq!(default.rewritten("d"), "m_1.default");
        assert!(!default.live);
    }
}
