//! Constant folding of enum member values

use super::{Binder, SymbolFlags};
use crate::ast::*;
use crate::parser::string_value;
use rustc_hash::{FxHashMap, FxHashSet};

/// Compile-time value of an enum member
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Number(f64),
    String(String),
}

impl ConstValue {
    /// The value as a JavaScript literal
    pub fn to_js(&self) -> String {
        match self {
            ConstValue::Number(n) => format_number(*n),
            ConstValue::String(s) => serde_json::Value::String(s.clone()).to_string(),
        }
    }

    fn to_js_string(&self) -> String {
        match self {
            ConstValue::Number(n) => format_number(*n),
            ConstValue::String(s) => s.clone(),
        }
    }
}

/// Format a number the way JavaScript prints it
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// ECMAScript ToInt32
fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let modulo = n.trunc().rem_euclid(4_294_967_296.0);
    modulo as u32 as i32
}

/// Fold the value of every enum member in the file
pub(super) fn evaluate_enums(ast: &Ast, binder: &Binder) -> FxHashMap<NodeId, ConstValue> {
    let mut evaluator = Evaluator {
        ast,
        binder,
        memo: FxHashMap::default(),
        in_progress: FxHashSet::default(),
    };
    let mut members = Vec::new();
    ast.walk(ast.root(), &mut |id| {
        if let NodeKind::EnumDeclaration { members: list, .. } = ast.kind(id) {
            members.extend(list.iter().copied());
        }
        true
    });
    for member in members {
        evaluator.member_value(member);
    }
    evaluator
        .memo
        .into_iter()
        .filter_map(|(id, value)| value.map(|v| (id, v)))
        .collect()
}

struct Evaluator<'a> {
    ast: &'a Ast,
    binder: &'a Binder,
    memo: FxHashMap<NodeId, Option<ConstValue>>,
    in_progress: FxHashSet<NodeId>,
}

impl Evaluator<'_> {
    fn member_value(&mut self, member: NodeId) -> Option<ConstValue> {
        if let Some(value) = self.memo.get(&member) {
            return value.clone();
        }
        // A member whose value depends on itself has none
        if !self.in_progress.insert(member) {
            return None;
        }

        let value = match self.ast.kind(member) {
            NodeKind::EnumMember { init: Some(init), .. } => self.evaluate(*init),
            NodeKind::EnumMember { init: None, .. } => match self.previous_member(member) {
                None => Some(ConstValue::Number(0.0)),
                Some(previous) => match self.member_value(previous) {
                    Some(ConstValue::Number(n)) => Some(ConstValue::Number(n + 1.0)),
                    _ => None,
                },
            },
            _ => None,
        };

        self.in_progress.remove(&member);
        self.memo.insert(member, value.clone());
        value
    }

    fn previous_member(&self, member: NodeId) -> Option<NodeId> {
        let parent = self.ast.parent(member)?;
        let NodeKind::EnumDeclaration { members, .. } = self.ast.kind(parent) else {
            return None;
        };
        let index = members.iter().position(|&m| m == member)?;
        index.checked_sub(1).map(|i| members[i])
    }

    fn evaluate(&mut self, expr: NodeId) -> Option<ConstValue> {
        match self.ast.kind(expr) {
            NodeKind::NumericLiteral { value } => Some(ConstValue::Number(*value)),
            NodeKind::StringLiteral { value } => Some(ConstValue::String(value.clone())),
            NodeKind::TemplateLiteral { expressions } if expressions.is_empty() => {
                Some(ConstValue::String(string_value(self.ast.text(expr))))
            }
            NodeKind::Paren { expression } => self.evaluate(*expression),
            NodeKind::Unary { op, operand } => {
                let ConstValue::Number(n) = self.evaluate(*operand)? else {
                    return None;
                };
                match op {
                    UnaryOp::Plus => Some(ConstValue::Number(n)),
                    UnaryOp::Minus => Some(ConstValue::Number(-n)),
                    UnaryOp::BitNot => Some(ConstValue::Number(!to_int32(n) as f64)),
                    _ => None,
                }
            }
            NodeKind::Binary { op, left, right } => {
                let left = self.evaluate(*left)?;
                let right = self.evaluate(*right)?;
                binary(*op, left, right)
            }
            NodeKind::Identifier => {
                let symbol = self.binder.resolve_identifier(expr);
                match symbol {
                    Some(symbol) => self.symbol_value(symbol),
                    None => match self.ast.text(expr) {
                        "Infinity" => Some(ConstValue::Number(f64::INFINITY)),
                        "NaN" => Some(ConstValue::Number(f64::NAN)),
                        _ => None,
                    },
                }
            }
            NodeKind::Member { .. } | NodeKind::Index { .. } => {
                let symbol = self.binder.entity_symbol(self.ast, expr)?;
                self.symbol_value(symbol)
            }
            _ => None,
        }
    }

    fn symbol_value(&mut self, symbol: super::SymbolId) -> Option<ConstValue> {
        let entry = self.binder.symbol(symbol);
        if !entry.has(SymbolFlags::ENUM_MEMBER) {
            return None;
        }
        let declaration = entry.declarations.first()?.node;
        self.member_value(declaration)
    }
}

fn binary(op: BinaryOp, left: ConstValue, right: ConstValue) -> Option<ConstValue> {
    use ConstValue::{Number, String};

    if op == BinaryOp::Add {
        if matches!(left, String(_)) || matches!(right, String(_)) {
            return Some(String(left.to_js_string() + &right.to_js_string()));
        }
    }
    let (Number(l), Number(r)) = (left, right) else {
        return None;
    };
    let value = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Mod => l % r,
        BinaryOp::Exp => l.powf(r),
        BinaryOp::BitOr => (to_int32(l) | to_int32(r)) as f64,
        BinaryOp::BitAnd => (to_int32(l) & to_int32(r)) as f64,
        BinaryOp::BitXor => (to_int32(l) ^ to_int32(r)) as f64,
        BinaryOp::Shl => to_int32(l).wrapping_shl(to_int32(r) as u32 & 31) as f64,
        BinaryOp::Shr => to_int32(l).wrapping_shr(to_int32(r) as u32 & 31) as f64,
        BinaryOp::UShr => ((to_int32(l) as u32) >> (to_int32(r) as u32 & 31)) as f64,
        _ => return None,
    };
    Some(Number(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn member_values(source: &str) -> Vec<Option<ConstValue>> {
        let ast = parse(source).unwrap();
        let binder = Binder::bind(&ast);
        let mut values = Vec::new();
        ast.walk(ast.root(), &mut |id| {
            if matches!(ast.kind(id), NodeKind::EnumMember { .. }) {
                values.push(binder.constant_value(id));
            }
            true
        });
        values
    }

    fn num(n: f64) -> Option<ConstValue> {
        Some(ConstValue::Number(n))
    }

    #[test]
    fn test_implicit_members_count_up() {
        assert_eq!(
            member_values("enum E { A, B, C = 10, D }"),
            vec![num(0.0), num(1.0), num(10.0), num(11.0)]
        );
    }

    #[test]
    fn test_string_member_stops_implicit_numbering() {
        assert_eq!(
            member_values("enum E { A = 'a', B }"),
            vec![Some(ConstValue::String("a".into())), None]
        );
    }

    #[test]
    fn test_operators_and_member_references() {
        assert_eq!(
            member_values("enum E { A = 1 << 3, B = A | 1, C = ~0, D = -(2 ** 3), G = 7 % 4, F = E.B * 2 }"),
            vec![num(8.0), num(9.0), num(-1.0), num(-8.0), num(3.0), num(18.0)]
        );
    }

    #[test]
    fn test_string_concatenation_and_templates() {
        assert_eq!(
            member_values("enum S { A = 'x' + 1, B = `t`, C = A + B }"),
            vec![
                Some(ConstValue::String("x1".into())),
                Some(ConstValue::String("t".into())),
                Some(ConstValue::String("x1t".into())),
            ]
        );
    }

    #[test]
    fn test_references_across_merged_and_other_enums() {
        assert_eq!(
            member_values("enum E { A = 2 }\nenum E { B = A + 1 }\nenum F { C = E.B, D = E['A'] }"),
            vec![num(2.0), num(3.0), num(3.0), num(2.0)]
        );
    }

    #[test]
    fn test_unfoldable_and_cyclic_members() {
        assert_eq!(
            member_values("enum E { A = f(), B, C = D, D = C }"),
            vec![None, None, None, None]
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-1.0), "-1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(ConstValue::String("a\"b".into()).to_js(), "\"a\\\"b\"");
    }

    #[test]
    fn test_to_int32_wraps() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_int32(-1.5), -1);
        assert_eq!(to_int32(f64::INFINITY), 0);
    }
}
