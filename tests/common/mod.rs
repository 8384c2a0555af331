//! Shared test helpers for integration tests

use detype::ast::{Ast, NodeKind};
use detype::{ModuleKind, RemovalMode, TranspileOptions, TranspileOutput};

/// First line of every CommonJS module that has exports
#[allow(dead_code)]
pub const MARKER: &str = "Object.defineProperty(exports, \"__esModule\", { value: true });\n";

/// Transpile with the given options, failing the test on a parse error
#[allow(dead_code)]
pub fn transpile_output(source: &str, options: &TranspileOptions) -> TranspileOutput {
    match detype::transpile_with_options(source, options) {
        Ok(output) => output,
        Err(e) => panic!("failed to transpile {:?}: {}", source, e),
    }
}

/// Transpile to CommonJS with the default options
#[allow(dead_code)]
pub fn transpile(source: &str) -> String {
    transpile_output(source, &TranspileOptions::default()).code
}

/// Transpile keeping ES module syntax
#[allow(dead_code)]
pub fn transpile_esm(source: &str) -> String {
    let options = TranspileOptions {
        module: ModuleKind::EsModule,
        ..Default::default()
    };
    transpile_output(source, &options).code
}

/// Transpile keeping removed type syntax as comments
#[allow(dead_code)]
pub fn transpile_preserve(source: &str) -> String {
    let options = TranspileOptions {
        removal_mode: RemovalMode::Preserve,
        ..Default::default()
    };
    transpile_output(source, &options).code
}

/// Names of the TypeScript-only constructs left in a parsed file
#[allow(dead_code)]
pub fn type_syntax(ast: &Ast) -> Vec<&'static str> {
    let mut found = Vec::new();
    ast.walk(ast.root(), &mut |id| {
        let name = match ast.kind(id) {
            NodeKind::InterfaceDeclaration { .. } => Some("interface"),
            NodeKind::TypeAliasDeclaration { .. } => Some("type alias"),
            NodeKind::EnumDeclaration { .. } => Some("enum"),
            NodeKind::ModuleDeclaration { .. } => Some("namespace"),
            NodeKind::ImportEquals { .. } => Some("import ="),
            NodeKind::ExportAssignment {
                is_equals: true, ..
            } => Some("export ="),
            NodeKind::As { .. } => Some("as"),
            NodeKind::Satisfies { .. } => Some("satisfies"),
            NodeKind::TypeAssertion { .. } => Some("type assertion"),
            NodeKind::NonNull { .. } => Some("non-null"),
            NodeKind::Instantiation { .. } => Some("instantiation"),
            NodeKind::IndexSignature { .. } => Some("index signature"),
            NodeKind::Decorator { .. } => Some("decorator"),
            NodeKind::VariableDeclarator {
                type_annotation: Some(_),
                ..
            } => Some("variable type"),
            NodeKind::VariableDeclarator {
                definite: Some(_), ..
            } => Some("definite"),
            NodeKind::Parameter {
                modifiers,
                type_annotation,
                optional,
                ..
            } if !modifiers.is_empty() || type_annotation.is_some() || optional.is_some() => {
                Some("parameter type")
            }
            NodeKind::PropertyDeclaration {
                modifiers,
                type_annotation,
                optional,
                definite,
                ..
            } if modifiers.has(detype::ast::ModifierFlags::TYPE_ONLY)
                || type_annotation.is_some()
                || optional.is_some()
                || definite.is_some() =>
            {
                Some("property type")
            }
            NodeKind::FunctionDeclaration(f)
            | NodeKind::FunctionExpression(f)
            | NodeKind::ArrowFunction(f)
            | NodeKind::MethodDeclaration(f)
                if f.type_parameters.is_some() || f.return_type.is_some() =>
            {
                Some("function type")
            }
            NodeKind::ClassDeclaration(c) | NodeKind::ClassExpression(c)
                if c.type_parameters.is_some()
                    || c.implements.is_some()
                    || c.extends_type_arguments.is_some() =>
            {
                Some("class type")
            }
            NodeKind::Call {
                type_arguments: Some(_),
                ..
            }
            | NodeKind::New {
                type_arguments: Some(_),
                ..
            } => Some("type arguments"),
            _ => None,
        };
        if let Some(name) = name {
            found.push(name);
        }
        true
    });
    found
}

/// Transpile, then check that the output parses again, carries no type
/// syntax and lost no edits to overlaps
#[allow(dead_code)]
pub fn transpile_clean(source: &str, options: &TranspileOptions) -> String {
    let output = transpile_output(source, options);
    assert!(
        output.overlaps.is_empty(),
        "overlapping edits in {:?}: {:?}",
        source,
        output.overlaps
    );
    let ast = match detype::parser::parse(&output.code) {
        Ok(ast) => ast,
        Err(e) => panic!("output does not parse: {}\n---\n{}", e, output.code),
    };
    let leftover = type_syntax(&ast);
    assert!(
        leftover.is_empty(),
        "type syntax {:?} left in:\n{}",
        leftover,
        output.code
    );
    output.code
}
