use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::path::Path;

use crate::types::{SpecKind, Specifier};

/// Parse `src` and return every runtime module request it makes.
///
/// Type-only imports are skipped. `require()` and `import()` calls are found
/// in top-level expression statements and variable initializers.
pub fn imports_in_source(file: &Path, src: &str) -> Vec<Specifier> {
    trace!("Parsing file for imports: {}", file.display());
    let st = source_type_for(file);
    let allocator = Allocator::default();
    let ParserReturn { program, .. } = OxcParser::new(&allocator, src, st).parse();

    let mut specs: Vec<Specifier> = Vec::new();

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                if decl.import_kind.is_type() {
                    trace!("Skipping type-only import declaration in {}", file.display());
                    continue;
                }

                // import { type Foo, bar } still loads the module at runtime
                let has_runtime_import = if let Some(specifiers) = &decl.specifiers {
                    specifiers.iter().any(|spec| match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => !s.import_kind.is_type(),
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => true,
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => true,
                    })
                } else {
                    // import 'side-effect'
                    true
                };

                if has_runtime_import {
                    let req = decl.source.value.to_string();
                    trace!("Found static import: '{}' in {}", req, file.display());
                    specs.push(Specifier { request: req, kind: SpecKind::Static });
                }
            }
            Statement::ExpressionStatement(es) => {
                extract_require_from_expression(&es.expression, &mut specs);
            }
            Statement::VariableDeclaration(vd) => {
                for decl in &vd.declarations {
                    if let Some(init) = &decl.init {
                        extract_require_from_expression(init, &mut specs);
                    }
                }
            }
            _ => {}
        }
    }

    debug!("Found {} import specifiers in {}", specs.len(), file.display());
    specs
}

fn extract_require_from_expression(expr: &Expression, specs: &mut Vec<Specifier>) {
    match expr {
        Expression::CallExpression(ce) => {
            if let Expression::Identifier(callee_ident) = &ce.callee
                && callee_ident.name.as_str() == "require"
                && !ce.arguments.is_empty()
                && let Some(Expression::StringLiteral(sl)) = ce.arguments[0].as_expression()
            {
                trace!("Found require() call: '{}'", sl.value);
                specs.push(Specifier { request: sl.value.to_string(), kind: SpecKind::Static });
            }
            for arg in &ce.arguments {
                if let Some(arg_expr) = arg.as_expression() {
                    extract_require_from_expression(arg_expr, specs);
                }
            }
            extract_require_from_expression(&ce.callee, specs);
        }
        Expression::ImportExpression(ie) => {
            if let Expression::StringLiteral(sl) = &ie.source {
                trace!("Found dynamic import(): '{}'", sl.value);
                specs.push(Specifier { request: sl.value.to_string(), kind: SpecKind::Dynamic });
            }
        }
        Expression::ArrowFunctionExpression(af) => {
            // dynamic(() => import('x'))
            if af.expression
                && let Some(Statement::ExpressionStatement(es)) = af.body.statements.first()
            {
                extract_require_from_expression(&es.expression, specs);
            }
        }
        Expression::ConditionalExpression(ce) => {
            extract_require_from_expression(&ce.test, specs);
            extract_require_from_expression(&ce.consequent, specs);
            extract_require_from_expression(&ce.alternate, specs);
        }
        Expression::AssignmentExpression(ae) => {
            extract_require_from_expression(&ae.right, specs);
        }
        Expression::ParenthesizedExpression(pe) => {
            extract_require_from_expression(&pe.expression, specs);
        }
        _ => {}
    }
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx") | Some("js")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")))
        .with_module(true);

    // .cjs/.cts are CommonJS scripts
    if matches!(ext, Some("cjs") | Some("cts")) {
        st = st.with_module(false);
    }

    st
}
