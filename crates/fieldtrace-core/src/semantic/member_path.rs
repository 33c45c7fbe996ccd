//! Member-path extraction
//!
//! Recovers the dotted property path consumed by a chained member access,
//! starting at an identifier or `this`. Reserved property names (structural
//! accessors like `length`) and non-literal computed access terminate
//! extraction; everything collected up to that point is kept.

use swc_common::{Span, Spanned};
use swc_ecma_ast::{Expr, Lit, MemberProp, OptChainBase};

use crate::config::TrackerConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum PathBase {
    Ident { name: String, span: Span },
    This { span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPath {
    pub base: PathBase,
    /// Ordered segments including the leading binding name or `this`.
    pub segments: Vec<String>,
    /// True when extraction stopped before consuming the whole chain.
    pub truncated: bool,
}

/// Extracts the member path rooted at `expr`. Returns `None` when the chain
/// does not bottom out at a plain identifier or `this`.
pub fn extract(expr: &Expr, config: &TrackerConfig) -> Option<ExtractedPath> {
    match expr {
        Expr::Ident(ident) => Some(ExtractedPath {
            base: PathBase::Ident {
                name: ident.sym.to_string(),
                span: ident.span,
            },
            segments: vec![ident.sym.to_string()],
            truncated: false,
        }),
        Expr::This(this) => Some(ExtractedPath {
            base: PathBase::This { span: this.span },
            segments: vec!["this".to_string()],
            truncated: false,
        }),
        Expr::Member(member) => {
            let mut inner = extract(&member.obj, config)?;
            if inner.truncated {
                return Some(inner);
            }
            match &member.prop {
                MemberProp::Ident(prop) if config.is_reserved_property(prop.sym.as_ref()) => {
                    inner.truncated = true;
                }
                MemberProp::Ident(prop) => {
                    inner.segments.push(prop.sym.to_string());
                }
                MemberProp::Computed(computed) => match &*computed.expr {
                    Expr::Lit(Lit::Str(key)) => {
                        if config.is_reserved_property(key.value.as_ref()) {
                            inner.truncated = true;
                        } else {
                            inner.segments.push(key.value.to_string());
                        }
                    }
                    _ => inner.truncated = true,
                },
                MemberProp::PrivateName(_) => inner.truncated = true,
            }
            Some(inner)
        }
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => extract(&Expr::Member(member.clone()), config),
            OptChainBase::Call(_) => None,
        },
        Expr::Paren(paren) => extract(&paren.expr, config),
        Expr::TsNonNull(assertion) => extract(&assertion.expr, config),
        Expr::TsAs(assertion) => extract(&assertion.expr, config),
        Expr::TsSatisfies(assertion) => extract(&assertion.expr, config),
        _ => None,
    }
}

/// Span of the whole chain, for diagnostics.
pub fn chain_span(expr: &Expr) -> Span {
    expr.span()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use swc_ecma_ast::{ModuleItem, Stmt};

    fn first_expr(code: &str) -> Expr {
        let parser = Parser::builder().typescript(true).jsx(true).build();
        let module = parser.parse_module(code).expect("parse failed");
        match module.body.into_iter().next() {
            Some(ModuleItem::Stmt(Stmt::Expr(stmt))) => *stmt.expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn segments(code: &str) -> Vec<String> {
        let config = TrackerConfig::default();
        extract(&first_expr(code), &config)
            .expect("no path extracted")
            .segments
    }

    #[test]
    fn single_identifier() {
        assert_eq!(segments("data;"), vec!["data"]);
    }

    #[test]
    fn dotted_chain() {
        assert_eq!(segments("data.user.name;"), vec!["data", "user", "name"]);
    }

    #[test]
    fn this_rooted_chain() {
        assert_eq!(
            segments("this.props.user;"),
            vec!["this", "props", "user"]
        );
    }

    #[test]
    fn reserved_property_terminates() {
        assert_eq!(segments("data.items.length;"), vec!["data", "items"]);

        let config = TrackerConfig::default();
        let extracted = extract(&first_expr("data.items.length;"), &config).unwrap();
        assert!(extracted.truncated);
    }

    #[test]
    fn string_literal_computed_access_is_a_segment() {
        assert_eq!(segments("data[\"user\"].name;"), vec!["data", "user", "name"]);
    }

    #[test]
    fn dynamic_computed_access_terminates() {
        assert_eq!(segments("data.rows[i].value;"), vec!["data", "rows"]);
    }

    #[test]
    fn segments_after_termination_are_dropped() {
        assert_eq!(segments("data.items.length.toString;"), vec!["data", "items"]);
    }

    #[test]
    fn optional_chain() {
        assert_eq!(segments("data?.user?.name;"), vec!["data", "user", "name"]);
    }

    #[test]
    fn call_base_yields_none() {
        let config = TrackerConfig::default();
        assert!(extract(&first_expr("load().user;"), &config).is_none());
    }
}
