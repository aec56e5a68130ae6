//! Declaration name translation
//!
//! Ordinary names pass through as identifiers; constructors and
//! destructors become sentinels; unnamed parameters are synthesized as
//! `__param_0`, `__param_1`, … An empty name anywhere else is a failure.

use crate::ast::{Decl, DeclContext, DeclKind, FunctionDecl, FunctionKind, TranslationUnit};
use crate::importer::ImportError;
use crate::ir::{Identifier, UnqualifiedIdentifier};

/// Translate an ordinary declaration name. `None` for empty spellings.
pub(crate) fn translate_identifier(spelling: &str) -> Option<Identifier> {
    if spelling.is_empty() {
        None
    } else {
        Some(Identifier::new(spelling))
    }
}

/// Parameter names: synthesized for unnamed parameters so downstream
/// codegen is total.
pub(crate) fn param_identifier(spelling: &str, index: usize) -> Identifier {
    match translate_identifier(spelling) {
        Some(id) => id,
        None => Identifier::new(format!("__param_{index}")),
    }
}

/// The IR name of a function: sentinels for constructors and destructors,
/// an identifier otherwise.
pub(crate) fn function_name(func: &FunctionDecl) -> Result<UnqualifiedIdentifier, ImportError> {
    match func.kind {
        FunctionKind::Constructor { .. } => Ok(UnqualifiedIdentifier::Constructor),
        FunctionKind::Destructor { .. } => Ok(UnqualifiedIdentifier::Destructor),
        FunctionKind::Free | FunctionKind::Method { .. } => translate_identifier(&func.name)
            .map(UnqualifiedIdentifier::Identifier)
            .ok_or(ImportError::UnresolvableName),
    }
}

/// Human-readable qualified name for diagnostics (`ns::Record::method`).
pub(crate) fn qualified_name(tu: &TranslationUnit, decl: &Decl) -> String {
    let base = match &decl.kind {
        DeclKind::Function(func) => {
            let record_name = |id| tu.record_name(id).unwrap_or("").to_string();
            match func.kind {
                FunctionKind::Free => func.name.clone(),
                FunctionKind::Method { record, .. } => {
                    format!("{}::{}", record_name(record), func.name)
                }
                FunctionKind::Constructor { record, .. } => {
                    let name = record_name(record);
                    format!("{name}::{name}")
                }
                FunctionKind::Destructor { record } => {
                    let name = record_name(record);
                    format!("{name}::~{name}")
                }
            }
        }
        DeclKind::Record(record) if record.name.is_empty() => "(anonymous record)".to_string(),
        DeclKind::Record(record) => record.name.clone(),
        DeclKind::Typedef(typedef) => typedef.name.clone(),
        DeclKind::Namespace(ns) => ns.name.clone(),
        DeclKind::Other => "(unknown)".to_string(),
    };

    let mut parts = Vec::new();
    let mut context = decl.context;
    while let DeclContext::Namespace(id) = context {
        let Some(ns_decl) = tu.decl(id) else { break };
        if let DeclKind::Namespace(ns) = &ns_decl.kind {
            parts.push(ns.name.clone());
        }
        context = ns_decl.context;
    }
    parts.reverse();
    if parts.is_empty() {
        base
    } else {
        format!("{}::{base}", parts.join("::"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::TuBuilder;

    #[test]
    fn test_translate_identifier() {
        assert_eq!(translate_identifier("foo"), Some(Identifier::new("foo")));
        assert_eq!(translate_identifier(""), None);
    }

    #[test]
    fn test_param_identifier_synthesis() {
        assert_eq!(param_identifier("a", 0), Identifier::new("a"));
        assert_eq!(param_identifier("", 0), Identifier::new("__param_0"));
        assert_eq!(param_identifier("", 3), Identifier::new("__param_3"));
    }

    #[test]
    fn test_qualified_name_in_namespace() {
        let tu = TuBuilder::new("test.h")
            .namespace("outer", |n| {
                n.func("f", |_| {});
            })
            .build();
        assert_eq!(qualified_name(&tu, &tu.decls[1]), "outer::f");
    }

    #[test]
    fn test_qualified_name_of_member() {
        let tu = TuBuilder::new("test.h")
            .record("S", |r| {
                r.method("get", |_| {}).dtor(|_| {});
            })
            .build();
        assert_eq!(qualified_name(&tu, &tu.decls[1]), "S::get");
        assert_eq!(qualified_name(&tu, &tu.decls[2]), "S::~S");
    }
}
