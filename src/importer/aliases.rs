//! Type alias importer
//!
//! Aliases nested in functions are skipped, aliases nested in records are
//! unsupported, and spellings the well-known table already covers are
//! absorbed by the type mapper (no item). Everything else becomes a
//! `TypeAlias` whose canonical declaration joins the known type set, so
//! later types may reference the alias without desugaring.

use crate::ast::{Decl, DeclContext, TypedefDecl};
use crate::importer::emit::ORDER_OTHER;
use crate::importer::{Importer, names, type_mapper};
use crate::ir::{Item, TypeAlias};

pub(crate) fn import_typedef(ctx: &mut Importer<'_>, decl: &Decl, typedef: &TypedefDecl) {
    if !ctx.is_from_current_target(decl) {
        return;
    }

    match decl.context {
        DeclContext::Function(_) => return,
        DeclContext::Record(_) => {
            ctx.push_unsupported(
                decl,
                "Typedefs nested in classes are not supported yet".to_string(),
            );
            return;
        }
        DeclContext::TranslationUnit | DeclContext::Namespace(_) => {}
    }

    // The mapper resolves these spellings by table; an alias item would
    // only shadow it.
    if type_mapper::well_known_rs_name(&typedef.name).is_some() {
        return;
    }

    let Some(identifier) = names::translate_identifier(&typedef.name) else {
        return;
    };

    match ctx.map_type(&typedef.underlying, None, true) {
        Ok(underlying_type) => {
            ctx.known_type_decls.insert(decl.canonical);
            let item = TypeAlias {
                identifier,
                id: ctx.ir_decl_id(decl.id),
                owning_target: ctx.owning_target(decl),
                doc_comment: ctx.doc_comment(decl),
                underlying_type,
            };
            ctx.push_item(decl.range.begin, ORDER_OTHER, Item::TypeAlias(item));
        }
        Err(err) => ctx.push_unsupported(decl, err.to_string()),
    }
}
