//! Record and field importer
//!
//! Records declared inside functions are skipped; nested records, unions,
//! and templates become `UnsupportedItem`s. Forward declarations pass
//! through untouched so the definition can still be imported when it
//! arrives.
//!
//! Self-referential fields work because the record is provisionally
//! inserted into the known type set before its fields are imported; a
//! failing field retracts the insertion and drops the whole record.

use crate::ast::layout::{can_pass_in_registers, record_layout};
use crate::ast::{Decl, DeclContext, FieldDecl, RecordDecl, TagKind, TranslationUnit};
use crate::importer::emit::ORDER_RECORD;
use crate::importer::{ImportError, Importer, names, special_members};
use crate::ir::{AccessSpecifier, Field, Item, Record};

pub(crate) fn import_record(ctx: &mut Importer<'_>, decl: &Decl, record: &RecordDecl) {
    if !ctx.is_from_current_target(decl) {
        return;
    }

    match decl.context {
        DeclContext::Function(_) => {
            ctx.seen_decls.insert(decl.canonical);
            return;
        }
        DeclContext::Record(_) => {
            ctx.seen_decls.insert(decl.canonical);
            ctx.push_unsupported(decl, "Nested classes are not supported yet".to_string());
            return;
        }
        DeclContext::TranslationUnit | DeclContext::Namespace(_) => {}
    }

    if record.tag == TagKind::Union {
        ctx.seen_decls.insert(decl.canonical);
        ctx.push_unsupported(decl, "Unions are not supported yet".to_string());
        return;
    }
    if record.is_template {
        ctx.seen_decls.insert(decl.canonical);
        ctx.push_unsupported(
            decl,
            "Class templates and specializations are not supported yet".to_string(),
        );
        return;
    }

    // A forward declaration: leave the canonical unmarked so the
    // definition imports when the traversal reaches it.
    if !record.is_complete {
        return;
    }
    ctx.seen_decls.insert(decl.canonical);

    let Some(identifier) = names::translate_identifier(&record.name) else {
        return;
    };
    let default_access = record.tag.default_access();

    // Provisionally known, so fields may point back at the record.
    ctx.known_type_decls.insert(decl.canonical);

    let mut fields = Vec::with_capacity(record.fields.len());
    for field in &record.fields {
        match import_field(ctx, decl, field, default_access) {
            Ok(field) => fields.push(field),
            Err(err) => {
                ctx.known_type_decls.remove(&decl.canonical);
                let shown = if field.name.is_empty() {
                    "(unnamed)"
                } else {
                    field.name.as_str()
                };
                ctx.push_unsupported(decl, format!("Field '{shown}' is not supported: {err}"));
                return;
            }
        }
    }

    let Some(layout) = record_layout(ctx.tu, record) else {
        ctx.known_type_decls.remove(&decl.canonical);
        ctx.push_unsupported(decl, ImportError::LayoutUnavailable.to_string());
        return;
    };
    for (field, offset) in fields.iter_mut().zip(&layout.field_offsets) {
        field.offset = *offset;
    }

    let item = Record {
        identifier,
        id: ctx.ir_decl_id(decl.id),
        owning_target: ctx.owning_target(decl),
        doc_comment: ctx.doc_comment(decl),
        fields,
        size: layout.size,
        alignment: layout.alignment,
        copy_constructor: special_members::classify(&record.copy_constructor, default_access),
        move_constructor: special_members::classify(&record.move_constructor, default_access),
        destructor: special_members::classify(&record.destructor, default_access),
        is_trivial_abi: can_pass_in_registers(record),
        is_final: record.is_final,
    };
    ctx.push_item(decl.range.begin, ORDER_RECORD, Item::Record(item));
}

/// Offsets are filled in from the record layout after all fields import.
fn import_field(
    ctx: &Importer<'_>,
    decl: &Decl,
    field: &FieldDecl,
    default_access: AccessSpecifier,
) -> Result<Field, ImportError> {
    let ty = ctx.map_type(&field.ty, None, true)?;
    let identifier =
        names::translate_identifier(&field.name).ok_or(ImportError::UnresolvableName)?;
    Ok(Field {
        identifier,
        doc_comment: field_doc_comment(ctx.tu, decl, field),
        ty,
        access: field.access.unwrap_or(default_access),
        offset: 0,
    })
}

fn field_doc_comment(tu: &TranslationUnit, decl: &Decl, field: &FieldDecl) -> Option<String> {
    let index = field.doc_comment?;
    let file = tu.file(decl.range.begin.file)?;
    let raw = file.comments.get(index as usize)?;
    Some(crate::ast::source::format_comment(&raw.text))
}
