//! Platform record layout
//!
//! Computes size, alignment, and field offsets for complete records the
//! way the Itanium C++ ABI lays them out on LP64: natural alignment for
//! builtins, 8-byte pointers, fields packed at the smallest correctly
//! aligned offset, total size rounded up to the record's alignment.
//! Also answers the ABI's "passable in registers" question, which is what
//! by-value passing in bindings hinges on.

use crate::ast::{DeclKind, QualType, RecordDecl, TagKind, TranslationUnit, TypeKind};

/// Layout facts for one complete record. Sizes are bytes, offsets bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    pub size: u64,
    pub alignment: u64,
    /// One entry per field, in declaration order.
    pub field_offsets: Vec<u64>,
}

/// Compute the layout of `record`, or `None` when the record (or a field's
/// type) has no complete layout.
pub fn record_layout(tu: &TranslationUnit, record: &RecordDecl) -> Option<RecordLayout> {
    if !record.is_complete {
        return None;
    }

    let mut offset_bits: u64 = 0;
    let mut max_size_bits: u64 = 0;
    let mut alignment: u64 = 1;
    let mut field_offsets = Vec::with_capacity(record.fields.len());

    for field in &record.fields {
        let (size, align) = size_and_alignment(tu, &field.ty)?;
        alignment = alignment.max(align);
        if record.tag == TagKind::Union {
            field_offsets.push(0);
            max_size_bits = max_size_bits.max(size * 8);
        } else {
            offset_bits = round_up(offset_bits, align * 8);
            field_offsets.push(offset_bits);
            offset_bits += size * 8;
        }
    }

    let used_bits = if record.tag == TagKind::Union {
        max_size_bits
    } else {
        offset_bits
    };
    let size = (round_up(used_bits, alignment * 8) / 8).max(1);

    Some(RecordLayout {
        size,
        alignment,
        field_offsets,
    })
}

/// Object size and alignment of a type, in bytes. `None` for types without
/// an object representation (`void`, function types) or with no complete
/// layout.
pub fn size_and_alignment(tu: &TranslationUnit, ty: &QualType) -> Option<(u64, u64)> {
    match &ty.kind {
        TypeKind::Builtin(b) => {
            let size = b.size_bytes()?;
            // Natural alignment throughout, including 16 for __int128.
            Some((size, size))
        }
        TypeKind::Pointer(_) | TypeKind::LValueReference(_) | TypeKind::RValueReference(_) => {
            Some((8, 8))
        }
        TypeKind::Tag { decl, .. } => {
            let decl = tu.decl(*decl)?;
            match &decl.kind {
                DeclKind::Record(record) => {
                    let layout = record_layout(tu, record)?;
                    Some((layout.size, layout.alignment))
                }
                _ => None,
            }
        }
        TypeKind::Typedef { underlying, .. } => size_and_alignment(tu, underlying),
        TypeKind::Opaque { .. } => None,
    }
}

/// The platform-ABI predicate for passing a record by value in registers.
///
/// Distinct from "trivially copyable": the `[[clang::trivial_abi]]`
/// attribute opts a record in even when its copy constructor does real
/// work. Without the attribute the record needs a usable trivial copy or
/// move constructor and a trivial destructor.
pub fn can_pass_in_registers(record: &RecordDecl) -> bool {
    if record.has_trivial_abi_attr {
        return true;
    }
    let copy = &record.copy_constructor;
    let mv = &record.move_constructor;
    let dtor = &record.destructor;
    if dtor.deleted || !dtor.trivial {
        return false;
    }
    (!copy.deleted && copy.trivial) || (!mv.deleted && mv.trivial)
}

fn round_up(value: u64, multiple: u64) -> u64 {
    value.div_ceil(multiple) * multiple
}
