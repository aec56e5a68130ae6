//! C++ type to dual-sided mapped type translation
//!
//! Pure translation from a qualified C++ type to a [`MappedType`] whose
//! C++ and target-language sides are built in lockstep, so they can never
//! diverge structurally.
//!
//! Priority order: the well-known standard type table wins over
//! everything (no desugaring: `int32_t` stays `int32_t`, it does not
//! decay to `int`); then pointers and references, peeling one annotated
//! lifetime per layer off the back of the lifetime stack; then builtins
//! by signedness and width; then record and alias types that have already
//! been imported. Anything else is an error carrying the offending
//! spelling.

use std::collections::HashSet;

use crate::ast::types::BuiltinType;
use crate::ast::{DeclId, QualType, TranslationUnit, TypeKind};
use crate::importer::ImportError;
use crate::ir::{LifetimeId, MappedType};

/// Target-language name for a well-known C++ standard type spelling, or
/// `None` when the spelling is not in the table.
///
/// The table is authoritative: a spelling listed here never reaches
/// builtin desugaring, so `std::size_t` maps to `usize` even though the
/// underlying builtin would map to `u64`.
pub(crate) fn well_known_rs_name(spelling: &str) -> Option<&'static str> {
    Some(match spelling {
        "ptrdiff_t" | "intptr_t" | "std::ptrdiff_t" | "std::intptr_t" => "isize",
        "size_t" | "uintptr_t" | "std::size_t" | "std::uintptr_t" => "usize",
        "int8_t" | "std::int8_t" => "i8",
        "int16_t" | "std::int16_t" => "i16",
        "int32_t" | "std::int32_t" => "i32",
        "int64_t" | "std::int64_t" => "i64",
        "uint8_t" | "std::uint8_t" => "u8",
        "uint16_t" | "std::uint16_t" => "u16",
        "uint32_t" | "std::uint32_t" => "u32",
        "uint64_t" | "std::uint64_t" => "u64",
        "char16_t" => "u16",
        "char32_t" => "u32",
        "wchar_t" => "i32",
        _ => return None,
    })
}

/// Translate `ty`. `lifetimes`, when present, is consumed from the back
/// as pointer and reference layers are peeled. `nullable` applies to the
/// outermost pointer only; inner recursions are non-nullable.
pub(crate) fn map_qual_type(
    tu: &TranslationUnit,
    known_type_decls: &HashSet<DeclId>,
    ty: &QualType,
    lifetimes: Option<&mut Vec<LifetimeId>>,
    nullable: bool,
) -> Result<MappedType, ImportError> {
    let mut mapped = map_unqualified(tu, known_type_decls, ty, lifetimes, nullable)?;
    // Const-qualification lives on the C++ side only; volatile is ignored.
    mapped.cc_type.is_const = ty.is_const;
    Ok(mapped)
}

fn map_unqualified(
    tu: &TranslationUnit,
    known_type_decls: &HashSet<DeclId>,
    ty: &QualType,
    mut lifetimes: Option<&mut Vec<LifetimeId>>,
    nullable: bool,
) -> Result<MappedType, ImportError> {
    if let Some(spelling) = ty.kind.spelling_token() {
        if let Some(rs_name) = well_known_rs_name(spelling) {
            return Ok(MappedType::simple(spelling, rs_name));
        }
    }

    match &ty.kind {
        TypeKind::Pointer(pointee) => {
            let lifetime = lifetimes.as_mut().and_then(|l| l.pop());
            let pointee = map_qual_type(
                tu,
                known_type_decls,
                pointee,
                lifetimes.as_mut().map(|l| &mut **l),
                false,
            )?;
            Ok(MappedType::pointer_to(pointee, lifetime, nullable))
        }
        TypeKind::LValueReference(pointee) => {
            let lifetime = lifetimes.as_mut().and_then(|l| l.pop());
            let pointee = map_qual_type(
                tu,
                known_type_decls,
                pointee,
                lifetimes.as_mut().map(|l| &mut **l),
                false,
            )?;
            Ok(MappedType::lvalue_ref_to(pointee, lifetime))
        }
        TypeKind::Builtin(builtin) => map_builtin(*builtin, ty),
        TypeKind::Tag { decl, .. } => {
            let canonical = canonical_of(tu, *decl);
            if !known_type_decls.contains(&canonical) {
                return Err(ImportError::unsupported_type(ty));
            }
            let name = tu
                .record_name(canonical)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| ImportError::unsupported_type(ty))?;
            Ok(MappedType::with_decl_id(
                name,
                crate::ir::DeclId(canonical.0 as u64),
            ))
        }
        TypeKind::Typedef { decl, spelling, .. } => {
            // Undesugared: the alias must itself have been imported.
            let canonical = canonical_of(tu, *decl);
            if !known_type_decls.contains(&canonical) {
                return Err(ImportError::unsupported_type(ty));
            }
            Ok(MappedType::with_decl_id(
                spelling.clone(),
                crate::ir::DeclId(canonical.0 as u64),
            ))
        }
        TypeKind::RValueReference(_) | TypeKind::Opaque { .. } => {
            Err(ImportError::unsupported_type(ty))
        }
    }
}

fn map_builtin(builtin: BuiltinType, ty: &QualType) -> Result<MappedType, ImportError> {
    let rs_name = match builtin {
        BuiltinType::Void => return Ok(MappedType::void()),
        BuiltinType::Bool => "bool",
        BuiltinType::Float => "f32",
        BuiltinType::Double => "f64",
        _ => {
            let signed = builtin.is_signed_integer();
            match (builtin.bit_width(), signed) {
                (Some(8), true) => "i8",
                (Some(16), true) => "i16",
                (Some(32), true) => "i32",
                (Some(64), true) => "i64",
                (Some(8), false) => "u8",
                (Some(16), false) => "u16",
                (Some(32), false) => "u32",
                (Some(64), false) => "u64",
                // 128-bit and any future exotic widths.
                _ => return Err(ImportError::unsupported_type(ty)),
            }
        }
    };
    Ok(MappedType::simple(builtin.spelling(), rs_name))
}

fn canonical_of(tu: &TranslationUnit, id: DeclId) -> DeclId {
    tu.decl(id).map(|d| d.canonical).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::TuBuilder;

    fn map(ty: &QualType) -> Result<MappedType, ImportError> {
        let tu = TranslationUnit::default();
        map_qual_type(&tu, &HashSet::new(), ty, None, true)
    }

    #[test]
    fn test_builtin_int() {
        let mapped = map(&QualType::builtin(BuiltinType::Int)).unwrap();
        assert_eq!(mapped.cc_type.name, "int");
        assert_eq!(mapped.rs_type.name, "i32");
    }

    #[test]
    fn test_builtin_integer_law() {
        let cases = [
            (BuiltinType::Char, "i8"),
            (BuiltinType::SignedChar, "i8"),
            (BuiltinType::UnsignedChar, "u8"),
            (BuiltinType::Short, "i16"),
            (BuiltinType::UnsignedShort, "u16"),
            (BuiltinType::Int, "i32"),
            (BuiltinType::UnsignedInt, "u32"),
            (BuiltinType::Long, "i64"),
            (BuiltinType::UnsignedLong, "u64"),
            (BuiltinType::LongLong, "i64"),
            (BuiltinType::UnsignedLongLong, "u64"),
        ];
        for (builtin, expected) in cases {
            let mapped = map(&QualType::builtin(builtin)).unwrap();
            assert_eq!(mapped.rs_type.name, expected, "{builtin:?}");
            assert_eq!(mapped.cc_type.name, builtin.spelling());
        }
    }

    #[test]
    fn test_int128_is_unsupported() {
        let err = map(&QualType::builtin(BuiltinType::Int128)).unwrap_err();
        assert_eq!(
            err,
            ImportError::UnsupportedType {
                spelling: "__int128".to_string()
            }
        );
    }

    #[test]
    fn test_bool_float_double_void() {
        assert_eq!(map(&QualType::builtin(BuiltinType::Bool)).unwrap().rs_type.name, "bool");
        assert_eq!(map(&QualType::builtin(BuiltinType::Float)).unwrap().rs_type.name, "f32");
        assert_eq!(map(&QualType::builtin(BuiltinType::Double)).unwrap().rs_type.name, "f64");
        assert!(map(&QualType::builtin(BuiltinType::Void)).unwrap().is_void());
    }

    #[test]
    fn test_well_known_table_beats_builtins() {
        // char16_t is a builtin, but the table answers first.
        let mapped = map(&QualType::builtin(BuiltinType::Char16)).unwrap();
        assert_eq!(mapped.cc_type.name, "char16_t");
        assert_eq!(mapped.rs_type.name, "u16");
        assert_eq!(map(&QualType::builtin(BuiltinType::WChar)).unwrap().rs_type.name, "i32");
    }

    #[test]
    fn test_well_known_typedef_is_not_desugared() {
        // std::size_t spelled in source maps straight to usize, keeping
        // the original spelling on the C++ side.
        let ty = QualType::typedef(
            DeclId(0),
            "std::size_t",
            QualType::builtin(BuiltinType::UnsignedLong),
        );
        let mapped = map(&ty).unwrap();
        assert_eq!(mapped.cc_type.name, "std::size_t");
        assert_eq!(mapped.rs_type.name, "usize");
        assert_eq!(mapped.cc_type.decl_id, None);
    }

    #[test]
    fn test_all_well_known_spellings() {
        let cases = [
            ("ptrdiff_t", "isize"),
            ("intptr_t", "isize"),
            ("std::ptrdiff_t", "isize"),
            ("std::intptr_t", "isize"),
            ("size_t", "usize"),
            ("uintptr_t", "usize"),
            ("std::size_t", "usize"),
            ("std::uintptr_t", "usize"),
            ("int8_t", "i8"),
            ("int16_t", "i16"),
            ("int32_t", "i32"),
            ("int64_t", "i64"),
            ("std::int8_t", "i8"),
            ("std::int16_t", "i16"),
            ("std::int32_t", "i32"),
            ("std::int64_t", "i64"),
            ("uint8_t", "u8"),
            ("uint16_t", "u16"),
            ("uint32_t", "u32"),
            ("uint64_t", "u64"),
            ("std::uint8_t", "u8"),
            ("std::uint16_t", "u16"),
            ("std::uint32_t", "u32"),
            ("std::uint64_t", "u64"),
            ("char16_t", "u16"),
            ("char32_t", "u32"),
            ("wchar_t", "i32"),
        ];
        for (spelling, expected) in cases {
            assert_eq!(well_known_rs_name(spelling), Some(expected), "{spelling}");
        }
        assert_eq!(well_known_rs_name("int"), None);
        assert_eq!(well_known_rs_name("std::string"), None);
    }

    #[test]
    fn test_pointer_wraps_in_lockstep() {
        let ty = QualType::pointer_to(QualType::builtin(BuiltinType::Int));
        let mapped = map(&ty).unwrap();
        assert_eq!(mapped.cc_type.name, "*");
        assert_eq!(mapped.rs_type.name, "*mut");
        assert_eq!(mapped.cc_type.type_params.len(), 1);
        assert_eq!(mapped.rs_type.type_params.len(), 1);
        assert_eq!(mapped.cc_type.type_params[0].name, "int");
        assert_eq!(mapped.rs_type.type_params[0].name, "i32");
    }

    #[test]
    fn test_pointer_to_const_is_star_const() {
        let ty = QualType::pointer_to(QualType::builtin(BuiltinType::Int).const_());
        let mapped = map(&ty).unwrap();
        assert_eq!(mapped.rs_type.name, "*const");
        assert!(mapped.cc_type.type_params[0].is_const);
    }

    #[test]
    fn test_outer_const_lands_on_cc_side_only() {
        let ty = QualType::pointer_to(QualType::builtin(BuiltinType::Int)).const_();
        let mapped = map(&ty).unwrap();
        assert!(mapped.cc_type.is_const);
        // Mutability of the rs pointer tracks the pointee, not the pointer.
        assert_eq!(mapped.rs_type.name, "*mut");
    }

    #[test]
    fn test_volatile_is_ignored() {
        let mapped = map(&QualType::builtin(BuiltinType::Int).volatile()).unwrap();
        assert!(!mapped.cc_type.is_const);
        assert_eq!(mapped.rs_type.name, "i32");
    }

    #[test]
    fn test_lvalue_reference() {
        let ty = QualType::lvalue_ref_to(QualType::builtin(BuiltinType::Int));
        let mapped = map(&ty).unwrap();
        assert_eq!(mapped.cc_type.name, "&");
        assert_eq!(mapped.rs_type.name, "&mut");
        let const_ref = QualType::lvalue_ref_to(QualType::builtin(BuiltinType::Int).const_());
        assert_eq!(map(&const_ref).unwrap().rs_type.name, "&");
    }

    #[test]
    fn test_rvalue_reference_is_unsupported() {
        let ty = QualType::new(TypeKind::RValueReference(Box::new(QualType::builtin(
            BuiltinType::Int,
        ))));
        assert!(map(&ty).is_err());
    }

    #[test]
    fn test_lifetime_stack_consumed_from_the_back() {
        let tu = TranslationUnit::default();
        let ty = QualType::pointer_to(QualType::pointer_to(QualType::builtin(BuiltinType::Int)));
        let mut stack = vec![LifetimeId(1), LifetimeId(2)];
        let mapped =
            map_qual_type(&tu, &HashSet::new(), &ty, Some(&mut stack), true).unwrap();
        assert!(stack.is_empty());
        // Outermost layer pops the tail.
        assert_eq!(mapped.rs_type.lifetime_args, vec![LifetimeId(2)]);
        assert_eq!(
            mapped.rs_type.type_params[0].lifetime_args,
            vec![LifetimeId(1)]
        );
    }

    #[test]
    fn test_known_record_maps_with_decl_id() {
        let tu = TuBuilder::new("test.h").record("S", |_| {}).build();
        let mut known = HashSet::new();
        known.insert(DeclId(0));
        let ty = QualType::record(DeclId(0), "S");
        let mapped = map_qual_type(&tu, &known, &ty, None, true).unwrap();
        assert_eq!(mapped.cc_type.name, "S");
        assert_eq!(mapped.rs_type.name, "S");
        assert_eq!(mapped.cc_type.decl_id, Some(crate::ir::DeclId(0)));
        assert_eq!(mapped.rs_type.decl_id, Some(crate::ir::DeclId(0)));
    }

    #[test]
    fn test_unknown_record_is_unsupported() {
        let tu = TuBuilder::new("test.h").record("S", |_| {}).build();
        let ty = QualType::record(DeclId(0), "S");
        let err = map_qual_type(&tu, &HashSet::new(), &ty, None, true).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedType { .. }));
    }

    #[test]
    fn test_redeclared_record_resolves_to_canonical() {
        let tu = TuBuilder::new("test.h")
            .fwd_record("S")
            .record("S", |_| {})
            .build();
        let mut known = HashSet::new();
        known.insert(DeclId(0)); // canonical is the forward declaration
        // A type reference through the definition still resolves.
        let ty = QualType::record(DeclId(1), "S");
        let mapped = map_qual_type(&tu, &known, &ty, None, true).unwrap();
        assert_eq!(mapped.cc_type.decl_id, Some(crate::ir::DeclId(0)));
    }
}
