//! Itanium name mangling
//!
//! Produces the platform mangled name for imported functions. Constructors
//! and destructors always use the complete-object variant (`C1`/`D1`); the
//! base and deleting variants are never emitted. Covers the type
//! vocabulary the importer supports: builtins, pointers, references,
//! cv-qualifiers, and record types, with Itanium substitution compression.

use crate::ast::{FunctionDecl, FunctionKind, QualType, TranslationUnit, TypeKind};
use crate::ast::types::BuiltinType;

/// Mangle `func` per the Itanium ABI.
pub fn mangled_name(tu: &TranslationUnit, func: &FunctionDecl) -> String {
    let mut mangler = Mangler::default();
    let mut out = String::from("_Z");
    match func.kind {
        FunctionKind::Free => {
            out.push_str(&source_name(&func.name));
        }
        FunctionKind::Method { record, .. } => {
            out.push('N');
            out.push_str(&mangler.class_name(tu, record));
            out.push_str(&source_name(&func.name));
            out.push('E');
        }
        FunctionKind::Constructor { record, .. } => {
            out.push('N');
            out.push_str(&mangler.class_name(tu, record));
            out.push_str("C1E");
        }
        FunctionKind::Destructor { record } => {
            out.push('N');
            out.push_str(&mangler.class_name(tu, record));
            out.push_str("D1E");
        }
    }
    if func.params.is_empty() {
        out.push('v');
    } else {
        for param in &func.params {
            out.push_str(&mangler.mangle_type(&param.ty, true).emitted);
        }
    }
    out
}

fn source_name(name: &str) -> String {
    format!("{}{}", name.len(), name)
}

/// One mangled component. `canonical` is the uncompressed encoding used
/// for substitution matching; `emitted` is what actually goes into the
/// symbol, with back-references applied.
struct Component {
    canonical: String,
    emitted: String,
}

impl Component {
    fn terminal(code: &str) -> Self {
        Self {
            canonical: code.to_string(),
            emitted: code.to_string(),
        }
    }
}

#[derive(Default)]
struct Mangler {
    /// Canonical encodings of substitution candidates, in first-seen order.
    substitutions: Vec<String>,
}

impl Mangler {
    /// The `<nested-name>` class component, registered as a substitution
    /// candidate.
    fn class_name(&mut self, tu: &TranslationUnit, record: crate::ast::DeclId) -> String {
        let name = tu.record_name(record).unwrap_or_default();
        self.substitutable(Component::terminal(&source_name(name))).emitted
    }

    /// Top-level parameter types drop their cv-qualifiers.
    fn mangle_type(&mut self, ty: &QualType, top_level: bool) -> Component {
        let base = match &ty.kind {
            TypeKind::Builtin(b) => Component::terminal(builtin_code(*b)),
            TypeKind::Pointer(pointee) => self.compound("P", pointee),
            TypeKind::LValueReference(pointee) => self.compound("R", pointee),
            TypeKind::RValueReference(pointee) => self.compound("O", pointee),
            // Typedefs mangle as their canonical type.
            TypeKind::Typedef { underlying, .. } => {
                return self.mangle_type(
                    &QualType {
                        kind: underlying.kind.clone(),
                        is_const: ty.is_const || underlying.is_const,
                        is_volatile: ty.is_volatile || underlying.is_volatile,
                    },
                    top_level,
                );
            }
            TypeKind::Tag { spelling, .. } | TypeKind::Opaque { spelling } => {
                self.substitutable(Component::terminal(&source_name(spelling)))
            }
        };
        if top_level {
            return base;
        }
        self.qualify(base, ty)
    }

    fn compound(&mut self, prefix: &str, pointee: &QualType) -> Component {
        let inner = self.mangle_type(pointee, false);
        self.substitutable(Component {
            canonical: format!("{prefix}{}", inner.canonical),
            emitted: format!("{prefix}{}", inner.emitted),
        })
    }

    fn qualify(&mut self, base: Component, ty: &QualType) -> Component {
        if !ty.is_const && !ty.is_volatile {
            return base;
        }
        let mut quals = String::new();
        if ty.is_volatile {
            quals.push('V');
        }
        if ty.is_const {
            quals.push('K');
        }
        self.substitutable(Component {
            canonical: format!("{quals}{}", base.canonical),
            emitted: format!("{quals}{}", base.emitted),
        })
    }

    /// Replace an already-seen component with its back-reference, or
    /// register it as a new candidate.
    fn substitutable(&mut self, component: Component) -> Component {
        if let Some(index) = self
            .substitutions
            .iter()
            .position(|s| *s == component.canonical)
        {
            return Component {
                canonical: component.canonical,
                emitted: seq_id(index),
            };
        }
        self.substitutions.push(component.canonical.clone());
        component
    }
}

/// `S_`, `S0_`, `S1_`, … with base-36 sequence numbers past the first.
fn seq_id(index: usize) -> String {
    if index == 0 {
        return "S_".to_string();
    }
    let mut n = index - 1;
    let mut digits = Vec::new();
    loop {
        let d = (n % 36) as u32;
        digits.push(char::from_digit(d, 36).unwrap_or('0').to_ascii_uppercase());
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    format!("S{}_", digits.into_iter().collect::<String>())
}

fn builtin_code(builtin: BuiltinType) -> &'static str {
    match builtin {
        BuiltinType::Void => "v",
        BuiltinType::Bool => "b",
        BuiltinType::Char => "c",
        BuiltinType::SignedChar => "a",
        BuiltinType::UnsignedChar => "h",
        BuiltinType::Short => "s",
        BuiltinType::UnsignedShort => "t",
        BuiltinType::Int => "i",
        BuiltinType::UnsignedInt => "j",
        BuiltinType::Long => "l",
        BuiltinType::UnsignedLong => "m",
        BuiltinType::LongLong => "x",
        BuiltinType::UnsignedLongLong => "y",
        BuiltinType::Int128 => "n",
        BuiltinType::UnsignedInt128 => "o",
        BuiltinType::WChar => "w",
        BuiltinType::Char16 => "Ds",
        BuiltinType::Char32 => "Di",
        BuiltinType::Float => "f",
        BuiltinType::Double => "d",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::TuBuilder;
    use crate::ast::{ConstructorKind, DeclId, DeclKind};

    fn func_of(tu: &TranslationUnit, id: u32) -> &FunctionDecl {
        match &tu.decl(DeclId(id)).unwrap().kind {
            DeclKind::Function(func) => func,
            other => panic!("not a function: {other:?}"),
        }
    }

    #[test]
    fn test_free_function_no_params() {
        let tu = TuBuilder::new("test.h").func("Foo", |_| {}).build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 0)), "_Z3Foov");
    }

    #[test]
    fn test_free_function_pointer_param() {
        let tu = TuBuilder::new("test.h")
            .func("Foo", |f| {
                f.returns(QualType::pointer_to(QualType::builtin(BuiltinType::Int)))
                    .param("a", QualType::pointer_to(QualType::builtin(BuiltinType::Int)));
            })
            .build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 0)), "_Z3FooPi");
    }

    #[test]
    fn test_const_pointee_param() {
        let tu = TuBuilder::new("test.h")
            .func("f", |f| {
                f.param(
                    "s",
                    QualType::pointer_to(QualType::builtin(BuiltinType::Char).const_()),
                );
            })
            .build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 0)), "_Z1fPKc");
    }

    #[test]
    fn test_top_level_const_is_dropped() {
        let tu = TuBuilder::new("test.h")
            .func("f", |f| {
                f.param("x", QualType::builtin(BuiltinType::Int).const_());
            })
            .build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 0)), "_Z1fi");
    }

    #[test]
    fn test_method() {
        let tu = TuBuilder::new("test.h")
            .record("S", |r| {
                r.method("Bar", |m| {
                    m.param("x", QualType::builtin(BuiltinType::Int));
                });
            })
            .build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 1)), "_ZN1S3BarEi");
    }

    #[test]
    fn test_destructor_complete_object_variant() {
        let tu = TuBuilder::new("test.h")
            .record("S", |r| {
                r.dtor(|_| {});
            })
            .build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 1)), "_ZN1SD1Ev");
    }

    #[test]
    fn test_copy_constructor_substitutes_class() {
        let tu = TuBuilder::new("test.h")
            .record("Defaulted", |r| {
                r.ctor(ConstructorKind::Copy, |c| {
                    c.param(
                        "other",
                        QualType::lvalue_ref_to(
                            QualType::record(DeclId(0), "Defaulted").const_(),
                        ),
                    );
                });
            })
            .build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 1)), "_ZN9DefaultedC1ERKS_");
    }

    #[test]
    fn test_repeated_compound_param_substitutes() {
        let ptr = || QualType::pointer_to(QualType::builtin(BuiltinType::Int));
        let tu = TuBuilder::new("test.h")
            .func("f", |f| {
                f.param("a", ptr()).param("b", ptr());
            })
            .build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 0)), "_Z1fPiS_");
    }

    #[test]
    fn test_typedef_mangles_as_underlying() {
        let tu = TuBuilder::new("test.h")
            .func("f", |f| {
                f.param(
                    "x",
                    QualType::typedef(DeclId(9), "MyInt", QualType::builtin(BuiltinType::Int)),
                );
            })
            .build();
        assert_eq!(mangled_name(&tu, func_of(&tu, 0)), "_Z1fi");
    }

    #[test]
    fn test_seq_id_sequence() {
        assert_eq!(seq_id(0), "S_");
        assert_eq!(seq_id(1), "S0_");
        assert_eq!(seq_id(2), "S1_");
        assert_eq!(seq_id(11), "SA_");
    }
}
