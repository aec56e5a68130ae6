//! C++ types as written in source
//!
//! Types are kept undesugared: a typedef reference carries its underlying
//! type but is not resolved through, so spelling-based handling (the
//! well-known standard type table) sees what the header author wrote.

use serde::{Deserialize, Serialize};

use crate::ast::DeclId;

/// A C++ builtin type. Widths follow the LP64 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinType {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int128,
    UnsignedInt128,
    WChar,
    Char16,
    Char32,
    Float,
    Double,
}

impl BuiltinType {
    pub fn spelling(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::SignedChar => "signed char",
            Self::UnsignedChar => "unsigned char",
            Self::Short => "short",
            Self::UnsignedShort => "unsigned short",
            Self::Int => "int",
            Self::UnsignedInt => "unsigned int",
            Self::Long => "long",
            Self::UnsignedLong => "unsigned long",
            Self::LongLong => "long long",
            Self::UnsignedLongLong => "unsigned long long",
            Self::Int128 => "__int128",
            Self::UnsignedInt128 => "unsigned __int128",
            Self::WChar => "wchar_t",
            Self::Char16 => "char16_t",
            Self::Char32 => "char32_t",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Void | Self::Bool | Self::Float | Self::Double)
    }

    /// Signedness of integer builtins. Plain `char` is signed on this
    /// platform; `wchar_t` is signed, the `charN_t` types are not.
    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::SignedChar
                | Self::Short
                | Self::Int
                | Self::Long
                | Self::LongLong
                | Self::Int128
                | Self::WChar
        )
    }

    /// Bit width of integer builtins; `None` for non-integers.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            Self::Char | Self::SignedChar | Self::UnsignedChar => Some(8),
            Self::Short | Self::UnsignedShort | Self::Char16 => Some(16),
            Self::Int | Self::UnsignedInt | Self::WChar | Self::Char32 => Some(32),
            Self::Long | Self::UnsignedLong | Self::LongLong | Self::UnsignedLongLong => Some(64),
            Self::Int128 | Self::UnsignedInt128 => Some(128),
            Self::Void | Self::Bool | Self::Float | Self::Double => None,
        }
    }

    /// Object size in bytes; `None` for `void`.
    pub fn size_bytes(self) -> Option<u64> {
        match self {
            Self::Void => None,
            Self::Bool | Self::Char | Self::SignedChar | Self::UnsignedChar => Some(1),
            Self::Short | Self::UnsignedShort | Self::Char16 => Some(2),
            Self::Int | Self::UnsignedInt | Self::WChar | Self::Char32 | Self::Float => Some(4),
            Self::Long
            | Self::UnsignedLong
            | Self::LongLong
            | Self::UnsignedLongLong
            | Self::Double => Some(8),
            Self::Int128 | Self::UnsignedInt128 => Some(16),
        }
    }
}

/// Shape of a type, one layer deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Builtin(BuiltinType),
    Pointer(Box<QualType>),
    LValueReference(Box<QualType>),
    RValueReference(Box<QualType>),
    /// Reference to a struct/class/union/enum declaration.
    Tag { decl: DeclId, spelling: String },
    /// Undesugared typedef reference.
    Typedef {
        decl: DeclId,
        spelling: String,
        underlying: Box<QualType>,
    },
    /// A type the front-end surfaces only as its spelling (function types,
    /// member pointers, template specializations).
    Opaque { spelling: String },
}

impl TypeKind {
    /// The single-token spelling used for table lookups, when the type has
    /// one. Pointers and references do not.
    pub fn spelling_token(&self) -> Option<&str> {
        match self {
            Self::Builtin(b) => Some(b.spelling()),
            Self::Tag { spelling, .. } | Self::Typedef { spelling, .. } => Some(spelling),
            _ => None,
        }
    }
}

/// A type together with its cv-qualifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualType {
    pub kind: TypeKind,
    pub is_const: bool,
    pub is_volatile: bool,
}

impl QualType {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            is_const: false,
            is_volatile: false,
        }
    }

    pub fn builtin(builtin: BuiltinType) -> Self {
        Self::new(TypeKind::Builtin(builtin))
    }

    pub fn pointer_to(pointee: QualType) -> Self {
        Self::new(TypeKind::Pointer(Box::new(pointee)))
    }

    pub fn lvalue_ref_to(pointee: QualType) -> Self {
        Self::new(TypeKind::LValueReference(Box::new(pointee)))
    }

    pub fn record(decl: DeclId, spelling: impl Into<String>) -> Self {
        Self::new(TypeKind::Tag {
            decl,
            spelling: spelling.into(),
        })
    }

    pub fn typedef(decl: DeclId, spelling: impl Into<String>, underlying: QualType) -> Self {
        Self::new(TypeKind::Typedef {
            decl,
            spelling: spelling.into(),
            underlying: Box::new(underlying),
        })
    }

    pub fn const_(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn volatile(mut self) -> Self {
        self.is_volatile = true;
        self
    }

    /// Full spelling including qualifiers, for error messages.
    pub fn spelling(&self) -> String {
        let base = match &self.kind {
            TypeKind::Builtin(b) => b.spelling().to_string(),
            TypeKind::Pointer(pointee) => format!("{} *", pointee.spelling()),
            TypeKind::LValueReference(pointee) => format!("{} &", pointee.spelling()),
            TypeKind::RValueReference(pointee) => format!("{} &&", pointee.spelling()),
            TypeKind::Tag { spelling, .. }
            | TypeKind::Typedef { spelling, .. }
            | TypeKind::Opaque { spelling } => spelling.clone(),
        };
        match (self.is_const, self.is_volatile) {
            (true, true) => format!("const volatile {base}"),
            (true, false) => format!("const {base}"),
            (false, true) => format!("volatile {base}"),
            (false, false) => base,
        }
    }
}
