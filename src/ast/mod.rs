//! Parsed C++ declarations, as handed over by the front-end
//!
//! This module is the narrow interface between the importer and whatever
//! produced the translation unit. It is a simplified, serializable view of
//! a Clang-style AST: a flat declaration table in depth-first source
//! order, a file table with raw comments, and pure services over both
//! (ordering, layout, mangling). The importer consumes this data and never
//! talks to a parser directly.

pub mod builder;
pub mod layout;
pub mod mangle;
pub mod source;
pub mod types;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ir::{AccessSpecifier, LifetimeId};
pub use builder::TuBuilder;
pub use source::{FileId, RawComment, SourceFile, SourceLoc, SourceRange};
pub use types::{BuiltinType, QualType, TypeKind};

/// Index of a declaration in the translation unit's declaration table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeclId(pub u32);

/// Where a declaration appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclContext {
    TranslationUnit,
    Namespace(DeclId),
    Record(DeclId),
    Function(DeclId),
}

/// One declaration. Redeclarations of the same entity appear as separate
/// entries sharing a `canonical` id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub id: DeclId,
    /// The front-end's representative for all redeclarations of this
    /// entity; equal to `id` for the first declaration.
    pub canonical: DeclId,
    pub context: DeclContext,
    pub range: SourceRange,
    /// Index into the owning file's comment list for the attached doc
    /// comment, if any.
    pub doc_comment: Option<u32>,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclKind {
    Function(FunctionDecl),
    Record(RecordDecl),
    Typedef(TypedefDecl),
    Namespace(NamespaceDecl),
    /// Declarations the front-end surfaces but the importer has no mapping
    /// for (using-directives, static asserts, …).
    Other,
}

impl DeclKind {
    pub fn is_namespace(&self) -> bool {
        matches!(self, Self::Namespace(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    pub name: String,
}

/// C++ constructor kind, as classified by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructorKind {
    Default,
    Copy,
    Move,
    Other,
}

/// What kind of function a declaration is, and for members, whose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Free,
    Method { record: DeclId, is_static: bool },
    Constructor { record: DeclId, kind: ConstructorKind },
    Destructor { record: DeclId },
}

impl FunctionKind {
    /// The record this function is a member of, if any.
    pub fn member_of(self) -> Option<DeclId> {
        match self {
            Self::Free => None,
            Self::Method { record, .. }
            | Self::Constructor { record, .. }
            | Self::Destructor { record } => Some(record),
        }
    }

    /// True for members called on an object: non-static methods,
    /// constructors, destructors.
    pub fn is_instance(self) -> bool {
        match self {
            Self::Free => false,
            Self::Method { is_static, .. } => !is_static,
            Self::Constructor { .. } | Self::Destructor { .. } => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Empty for unnamed parameters.
    pub name: String,
    pub ty: QualType,
}

/// Lifetime annotations for one function, as produced by the annotation
/// tool: one list per declared parameter (outermost pointer layer last),
/// plus lists for `this` and the return type, and the source names of all
/// referenced lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionLifetimes {
    pub param_lifetimes: Vec<Vec<LifetimeId>>,
    pub this_lifetimes: Vec<LifetimeId>,
    pub return_lifetimes: Vec<LifetimeId>,
    pub names: BTreeMap<LifetimeId, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Unused for constructors and destructors.
    pub name: String,
    pub kind: FunctionKind,
    pub return_type: QualType,
    pub params: Vec<ParamDecl>,
    pub is_inline: bool,
    pub is_deleted: bool,
    /// `None` for free functions; members always carry their resolved
    /// access.
    pub access: Option<AccessSpecifier>,
    pub lifetimes: Option<FunctionLifetimes>,
}

/// `struct`, `class`, or `union`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagKind {
    Struct,
    Class,
    Union,
}

impl TagKind {
    /// Access of members declared before any access specifier.
    pub fn default_access(self) -> AccessSpecifier {
        match self {
            Self::Struct | Self::Union => AccessSpecifier::Public,
            Self::Class => AccessSpecifier::Private,
        }
    }
}

/// What the front-end reports about one implicitly- or explicitly-declared
/// special member function, before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialMemberFacts {
    /// Deleted, implicitly deleted, or suppressed by another user-declared
    /// member.
    pub deleted: bool,
    /// Has a user-written body.
    pub user_provided: bool,
    /// Explicitly `= default`.
    pub defaulted: bool,
    /// Trivially generated, per the C++ rules.
    pub trivial: bool,
    /// `None` means the record's default access applies.
    pub access: Option<AccessSpecifier>,
}

impl SpecialMemberFacts {
    /// The implicit, trivially-generated member.
    pub fn implicit() -> Self {
        Self {
            deleted: false,
            user_provided: false,
            defaulted: false,
            trivial: true,
            access: None,
        }
    }

    pub fn deleted() -> Self {
        Self {
            deleted: true,
            ..Self::implicit()
        }
    }

    pub fn user_provided() -> Self {
        Self {
            user_provided: true,
            trivial: false,
            ..Self::implicit()
        }
    }

    pub fn defaulted() -> Self {
        Self {
            defaulted: true,
            ..Self::implicit()
        }
    }

    pub fn with_access(mut self, access: AccessSpecifier) -> Self {
        self.access = Some(access);
        self
    }

    pub fn nontrivial(mut self) -> Self {
        self.trivial = false;
        self
    }
}

impl Default for SpecialMemberFacts {
    fn default() -> Self {
        Self::implicit()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Empty for unnamed fields.
    pub name: String,
    pub ty: QualType,
    /// `None` means the record's default access applies.
    pub access: Option<AccessSpecifier>,
    /// Index into the owning file's comment list.
    pub doc_comment: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDecl {
    /// Empty for anonymous records.
    pub name: String,
    pub tag: TagKind,
    /// False for forward declarations.
    pub is_complete: bool,
    pub is_final: bool,
    /// Class template or template specialization.
    pub is_template: bool,
    /// Carries the `[[clang::trivial_abi]]` attribute.
    pub has_trivial_abi_attr: bool,
    pub fields: Vec<FieldDecl>,
    pub copy_constructor: SpecialMemberFacts,
    pub move_constructor: SpecialMemberFacts,
    pub destructor: SpecialMemberFacts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    pub underlying: QualType,
}

/// A parsed translation unit: everything the importer consumes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// In the order files were entered during preprocessing.
    pub files: Vec<SourceFile>,
    /// Depth-first source order.
    pub decls: Vec<Decl>,
}

impl TranslationUnit {
    pub fn decl(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.0 as usize)
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        if !id.is_valid() {
            return None;
        }
        self.files.get(id.0 as usize)
    }

    /// Name of the record behind `id`, when `id` is a record declaration.
    pub fn record_name(&self, id: DeclId) -> Option<&str> {
        match &self.decl(id)?.kind {
            DeclKind::Record(record) => Some(record.name.as_str()),
            _ => None,
        }
    }

    /// Total order over valid source locations, matching the order the
    /// preprocessor saw the tokens. Invalid locations precede valid ones.
    pub fn is_before_in_translation_unit(&self, a: SourceLoc, b: SourceLoc) -> bool {
        match (a.is_valid(), b.is_valid()) {
            (false, true) => true,
            (true, false) | (false, false) => false,
            (true, true) => a.tu_order_key() < b.tu_order_key(),
        }
    }

    /// The formatted doc comment attached to `decl`, if any.
    pub fn doc_comment(&self, decl: &Decl) -> Option<String> {
        let index = decl.doc_comment?;
        let file = self.file(decl.range.begin.file)?;
        let raw = file.comments.get(index as usize)?;
        Some(source::format_comment(&raw.text))
    }
}
