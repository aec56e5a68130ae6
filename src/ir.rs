//! Intermediate Representation (IR) for imported C++ declarations
//!
//! The IR layer decouples the importer from binding code generation. It
//! represents only the information a binding generator needs, not the full
//! C++ AST: functions, records, type aliases, floating comments, and the
//! declarations that could not be imported. The whole artifact serializes
//! to JSON and is consumed downstream by value.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// Name of a public header re-exported by the generated bindings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderName(pub String);

impl HeaderName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque build label, e.g. `//foo/bar:baz`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque integer identifying a canonical declaration within one
/// translation unit. Any injective mapping from canonical declarations
/// works; the importer uses the declaration's index in the front-end's
/// declaration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u64);

/// Identifies one lifetime within a translation unit. Stable across all
/// uses of the same lifetime in one function's annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LifetimeId(pub u32);

/// A named lifetime parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    pub name: String,
    pub id: LifetimeId,
}

/// An ordinary identifier, valid in both C++ and the target language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A function name. Constructors and destructors are sentinels rather than
/// strings so they cannot collide with user-defined functions that happen
/// to be called `constructor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnqualifiedIdentifier {
    Identifier(Identifier),
    Constructor,
    Destructor,
}

impl fmt::Display for UnqualifiedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(id) => f.write_str(&id.0),
            Self::Constructor => f.write_str("(constructor)"),
            Self::Destructor => f.write_str("(destructor)"),
        }
    }
}

/// C++ member access.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessSpecifier {
    #[strum(serialize = "public")]
    Public,
    #[strum(serialize = "protected")]
    Protected,
    #[strum(serialize = "private")]
    Private,
}

impl AccessSpecifier {
    /// Zero-allocation string representation.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for AccessSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a special member function is defined, as far as callers care:
/// callable and trivial, callable but with user-visible work, or not
/// callable at all.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum SpecialMemberDefinition {
    #[strum(serialize = "trivial")]
    Trivial,
    #[strum(serialize = "nontrivial")]
    Nontrivial,
    #[strum(serialize = "deleted")]
    Deleted,
}

impl SpecialMemberDefinition {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for SpecialMemberDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition status and access of one special member function
/// (copy constructor, move constructor, or destructor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialMemberFunc {
    pub definition: SpecialMemberDefinition,
    pub access: AccessSpecifier,
}

/// Source position of a declaration. Filenames are normalized: a leading
/// `"./"` is stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

// --- Types ---

/// The C++ side of a mapped type. Pointers and references use the names
/// `"*"` and `"&"` with the pointee as their single type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcType {
    pub name: String,
    pub is_const: bool,
    pub type_params: Vec<CcType>,
    pub decl_id: Option<DeclId>,
}

/// The target-language side of a mapped type. Pointers use `"*mut"` /
/// `"*const"`, references `"&mut"` / `"&"`; both carry the pointee as
/// their single type parameter and the layer's lifetime, when one was
/// annotated, in `lifetime_args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsType {
    pub name: String,
    pub lifetime_args: Vec<LifetimeId>,
    pub type_params: Vec<RsType>,
    pub decl_id: Option<DeclId>,
}

/// Paired C++-side and target-side descriptions of the same abstract type.
///
/// Invariant: the two sides are structurally parallel. Both are pointers
/// (with parallel pointees) or both are not; their `type_params` have the
/// same arity at every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedType {
    pub cc_type: CcType,
    pub rs_type: RsType,
}

impl MappedType {
    /// A leaf type with no declaration behind it (builtins, well-known
    /// standard types).
    pub fn simple(cc_name: impl Into<String>, rs_name: impl Into<String>) -> Self {
        Self {
            cc_type: CcType {
                name: cc_name.into(),
                is_const: false,
                type_params: vec![],
                decl_id: None,
            },
            rs_type: RsType {
                name: rs_name.into(),
                lifetime_args: vec![],
                type_params: vec![],
                decl_id: None,
            },
        }
    }

    /// A reference to an imported declaration (record or type alias). Both
    /// sides carry the same `DeclId`.
    pub fn with_decl_id(name: impl Into<String>, id: DeclId) -> Self {
        let name = name.into();
        let mut mapped = Self::simple(name.clone(), name);
        mapped.cc_type.decl_id = Some(id);
        mapped.rs_type.decl_id = Some(id);
        mapped
    }

    /// `void`, i.e. `()` on the target side.
    pub fn void() -> Self {
        Self::simple("void", "()")
    }

    pub fn is_void(&self) -> bool {
        self.cc_type.name == "void"
    }

    /// Wrap `pointee` one pointer layer deep. A non-nullable pointer with a
    /// known lifetime maps to a target-language reference; every other
    /// pointer stays raw, mutability chosen by the pointee's constness.
    pub fn pointer_to(pointee: MappedType, lifetime: Option<LifetimeId>, nullable: bool) -> Self {
        let pointee_const = pointee.cc_type.is_const;
        let rs_name = match (&lifetime, nullable) {
            (Some(_), false) if pointee_const => "&",
            (Some(_), false) => "&mut",
            _ if pointee_const => "*const",
            _ => "*mut",
        };
        Self {
            cc_type: CcType {
                name: "*".to_string(),
                is_const: false,
                type_params: vec![pointee.cc_type],
                decl_id: None,
            },
            rs_type: RsType {
                name: rs_name.to_string(),
                lifetime_args: lifetime.into_iter().collect(),
                type_params: vec![pointee.rs_type],
                decl_id: None,
            },
        }
    }

    /// Wrap `pointee` in an lvalue reference. References are non-nullable
    /// by contract and use reference spelling on both sides.
    pub fn lvalue_ref_to(pointee: MappedType, lifetime: Option<LifetimeId>) -> Self {
        let pointee_const = pointee.cc_type.is_const;
        let rs_name = if pointee_const { "&" } else { "&mut" };
        Self {
            cc_type: CcType {
                name: "&".to_string(),
                is_const: false,
                type_params: vec![pointee.cc_type],
                decl_id: None,
            },
            rs_type: RsType {
                name: rs_name.to_string(),
                lifetime_args: lifetime.into_iter().collect(),
                type_params: vec![pointee.rs_type],
                decl_id: None,
            },
        }
    }
}

// --- Items ---

/// One function parameter. Instance methods carry a synthetic leading
/// `__this` parameter; unnamed parameters are named `__param_0`,
/// `__param_1`, …
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncParam {
    #[serde(rename = "type")]
    pub ty: MappedType,
    pub identifier: Identifier,
}

/// Ties a member function back to the record it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberFuncMetadata {
    pub record_id: DeclId,
    /// False for static member functions.
    pub instance_method: bool,
}

/// An imported function or member function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Func {
    pub name: UnqualifiedIdentifier,
    pub owning_target: Label,
    pub doc_comment: Option<String>,
    pub mangled_name: String,
    pub return_type: MappedType,
    pub params: Vec<FuncParam>,
    /// Sorted by lifetime name.
    pub lifetime_params: Vec<Lifetime>,
    pub is_inline: bool,
    pub member_func_metadata: Option<MemberFuncMetadata>,
    pub source_loc: SourceLoc,
}

/// An imported record field. Offsets are in bits, as reported by the
/// platform record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub identifier: Identifier,
    pub doc_comment: Option<String>,
    #[serde(rename = "type")]
    pub ty: MappedType,
    pub access: AccessSpecifier,
    pub offset: u64,
}

/// An imported struct or class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub identifier: Identifier,
    pub id: DeclId,
    pub owning_target: Label,
    pub doc_comment: Option<String>,
    /// In declaration order.
    pub fields: Vec<Field>,
    /// Size in bytes.
    pub size: u64,
    /// Alignment in bytes.
    pub alignment: u64,
    pub copy_constructor: SpecialMemberFunc,
    pub move_constructor: SpecialMemberFunc,
    pub destructor: SpecialMemberFunc,
    /// True iff the platform ABI passes this record in registers. This is
    /// independent of whether the copy constructor is trivial.
    pub is_trivial_abi: bool,
    pub is_final: bool,
}

/// An imported type alias for a non-well-known underlying type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub identifier: Identifier,
    pub id: DeclId,
    pub owning_target: Label,
    pub doc_comment: Option<String>,
    pub underlying_type: MappedType,
}

/// A comment not attached to any imported declaration, preserved in
/// source order between items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
}

/// Emitted in place of a declaration that could not be imported. The
/// traversal never aborts; failures are data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedItem {
    /// Qualified name of the offending declaration.
    pub name: String,
    pub message: String,
    pub source_loc: SourceLoc,
}

/// One entry in the IR item stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Func(Func),
    Record(Record),
    TypeAlias(TypeAlias),
    Comment(Comment),
    UnsupportedItem(UnsupportedItem),
}

/// The produced artifact: an ordered item stream plus the headers and
/// build target the items came from. Two runs over the same inputs produce
/// identical `Ir` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ir {
    pub used_headers: Vec<HeaderName>,
    pub current_target: Label,
    pub items: Vec<Item>,
}

impl Ir {
    /// Iterate all functions in the item stream, in emission order.
    pub fn functions(&self) -> impl Iterator<Item = &Func> {
        self.items.iter().filter_map(|item| match item {
            Item::Func(f) => Some(f),
            _ => None,
        })
    }

    /// Iterate all records in the item stream, in emission order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.items.iter().filter_map(|item| match item {
            Item::Record(r) => Some(r),
            _ => None,
        })
    }

    /// Iterate all items that could not be imported, in emission order.
    pub fn unsupported_items(&self) -> impl Iterator<Item = &UnsupportedItem> {
        self.items.iter().filter_map(|item| match item {
            Item::UnsupportedItem(u) => Some(u),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_parallelism() {
        let inner = MappedType::simple("int", "i32");
        let ptr = MappedType::pointer_to(inner, None, true);
        assert_eq!(ptr.cc_type.name, "*");
        assert_eq!(ptr.rs_type.name, "*mut");
        assert_eq!(ptr.cc_type.type_params.len(), 1);
        assert_eq!(ptr.rs_type.type_params.len(), 1);
        assert_eq!(ptr.cc_type.type_params[0].name, "int");
        assert_eq!(ptr.rs_type.type_params[0].name, "i32");
    }

    #[test]
    fn test_pointer_to_const_pointee() {
        let mut inner = MappedType::simple("int", "i32");
        inner.cc_type.is_const = true;
        let ptr = MappedType::pointer_to(inner, None, true);
        assert_eq!(ptr.rs_type.name, "*const");
    }

    #[test]
    fn test_non_nullable_pointer_with_lifetime_is_reference() {
        let inner = MappedType::simple("int", "i32");
        let ptr = MappedType::pointer_to(inner, Some(LifetimeId(3)), false);
        assert_eq!(ptr.cc_type.name, "*");
        assert_eq!(ptr.rs_type.name, "&mut");
        assert_eq!(ptr.rs_type.lifetime_args, vec![LifetimeId(3)]);
    }

    #[test]
    fn test_void_mapped_type() {
        let void = MappedType::void();
        assert!(void.is_void());
        assert!(void.cc_type.type_params.is_empty());
        assert!(void.rs_type.type_params.is_empty());
    }

    #[test]
    fn test_access_specifier_round_trip() {
        assert_eq!(AccessSpecifier::Public.as_str(), "public");
        assert_eq!(
            "private".parse::<AccessSpecifier>().unwrap(),
            AccessSpecifier::Private
        );
        assert!("friend".parse::<AccessSpecifier>().is_err());
    }

    #[test]
    fn test_unqualified_identifier_display() {
        let id = UnqualifiedIdentifier::Identifier(Identifier::new("Foo"));
        assert_eq!(id.to_string(), "Foo");
        assert_eq!(UnqualifiedIdentifier::Constructor.to_string(), "(constructor)");
        assert_eq!(UnqualifiedIdentifier::Destructor.to_string(), "(destructor)");
    }

    #[test]
    fn test_ir_json_round_trip() {
        let ir = Ir {
            used_headers: vec![HeaderName::new("foo.h")],
            current_target: Label::new("//foo:bar"),
            items: vec![Item::Comment(Comment {
                text: "hello".to_string(),
            })],
        };
        let json = serde_json::to_string(&ir).unwrap();
        let back: Ir = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ir);
    }
}
