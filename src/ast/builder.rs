//! Fluent construction of translation units
//!
//! `TuBuilder` builds a [`TranslationUnit`] the way a front-end would hand
//! it over, without running a front-end: declarations are laid out on
//! consecutive source lines, redeclarations are linked to their canonical
//! declaration, and raw comments land in the owning file's comment list.
//! Tests and embedders use the same API.
//!
//! # Example
//!
//! ```rust
//! use cc_bindings_ir::ast::{BuiltinType, QualType, TuBuilder};
//!
//! let tu = TuBuilder::new("point.h")
//!     .record("Point", |r| {
//!         r.field("x", QualType::builtin(BuiltinType::Int))
//!          .field("y", QualType::builtin(BuiltinType::Int));
//!     })
//!     .func("Distance", |f| {
//!         f.returns(QualType::builtin(BuiltinType::Double));
//!     })
//!     .build();
//! assert_eq!(tu.decls.len(), 2);
//! ```

use std::collections::HashMap;

use crate::ast::source::{FileId, RawComment, SourceFile, SourceLoc, SourceRange};
use crate::ast::types::{BuiltinType, QualType};
use crate::ast::{
    ConstructorKind, Decl, DeclContext, DeclId, DeclKind, FieldDecl, FunctionDecl,
    FunctionKind, FunctionLifetimes, NamespaceDecl, ParamDecl, RecordDecl,
    SpecialMemberFacts, TagKind, TranslationUnit, TypedefDecl,
};
use crate::ir::AccessSpecifier;

/// Builder for constructing a translation unit.
pub struct TuBuilder {
    files: Vec<SourceFile>,
    decls: Vec<Decl>,
    current_file: u32,
    /// Next free source line, per file. Line numbers double as byte
    /// offsets: one declaration or comment line per "source line".
    next_line: Vec<u32>,
    canonical: HashMap<(&'static str, String), DeclId>,
}

impl TuBuilder {
    /// Start a translation unit whose entry file is `entry_header`.
    pub fn new(entry_header: impl Into<String>) -> Self {
        Self {
            files: vec![SourceFile {
                name: Some(entry_header.into()),
                include_loc: None,
                is_system_header: false,
                comments: vec![],
            }],
            decls: vec![],
            current_file: 0,
            next_line: vec![1],
            canonical: HashMap::new(),
        }
    }

    /// Switch to a new file, included at the current position of the
    /// current file. Subsequent declarations land in the new file.
    pub fn header(self, name: impl Into<String>) -> Self {
        self.enter_file(Some(name.into()), false)
    }

    /// Like [`Self::header`], but marks the file as a system header.
    pub fn system_header(self, name: impl Into<String>) -> Self {
        self.enter_file(Some(name.into()), true)
    }

    /// A file with no non-builtin name (`<built-in>`, command line).
    pub fn builtin_file(self) -> Self {
        self.enter_file(None, false)
    }

    fn enter_file(mut self, name: Option<String>, is_system_header: bool) -> Self {
        let include_line = self.alloc_line();
        let include_loc = self.loc(include_line);
        self.files.push(SourceFile {
            name,
            include_loc: Some(include_loc),
            is_system_header,
            comments: vec![],
        });
        self.next_line.push(1);
        self.current_file = self.files.len() as u32 - 1;
        self
    }

    /// Add a free-standing comment at the current position.
    pub fn comment(mut self, raw: impl Into<String>) -> Self {
        self.push_raw_comment(&raw.into());
        self
    }

    /// Add a free function. The closure configures parameters, return
    /// type, and the rest.
    pub fn func(mut self, name: &str, f: impl FnOnce(&mut FuncBuilder)) -> Self {
        let mut builder = FuncBuilder::new();
        f(&mut builder);
        self.push_func(DeclContext::TranslationUnit, name, builder);
        self
    }

    /// Add a record. The closure configures fields, members, and flags.
    pub fn record(mut self, name: &str, f: impl FnOnce(&mut RecordBuilder)) -> Self {
        let mut builder = RecordBuilder::new();
        f(&mut builder);
        self.push_record(DeclContext::TranslationUnit, name, builder);
        self
    }

    /// Add a forward declaration of a record.
    pub fn fwd_record(mut self, name: &str) -> Self {
        let line = self.alloc_line();
        let range = self.line_range(line, 1);
        self.push_decl(
            Some(("record", name.to_string())),
            DeclContext::TranslationUnit,
            range,
            None,
            DeclKind::Record(RecordDecl {
                name: name.to_string(),
                tag: TagKind::Struct,
                is_complete: false,
                is_final: false,
                is_template: false,
                has_trivial_abi_attr: false,
                fields: vec![],
                copy_constructor: SpecialMemberFacts::implicit(),
                move_constructor: SpecialMemberFacts::implicit(),
                destructor: SpecialMemberFacts::implicit(),
            }),
        );
        self
    }

    /// Add a type alias.
    pub fn typedef_(mut self, name: &str, underlying: QualType) -> Self {
        let line = self.alloc_line();
        let range = self.line_range(line, 1);
        self.push_decl(
            Some(("typedef", name.to_string())),
            DeclContext::TranslationUnit,
            range,
            None,
            DeclKind::Typedef(TypedefDecl {
                name: name.to_string(),
                underlying,
            }),
        );
        self
    }

    /// Add a namespace. The closure adds the namespace's contents.
    pub fn namespace(mut self, name: &str, f: impl FnOnce(&mut NamespaceScope<'_>)) -> Self {
        let open_line = self.alloc_line();
        let id = self.push_decl(
            Some(("namespace", name.to_string())),
            DeclContext::TranslationUnit,
            // Patched below once the extent is known.
            self.line_range(open_line, 1),
            None,
            DeclKind::Namespace(NamespaceDecl {
                name: name.to_string(),
            }),
        );
        let mut scope = NamespaceScope { tu: &mut self, ns: id };
        f(&mut scope);
        let close_line = self.alloc_line();
        let range = SourceRange {
            begin: self.loc(open_line),
            end: self.loc(close_line + 1),
        };
        self.decls[id.0 as usize].range = range;
        self
    }

    /// Add a record declared inside the body of the most recently added
    /// function.
    ///
    /// # Panics
    ///
    /// Panics if no function has been added yet.
    pub fn local_record(mut self, name: &str, f: impl FnOnce(&mut RecordBuilder)) -> Self {
        let owner = self
            .decls
            .iter()
            .rev()
            .find(|d| matches!(d.kind, DeclKind::Function(_)))
            .map(|d| d.id)
            .expect("local_record requires a preceding func");
        let mut builder = RecordBuilder::new();
        f(&mut builder);
        self.push_record(DeclContext::Function(owner), name, builder);
        self
    }

    /// Add a declaration of a kind the importer has no mapping for.
    pub fn other_decl(mut self) -> Self {
        let line = self.alloc_line();
        let range = self.line_range(line, 1);
        self.push_decl(None, DeclContext::TranslationUnit, range, None, DeclKind::Other);
        self
    }

    pub fn build(self) -> TranslationUnit {
        TranslationUnit {
            files: self.files,
            decls: self.decls,
        }
    }

    // --- internals ---

    fn alloc_line(&mut self) -> u32 {
        let line = self.next_line[self.current_file as usize];
        self.next_line[self.current_file as usize] += 1;
        line
    }

    fn alloc_lines(&mut self, count: u32) -> u32 {
        let line = self.next_line[self.current_file as usize];
        self.next_line[self.current_file as usize] += count;
        line
    }

    fn loc(&self, line: u32) -> SourceLoc {
        SourceLoc {
            file: FileId(self.current_file),
            offset: line,
            line,
            column: 1,
        }
    }

    fn line_range(&self, line: u32, len: u32) -> SourceRange {
        SourceRange {
            begin: self.loc(line),
            end: self.loc(line + len),
        }
    }

    /// Append a raw comment at the current position; returns its index in
    /// the file's comment list.
    fn push_raw_comment(&mut self, text: &str) -> u32 {
        let lines = text.lines().count().max(1) as u32;
        let begin = self.alloc_lines(lines);
        let range = SourceRange {
            begin: self.loc(begin),
            end: self.loc(begin + lines),
        };
        let file = &mut self.files[self.current_file as usize];
        file.comments.push(RawComment {
            range,
            text: text.to_string(),
        });
        (file.comments.len() - 1) as u32
    }

    fn push_decl(
        &mut self,
        canonical_key: Option<(&'static str, String)>,
        context: DeclContext,
        range: SourceRange,
        doc_comment: Option<u32>,
        kind: DeclKind,
    ) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        let canonical = match canonical_key {
            Some(key) => *self.canonical.entry(key).or_insert(id),
            None => id,
        };
        self.decls.push(Decl {
            id,
            canonical,
            context,
            range,
            doc_comment,
            kind,
        });
        id
    }

    fn push_func(&mut self, context: DeclContext, name: &str, builder: FuncBuilder) -> DeclId {
        let doc = builder.doc.as_deref().map(|raw| self.push_raw_comment(raw));
        let line = self.alloc_line();
        let range = self.line_range(line, 1);
        self.push_decl(
            Some(("func", name.to_string())),
            context,
            range,
            doc,
            DeclKind::Function(FunctionDecl {
                name: name.to_string(),
                kind: FunctionKind::Free,
                return_type: builder.return_type,
                params: builder.params,
                is_inline: builder.is_inline,
                is_deleted: builder.is_deleted,
                access: None,
                lifetimes: builder.lifetimes,
            }),
        )
    }

    fn push_record(&mut self, context: DeclContext, name: &str, builder: RecordBuilder) -> DeclId {
        let doc = builder.doc.as_deref().map(|raw| self.push_raw_comment(raw));
        let open_line = self.alloc_line();

        let mut fields = Vec::with_capacity(builder.fields.len());
        for spec in builder.fields {
            let field_doc = spec.doc.as_deref().map(|raw| self.push_raw_comment(raw));
            self.alloc_line();
            fields.push(FieldDecl {
                name: spec.name,
                ty: spec.ty,
                access: spec.access,
                doc_comment: field_doc,
            });
        }

        // Member function and nested record lines sit inside the record's
        // extent; the decls themselves are pushed after the record, in
        // traversal order.
        let mut member_lines = Vec::with_capacity(builder.members.len());
        for member in &builder.members {
            let member_doc = member
                .doc
                .as_deref()
                .map(|raw| self.push_raw_comment(raw));
            member_lines.push((self.alloc_line(), member_doc));
        }
        let mut nested_lines = Vec::with_capacity(builder.nested.len());
        for _ in &builder.nested {
            nested_lines.push(self.alloc_line());
        }

        let close_line = self.alloc_line();
        let range = SourceRange {
            begin: self.loc(open_line),
            end: self.loc(close_line + 1),
        };

        let record_id = self.push_decl(
            Some(("record", name.to_string())),
            context,
            range,
            doc,
            DeclKind::Record(RecordDecl {
                name: name.to_string(),
                tag: builder.tag,
                is_complete: true,
                is_final: builder.is_final,
                is_template: builder.is_template,
                has_trivial_abi_attr: builder.has_trivial_abi_attr,
                fields,
                copy_constructor: builder.copy_constructor,
                move_constructor: builder.move_constructor,
                destructor: builder.destructor,
            }),
        );

        for (nested_name, line) in builder.nested.iter().zip(nested_lines) {
            let range = self.line_range(line, 1);
            self.push_decl(
                Some(("record", format!("{name}::{nested_name}"))),
                DeclContext::Record(record_id),
                range,
                None,
                DeclKind::Record(RecordDecl {
                    name: nested_name.clone(),
                    tag: TagKind::Struct,
                    is_complete: true,
                    is_final: false,
                    is_template: false,
                    has_trivial_abi_attr: false,
                    fields: vec![],
                    copy_constructor: SpecialMemberFacts::implicit(),
                    move_constructor: SpecialMemberFacts::implicit(),
                    destructor: SpecialMemberFacts::implicit(),
                }),
            );
        }

        for (member, (line, member_doc)) in builder.members.into_iter().zip(member_lines) {
            let range = self.line_range(line, 1);
            let kind = match member.kind {
                MemberKind::Method => FunctionKind::Method {
                    record: record_id,
                    is_static: member.is_static,
                },
                MemberKind::Constructor(kind) => FunctionKind::Constructor {
                    record: record_id,
                    kind,
                },
                MemberKind::Destructor => FunctionKind::Destructor { record: record_id },
            };
            self.push_decl(
                Some(("func", format!("{name}::{}", member.name))),
                DeclContext::Record(record_id),
                range,
                member_doc,
                DeclKind::Function(FunctionDecl {
                    name: member.name,
                    kind,
                    return_type: member.builder.return_type,
                    params: member.builder.params,
                    is_inline: member.builder.is_inline,
                    is_deleted: member.builder.is_deleted,
                    access: Some(member.access),
                    lifetimes: member.builder.lifetimes,
                }),
            );
        }

        record_id
    }
}

/// Scope handle for declarations inside a namespace.
pub struct NamespaceScope<'a> {
    tu: &'a mut TuBuilder,
    ns: DeclId,
}

impl NamespaceScope<'_> {
    pub fn func(&mut self, name: &str, f: impl FnOnce(&mut FuncBuilder)) -> &mut Self {
        let mut builder = FuncBuilder::new();
        f(&mut builder);
        self.tu
            .push_func(DeclContext::Namespace(self.ns), name, builder);
        self
    }

    pub fn record(&mut self, name: &str, f: impl FnOnce(&mut RecordBuilder)) -> &mut Self {
        let mut builder = RecordBuilder::new();
        f(&mut builder);
        self.tu
            .push_record(DeclContext::Namespace(self.ns), name, builder);
        self
    }

    pub fn typedef_(&mut self, name: &str, underlying: QualType) -> &mut Self {
        let line = self.tu.alloc_line();
        let range = self.tu.line_range(line, 1);
        self.tu.push_decl(
            Some(("typedef", name.to_string())),
            DeclContext::Namespace(self.ns),
            range,
            None,
            DeclKind::Typedef(TypedefDecl {
                name: name.to_string(),
                underlying,
            }),
        );
        self
    }
}

/// Builder for a free function.
pub struct FuncBuilder {
    return_type: QualType,
    params: Vec<ParamDecl>,
    is_inline: bool,
    is_deleted: bool,
    lifetimes: Option<FunctionLifetimes>,
    doc: Option<String>,
}

impl FuncBuilder {
    fn new() -> Self {
        Self {
            return_type: QualType::builtin(BuiltinType::Void),
            params: vec![],
            is_inline: false,
            is_deleted: false,
            lifetimes: None,
            doc: None,
        }
    }

    pub fn returns(&mut self, ty: QualType) -> &mut Self {
        self.return_type = ty;
        self
    }

    /// Add a parameter. Pass an empty name for unnamed parameters.
    pub fn param(&mut self, name: &str, ty: QualType) -> &mut Self {
        self.params.push(ParamDecl {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn inline_(&mut self) -> &mut Self {
        self.is_inline = true;
        self
    }

    pub fn deleted(&mut self) -> &mut Self {
        self.is_deleted = true;
        self
    }

    pub fn lifetimes(&mut self, lifetimes: FunctionLifetimes) -> &mut Self {
        self.lifetimes = Some(lifetimes);
        self
    }

    /// Attach a doc comment, given as raw source text with markers.
    pub fn doc(&mut self, raw: &str) -> &mut Self {
        self.doc = Some(raw.to_string());
        self
    }
}

enum MemberKind {
    Method,
    Constructor(ConstructorKind),
    Destructor,
}

struct MemberSpec {
    name: String,
    kind: MemberKind,
    access: AccessSpecifier,
    is_static: bool,
    doc: Option<String>,
    builder: FuncBuilder,
}

/// Builder for a member function.
pub struct MethodBuilder {
    access: AccessSpecifier,
    is_static: bool,
    doc: Option<String>,
    inner: FuncBuilder,
}

impl MethodBuilder {
    fn new() -> Self {
        Self {
            access: AccessSpecifier::Public,
            is_static: false,
            doc: None,
            inner: FuncBuilder::new(),
        }
    }

    pub fn returns(&mut self, ty: QualType) -> &mut Self {
        self.inner.returns(ty);
        self
    }

    pub fn param(&mut self, name: &str, ty: QualType) -> &mut Self {
        self.inner.param(name, ty);
        self
    }

    pub fn access(&mut self, access: AccessSpecifier) -> &mut Self {
        self.access = access;
        self
    }

    pub fn static_(&mut self) -> &mut Self {
        self.is_static = true;
        self
    }

    pub fn inline_(&mut self) -> &mut Self {
        self.inner.inline_();
        self
    }

    pub fn deleted(&mut self) -> &mut Self {
        self.inner.deleted();
        self
    }

    pub fn lifetimes(&mut self, lifetimes: FunctionLifetimes) -> &mut Self {
        self.inner.lifetimes(lifetimes);
        self
    }

    pub fn doc(&mut self, raw: &str) -> &mut Self {
        self.doc = Some(raw.to_string());
        self
    }
}

struct FieldSpec {
    name: String,
    ty: QualType,
    access: Option<AccessSpecifier>,
    doc: Option<String>,
}

/// Builder for a record.
pub struct RecordBuilder {
    tag: TagKind,
    is_final: bool,
    is_template: bool,
    has_trivial_abi_attr: bool,
    fields: Vec<FieldSpec>,
    members: Vec<MemberSpec>,
    nested: Vec<String>,
    copy_constructor: SpecialMemberFacts,
    move_constructor: SpecialMemberFacts,
    destructor: SpecialMemberFacts,
    doc: Option<String>,
}

impl RecordBuilder {
    fn new() -> Self {
        Self {
            tag: TagKind::Struct,
            is_final: false,
            is_template: false,
            has_trivial_abi_attr: false,
            fields: vec![],
            members: vec![],
            nested: vec![],
            copy_constructor: SpecialMemberFacts::implicit(),
            move_constructor: SpecialMemberFacts::implicit(),
            destructor: SpecialMemberFacts::implicit(),
            doc: None,
        }
    }

    /// Declare with the `class` keyword (default access private).
    pub fn class_(&mut self) -> &mut Self {
        self.tag = TagKind::Class;
        self
    }

    pub fn union_(&mut self) -> &mut Self {
        self.tag = TagKind::Union;
        self
    }

    pub fn final_(&mut self) -> &mut Self {
        self.is_final = true;
        self
    }

    /// Mark as a class template or template specialization.
    pub fn template(&mut self) -> &mut Self {
        self.is_template = true;
        self
    }

    /// Attach the `[[clang::trivial_abi]]` attribute.
    pub fn trivial_abi(&mut self) -> &mut Self {
        self.has_trivial_abi_attr = true;
        self
    }

    /// Add a field with the record's default access.
    pub fn field(&mut self, name: &str, ty: QualType) -> &mut Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            ty,
            access: None,
            doc: None,
        });
        self
    }

    /// Add a field under an explicit access specifier.
    pub fn field_access(&mut self, name: &str, ty: QualType, access: AccessSpecifier) -> &mut Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            ty,
            access: Some(access),
            doc: None,
        });
        self
    }

    /// Add a field with an attached doc comment (raw source text).
    pub fn field_doc(&mut self, name: &str, ty: QualType, raw: &str) -> &mut Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            ty,
            access: None,
            doc: Some(raw.to_string()),
        });
        self
    }

    /// Declare an empty record nested inside this one.
    pub fn record_member(&mut self, name: &str) -> &mut Self {
        self.nested.push(name.to_string());
        self
    }

    pub fn method(&mut self, name: &str, f: impl FnOnce(&mut MethodBuilder)) -> &mut Self {
        self.push_member(name, MemberKind::Method, f)
    }

    pub fn ctor(&mut self, kind: ConstructorKind, f: impl FnOnce(&mut MethodBuilder)) -> &mut Self {
        self.push_member("", MemberKind::Constructor(kind), f)
    }

    pub fn dtor(&mut self, f: impl FnOnce(&mut MethodBuilder)) -> &mut Self {
        self.push_member("", MemberKind::Destructor, f)
    }

    fn push_member(
        &mut self,
        name: &str,
        kind: MemberKind,
        f: impl FnOnce(&mut MethodBuilder),
    ) -> &mut Self {
        let mut builder = MethodBuilder::new();
        f(&mut builder);
        let name = match &kind {
            MemberKind::Method => name.to_string(),
            MemberKind::Constructor(_) => format!("(ctor#{})", self.members.len()),
            MemberKind::Destructor => "(dtor)".to_string(),
        };
        self.members.push(MemberSpec {
            name,
            kind,
            access: builder.access,
            is_static: builder.is_static,
            doc: builder.doc,
            builder: builder.inner,
        });
        self
    }

    pub fn copy_constructor(&mut self, facts: SpecialMemberFacts) -> &mut Self {
        self.copy_constructor = facts;
        self
    }

    pub fn move_constructor(&mut self, facts: SpecialMemberFacts) -> &mut Self {
        self.move_constructor = facts;
        self
    }

    pub fn destructor(&mut self, facts: SpecialMemberFacts) -> &mut Self {
        self.destructor = facts;
        self
    }

    pub fn doc(&mut self, raw: &str) -> &mut Self {
        self.doc = Some(raw.to_string());
        self
    }
}
