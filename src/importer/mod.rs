//! AST-to-IR lowering engine
//!
//! The [`Importer`] walks a translation unit in the front-end's
//! depth-first order, decides which declarations are importable,
//! dispatches each to the importer for its kind, and interleaves floating
//! comments. Failures never abort the traversal; they surface as
//! [`UnsupportedItem`](crate::ir::UnsupportedItem) entries in the output.
//!
//! Emission is deterministic: items are collected with their begin
//! location and an intra-declaration tiebreak, then stably sorted, so two
//! runs over the same inputs produce identical IR.

pub(crate) mod aliases;
pub(crate) mod comments;
pub(crate) mod emit;
pub(crate) mod functions;
pub(crate) mod names;
pub(crate) mod records;
pub(crate) mod special_members;
pub(crate) mod type_mapper;

use std::collections::HashSet;

use thiserror::Error;

use crate::ast::{
    Decl, DeclContext, DeclId, DeclKind, QualType, SourceLoc, TranslationUnit,
};
use crate::config::{BUILTIN_TARGET, ImportConfig, VIRTUAL_RESOURCE_DIR_TARGET};
use crate::importer::comments::CommentManager;
use crate::importer::emit::{EmitEntry, ORDER_COMMENT, ORDER_OTHER};
use crate::ir;
use crate::ir::{Comment, Item, Label, LifetimeId, MappedType, UnsupportedItem};

/// Why a declaration (or part of one) could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// A C++ type the mapper cannot translate. Carries the offending
    /// spelling so it can be surfaced verbatim.
    #[error("Unsupported type '{spelling}'")]
    UnsupportedType { spelling: String },

    /// A declaration shape with no IR mapping (nested record, union,
    /// template, namespace-contained item, …).
    #[error("{0}")]
    UnsupportedConstruct(String),

    /// Empty or otherwise untranslatable declaration name.
    #[error("Could not translate declaration name")]
    UnresolvableName,

    /// The record lacks a complete definition.
    #[error("No record layout available")]
    LayoutUnavailable,
}

impl ImportError {
    pub(crate) fn unsupported_type(ty: &QualType) -> Self {
        Self::UnsupportedType {
            spelling: ty.spelling(),
        }
    }
}

/// Lower a parsed translation unit into IR.
///
/// This is the crate's main entry point. The traversal runs to
/// completion; declarations that cannot be imported become
/// `UnsupportedItem`s, interleaved in source order with everything else.
pub fn import_translation_unit(tu: &TranslationUnit, config: &ImportConfig) -> ir::Ir {
    let mut importer = Importer::new(tu, config);
    let mut comments = CommentManager::new(tu);

    for decl in &tu.decls {
        if importer.seen_decls.contains(&decl.canonical) && !decl.kind.is_namespace() {
            continue;
        }

        if matches!(decl.context, DeclContext::Namespace(_)) {
            if importer.is_from_current_target(decl) {
                importer.push_unsupported(
                    decl,
                    "Items contained in namespaces are not supported yet".to_string(),
                );
            }
            importer.seen_decls.insert(decl.canonical);
            continue;
        }

        for raw in comments.visit_decl(decl) {
            importer.push_comment(&raw.text, raw.range.begin);
        }

        match &decl.kind {
            DeclKind::Function(func) => {
                importer.seen_decls.insert(decl.canonical);
                functions::import_function(&mut importer, decl, func);
            }
            // Records mark themselves seen: a forward declaration must not
            // shadow the definition that follows it.
            DeclKind::Record(record) => records::import_record(&mut importer, decl, record),
            DeclKind::Typedef(typedef) => {
                importer.seen_decls.insert(decl.canonical);
                aliases::import_typedef(&mut importer, decl, typedef);
            }
            // Namespaces may re-open; their contents are handled (and
            // rejected) one declaration at a time above.
            DeclKind::Namespace(_) => {}
            DeclKind::Other => {
                importer.seen_decls.insert(decl.canonical);
            }
        }

        if !decl.kind.is_namespace() {
            comments.skip_decl_extent(decl);
        }
    }

    for raw in comments.flush() {
        importer.push_comment(&raw.text, raw.range.begin);
    }

    importer.finish()
}

/// Traversal state: what has been imported, which type declarations are
/// usable in field and parameter types, and the emit buffer.
pub(crate) struct Importer<'a> {
    pub(crate) tu: &'a TranslationUnit,
    pub(crate) config: &'a ImportConfig,
    /// Canonical ids of declarations already handled.
    pub(crate) seen_decls: HashSet<DeclId>,
    /// Canonical ids of records and aliases the type mapper may reference.
    /// Records are inserted provisionally before their fields are imported
    /// so self-referential pointer fields resolve; the entry is retracted
    /// if field import fails.
    pub(crate) known_type_decls: HashSet<DeclId>,
    entries: Vec<EmitEntry>,
}

impl<'a> Importer<'a> {
    fn new(tu: &'a TranslationUnit, config: &'a ImportConfig) -> Self {
        Self {
            tu,
            config,
            seen_decls: HashSet::new(),
            known_type_decls: HashSet::new(),
            entries: Vec::new(),
        }
    }

    fn finish(self) -> ir::Ir {
        ir::Ir {
            used_headers: self.config.public_headers.clone(),
            current_target: self.config.current_target.clone(),
            items: emit::flatten(self.entries),
        }
    }

    pub(crate) fn map_type(
        &self,
        ty: &QualType,
        lifetimes: Option<&mut Vec<LifetimeId>>,
        nullable: bool,
    ) -> Result<MappedType, ImportError> {
        type_mapper::map_qual_type(self.tu, &self.known_type_decls, ty, lifetimes, nullable)
    }

    /// The stable IR id of a declaration: its canonical declaration's
    /// index, which is injective within the translation unit.
    pub(crate) fn ir_decl_id(&self, id: DeclId) -> ir::DeclId {
        let canonical = self.tu.decl(id).map(|d| d.canonical).unwrap_or(id);
        ir::DeclId(canonical.0 as u64)
    }

    /// Resolve the owning build target of a location by walking the
    /// include chain outward until a mapped header is found. Unmapped
    /// system headers belong to the virtual resource dir target; files
    /// with no non-builtin name belong to `//:builtin`.
    pub(crate) fn owning_target_of(&self, loc: SourceLoc) -> Label {
        let mut file_id = loc.file;
        while let Some(file) = self.tu.file(file_id) {
            match file.normalized_name() {
                Some(name) => {
                    if let Some(label) = self.config.target_of_header(name) {
                        return label.clone();
                    }
                    if file.is_system_header {
                        return Label::new(VIRTUAL_RESOURCE_DIR_TARGET);
                    }
                }
                None => return Label::new(BUILTIN_TARGET),
            }
            match file.include_loc {
                Some(include_loc) => file_id = include_loc.file,
                None => break,
            }
        }
        Label::new(BUILTIN_TARGET)
    }

    pub(crate) fn owning_target(&self, decl: &Decl) -> Label {
        self.owning_target_of(decl.range.begin)
    }

    pub(crate) fn is_from_current_target(&self, decl: &Decl) -> bool {
        self.owning_target(decl) == self.config.current_target
    }

    pub(crate) fn ir_source_loc(&self, loc: SourceLoc) -> ir::SourceLoc {
        let filename = self
            .tu
            .file(loc.file)
            .and_then(|f| f.normalized_name())
            .unwrap_or("<unknown>")
            .to_string();
        ir::SourceLoc {
            filename,
            line: loc.line,
            column: loc.column,
        }
    }

    pub(crate) fn doc_comment(&self, decl: &Decl) -> Option<String> {
        self.tu.doc_comment(decl)
    }

    pub(crate) fn push_item(&mut self, loc: SourceLoc, local_order: u8, item: Item) {
        self.entries.push(EmitEntry {
            sort_loc: loc.is_valid().then(|| loc.tu_order_key()),
            local_order,
            item,
        });
    }

    fn push_comment(&mut self, raw_text: &str, loc: SourceLoc) {
        let text = crate::ast::source::format_comment(raw_text);
        self.push_item(loc, ORDER_COMMENT, Item::Comment(Comment { text }));
    }

    /// Record an `UnsupportedItem` in place of `decl`.
    pub(crate) fn push_unsupported(&mut self, decl: &Decl, message: String) {
        let item = UnsupportedItem {
            name: names::qualified_name(self.tu, decl),
            message,
            source_loc: self.ir_source_loc(decl.range.begin),
        };
        self.push_item(decl.range.begin, ORDER_OTHER, Item::UnsupportedItem(item));
    }
}
