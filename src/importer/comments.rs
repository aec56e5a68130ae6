//! Floating comment interleave
//!
//! Tracks, per file, which raw comments are *not* attached to any imported
//! declaration so they can be emitted as standalone comment items in
//! source order. Attached doc comments are skipped here; they travel
//! inside the owning item's `doc_comment` field instead. Comments inside a
//! declaration's extent are swallowed, except inside namespaces, whose
//! extent is not a scope for this purpose.

use crate::ast::source::{FileId, RawComment};
use crate::ast::{Decl, TranslationUnit};

pub(crate) struct CommentManager<'a> {
    tu: &'a TranslationUnit,
    current_file: Option<FileId>,
    comments: &'a [RawComment],
    next: usize,
}

impl<'a> CommentManager<'a> {
    pub(crate) fn new(tu: &'a TranslationUnit) -> Self {
        Self {
            tu,
            current_file: None,
            comments: &[],
            next: 0,
        }
    }

    /// Called before a declaration is processed. Returns the comments to
    /// emit as floating items: everything in the current file that begins
    /// before the declaration, minus the declaration's own doc comment.
    /// Entering a new file flushes the previous file's remainder first.
    pub(crate) fn visit_decl(&mut self, decl: &Decl) -> Vec<&'a RawComment> {
        let mut out = Vec::new();
        if !decl.range.begin.is_valid() {
            return out;
        }

        let file = decl.range.begin.file;
        if self.current_file != Some(file) {
            self.drain_remaining(&mut out);
            self.current_file = Some(file);
            self.comments = self
                .tu
                .file(file)
                .map(|f| f.comments.as_slice())
                .unwrap_or(&[]);
            self.next = 0;
        }

        while self.next < self.comments.len()
            && self.comments[self.next].range.begin.offset < decl.range.begin.offset
        {
            if decl.doc_comment != Some(self.next as u32) {
                out.push(&self.comments[self.next]);
            }
            self.next += 1;
        }
        out
    }

    /// Called after a declaration is processed: comments inside its extent
    /// belong to its contents, not to the top level.
    pub(crate) fn skip_decl_extent(&mut self, decl: &Decl) {
        if !decl.range.begin.is_valid() || self.current_file != Some(decl.range.begin.file) {
            return;
        }
        while self.next < self.comments.len()
            && self.comments[self.next].range.begin.offset < decl.range.end.offset
        {
            self.next += 1;
        }
    }

    /// Flush everything still buffered, at translation-unit end.
    pub(crate) fn flush(&mut self) -> Vec<&'a RawComment> {
        let mut out = Vec::new();
        self.drain_remaining(&mut out);
        self.current_file = None;
        out
    }

    fn drain_remaining(&mut self, out: &mut Vec<&'a RawComment>) {
        while self.next < self.comments.len() {
            out.push(&self.comments[self.next]);
            self.next += 1;
        }
    }
}
