//! Source files, locations, and raw comments
//!
//! Locations are positions inside the translation unit's file table.
//! Translation-unit order is `(file, offset)`: the front-end assigns
//! `FileId`s in the order files are entered during preprocessing, so the
//! lexicographic order over those pairs matches the order in which the
//! preprocessor saw the tokens.

use serde::{Deserialize, Serialize};

/// Index into the translation unit's file table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FileId(pub u32);

impl FileId {
    /// Sentinel for locations that do not point into any file (compiler
    /// builtins, command-line definitions).
    pub const INVALID: FileId = FileId(u32::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// A position inside one source file. `offset` is bytes from the start of
/// the file; `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc {
    pub file: FileId,
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub const INVALID: SourceLoc = SourceLoc {
        file: FileId::INVALID,
        offset: 0,
        line: 0,
        column: 0,
    };

    pub fn is_valid(self) -> bool {
        self.file.is_valid()
    }

    /// Sort key realizing translation-unit order for valid locations.
    pub(crate) fn tu_order_key(self) -> (u32, u32) {
        (self.file.0, self.offset)
    }
}

/// Begin and end of a declaration's extent. `end` points one past the
/// last token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub begin: SourceLoc,
    pub end: SourceLoc,
}

impl SourceRange {
    pub const INVALID: SourceRange = SourceRange {
        begin: SourceLoc::INVALID,
        end: SourceLoc::INVALID,
    };

    pub fn is_valid(self) -> bool {
        self.begin.is_valid()
    }
}

/// One file that contributed declarations to the translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Filename as spelled by the includer. `None` for compiler builtins
    /// (`<built-in>`, command line).
    pub name: Option<String>,
    /// Location of the `#include` that pulled this file in. `None` for the
    /// entry file.
    pub include_loc: Option<SourceLoc>,
    pub is_system_header: bool,
    /// Raw comments in this file, ordered by begin offset. Consecutive
    /// line comments are merged into one raw comment by the front-end.
    pub comments: Vec<RawComment>,
}

impl SourceFile {
    /// Filename with a leading `"./"` stripped, or `None` for builtins.
    pub fn normalized_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(|n| n.strip_prefix("./").unwrap_or(n))
    }
}

/// A comment as lexed, markers included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub range: SourceRange,
    pub text: String,
}

/// Canonical comment formatter: strips comment markers and block-comment
/// decoration, preserving line structure.
///
/// Block comments keep a quirk of the decoration stripper: a line like
/// `* with bullet */` loses its leading bullet and keeps the space left
/// behind by the removed terminator, yielding `with bullet `.
pub fn format_comment(raw: &str) -> String {
    if raw.starts_with("/*") {
        format_block_comment(raw)
    } else {
        format_line_comment(raw)
    }
}

fn format_line_comment(raw: &str) -> String {
    let mut out = Vec::new();
    for line in raw.lines() {
        let line = line.trim_start();
        let line = line.strip_prefix("//").unwrap_or(line);
        // Doxygen-style third slash or bang marker.
        let line = line
            .strip_prefix('/')
            .or_else(|| line.strip_prefix('!'))
            .unwrap_or(line);
        out.push(line.strip_prefix(' ').unwrap_or(line));
    }
    out.join("\n")
}

fn format_block_comment(raw: &str) -> String {
    let mut out = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let mut line = if i == 0 {
            let rest = line.trim_start_matches('/').trim_start_matches('*');
            rest.strip_prefix(' ').unwrap_or(rest)
        } else {
            // Continuation lines drop their indentation and the aligned
            // asterisk decoration, when present.
            let trimmed = line.trim_start();
            match trimmed.strip_prefix('*') {
                Some(rest) if !rest.starts_with('/') => rest.strip_prefix(' ').unwrap_or(rest),
                _ => trimmed,
            }
        };
        if let Some(stripped) = line.strip_suffix("*/") {
            line = stripped;
            if !line.is_empty() {
                out.push(line);
            }
        } else {
            out.push(line);
        }
    }
    out.join("\n")
}
