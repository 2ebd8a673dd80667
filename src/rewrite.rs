//! Generated-block replacement inside existing links files.
//!
//! A links file is hand-maintained except for one block that starts at the
//! opening marker line and ends at the closing marker line. The rewriter
//! walks the file line by line, copies everything outside that block
//! byte-for-byte, and swaps the block's interior for freshly rendered text.
//!
//! The file on disk is only touched once the whole replacement has been built
//! and both markers were found.

use crate::error::LinksError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// How the closing marker line is recognised. Both policies ignore trailing
/// whitespace and the line terminator; leading indentation is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingMatch {
    /// The line starts with the closing marker (`    ])`, `    ]);`, ...).
    #[default]
    Prefix,
    /// The line is exactly the closing marker.
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMarkers {
    pub open: String,
    pub close: String,
    pub close_match: ClosingMatch,
}

impl BlockMarkers {
    fn is_open(&self, line: &str) -> bool {
        line.trim() == self.open.trim()
    }

    fn is_close(&self, line: &str) -> bool {
        let content = line.trim_end();
        let close = self.close.trim_end();
        match self.close_match {
            ClosingMatch::Prefix => content.starts_with(close),
            ClosingMatch::Exact => content == close,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    MissingOpenMarker,
    /// Opening marker on `open_line` (1-based) but no closing marker after it.
    UnterminatedBlock { open_line: usize },
    DuplicateBlock { first_line: usize, second_line: usize },
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::MissingOpenMarker => write!(f, "opening marker not found"),
            BlockError::UnterminatedBlock { open_line } => write!(
                f,
                "block opened on line {} is never closed",
                open_line
            ),
            BlockError::DuplicateBlock {
                first_line,
                second_line,
            } => write!(
                f,
                "second opening marker on line {} (first on line {})",
                second_line, first_line
            ),
        }
    }
}

enum State {
    Copying,
    Skipping,
}

/// Replace the generated block in `original` with `block`.
///
/// The opening marker line is kept as-is, followed by `block`, a newline, the
/// closing marker and a newline. The original closing line is dropped. The
/// newline style follows the opening marker line.
pub fn replace_block(
    original: &str,
    block: &str,
    markers: &BlockMarkers,
) -> Result<String, BlockError> {
    let mut out = String::with_capacity(original.len() + block.len());
    let mut state = State::Copying;
    let mut open_line = None;

    for (idx, line) in original.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        match state {
            State::Copying => {
                if markers.is_open(line) {
                    if let Some(first_line) = open_line {
                        return Err(BlockError::DuplicateBlock {
                            first_line,
                            second_line: line_no,
                        });
                    }
                    open_line = Some(line_no);

                    let eol = if line.ends_with("\r\n") { "\r\n" } else { "\n" };
                    out.push_str(line);
                    if eol == "\r\n" {
                        out.push_str(&block.replace('\n', "\r\n"));
                    } else {
                        out.push_str(block);
                    }
                    out.push_str(eol);
                    out.push_str(&markers.close);
                    out.push_str(eol);
                    state = State::Skipping;
                } else {
                    out.push_str(line);
                }
            }
            State::Skipping => {
                if markers.is_open(line) {
                    return Err(BlockError::DuplicateBlock {
                        first_line: open_line.unwrap_or_default(),
                        second_line: line_no,
                    });
                }
                if markers.is_close(line) {
                    state = State::Copying;
                }
            }
        }
    }

    match (state, open_line) {
        (_, None) => Err(BlockError::MissingOpenMarker),
        (State::Skipping, Some(open_line)) => Err(BlockError::UnterminatedBlock { open_line }),
        (State::Copying, Some(_)) => Ok(out),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Updated,
    Unchanged,
    /// Contents differ but the file was left alone (dry run).
    WouldUpdate,
}

/// Replace the generated block in the file at `path`.
///
/// Nothing is written on error, when the contents would not change, or when
/// `dry_run` is set.
pub fn rewrite_file(
    path: &Path,
    block: &str,
    markers: &BlockMarkers,
    dry_run: bool,
) -> Result<RewriteOutcome, LinksError> {
    let original = fs::read_to_string(path)?;
    let updated = replace_block(&original, block, markers).map_err(|kind| LinksError::Block {
        path: path.to_path_buf(),
        kind,
    })?;

    if updated == original {
        return Ok(RewriteOutcome::Unchanged);
    }
    if dry_run {
        return Ok(RewriteOutcome::WouldUpdate);
    }

    write_replacing(path, &updated)?;
    Ok(RewriteOutcome::Updated)
}

/// Write to a sibling temp file, then rename it over `path`.
///
/// Symlinks are resolved first so the link stays in place and the file it
/// points to receives the new contents. The target's permissions carry over.
fn write_replacing(path: &Path, contents: &str) -> std::io::Result<()> {
    let target = fs::canonicalize(path)?;
    let permissions = fs::metadata(&target)?.permissions();
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = target.with_file_name(format!(".{}.tmp", file_name));

    let result = fs::write(&tmp, contents)
        .and_then(|()| fs::set_permissions(&tmp, permissions))
        .and_then(|()| fs::rename(&tmp, &target));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
