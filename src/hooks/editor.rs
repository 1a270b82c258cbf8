//! Tagged-line editing for shell scripts
//!
//! A tagged line is an optional command followed by a `# <tag>` comment.
//! [`add_or_replace`] and [`remove`] manage that one line and leave every
//! other line of the file alone.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use crate::error::ErrorClass;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("tag is empty")]
    EmptyTag,
    #[error("tag contains line separators")]
    TagHasSeparators,
    #[error("line contains line separators")]
    LineHasSeparators,
    #[error("tag contains the comment marker '#'")]
    TagContainsMarker,
    #[error("{count} lines match the tag {tag:?}, refusing to pick one to remove")]
    AmbiguousTag { tag: String, count: usize },
    #[error("invalid tag pattern")]
    Pattern(#[from] regex::Error),
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EditError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EditError::Io { .. } => ErrorClass::Transport,
            _ => ErrorClass::Validation,
        }
    }
}

fn has_separators(text: &str) -> bool {
    text.contains(|c: char| c == '\n' || c == '\r')
}

/// Check a tag and return it without surrounding whitespace
fn validate_tag(tag: &str) -> Result<&str, EditError> {
    if has_separators(tag) {
        return Err(EditError::TagHasSeparators);
    }
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(EditError::EmptyTag);
    }
    Ok(trimmed)
}

/// `line # tag`, or just `# tag` for an empty line
pub fn tagged_line(line: &str, tag: &str) -> String {
    format!("{} # {}", line.trim(), tag.trim())
        .trim()
        .to_string()
}

/// Indexes of the lines carrying `tag` in a comment.
///
/// This is a substring match: the tag `AUTO` also matches `# AUTO-GENERATED`.
fn matching_lines(lines: &[&str], tag: &str) -> Result<Vec<usize>, EditError> {
    let pattern = Regex::new(&format!(r"#\s*{}", regex::escape(tag)))?;

    Ok(lines
        .iter()
        .enumerate()
        .filter(|(_, line)| pattern.is_match(line))
        .map(|(index, _)| index)
        .collect())
}

/// Collapse blank lines in front of the last line so exactly one separates
/// it from earlier content. A lone blank line before it is dropped.
fn normalize_trailing_spacing(lines: &mut Vec<&str>) {
    loop {
        let last = lines.len() - 1;

        match last {
            0 => return,
            1 => {
                if lines[0].is_empty() {
                    lines.remove(0);
                } else {
                    lines.insert(1, "");
                }
                return;
            }
            _ => {}
        }

        if !lines[last - 1].is_empty() {
            lines.insert(last, "");
            return;
        }
        if !lines[last - 2].is_empty() {
            return;
        }
        lines.remove(last - 1);
    }
}

/// Put `line` tagged with `tag` into `content`.
///
/// The first line already carrying the tag is overwritten in place; further
/// matches are left untouched. Without a match the line is appended after
/// exactly one blank line.
pub fn add_or_replace(content: &str, line: &str, tag: &str) -> Result<String, EditError> {
    let tag = validate_tag(tag)?;
    if has_separators(line) {
        return Err(EditError::LineHasSeparators);
    }
    if tag.contains('#') {
        return Err(EditError::TagContainsMarker);
    }

    let canonical = tagged_line(line, tag);
    let mut lines: Vec<&str> = content.split('\n').collect();

    match matching_lines(&lines, tag)?.first() {
        Some(&index) => lines[index] = canonical.as_str(),
        None => {
            lines.push(canonical.as_str());
            normalize_trailing_spacing(&mut lines);
        }
    }

    Ok(lines.join("\n"))
}

/// Remove the single line tagged with `tag`, then any trailing blank lines.
///
/// No match returns the content unchanged; several matches are an error.
pub fn remove(content: &str, tag: &str) -> Result<String, EditError> {
    let tag = validate_tag(tag)?;
    let mut lines: Vec<&str> = content.split('\n').collect();
    let matches = matching_lines(&lines, tag)?;

    match matches.as_slice() {
        [] => Ok(content.to_string()),
        [index] => {
            lines.remove(*index);
            while lines.last().is_some_and(|line| line.is_empty()) {
                lines.pop();
            }
            Ok(lines.join("\n"))
        }
        _ => Err(EditError::AmbiguousTag {
            tag: tag.to_string(),
            count: matches.len(),
        }),
    }
}

fn read(path: &Path) -> Result<String, EditError> {
    fs::read_to_string(path).map_err(|source| EditError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns whether the file was rewritten
fn write_if_changed(path: &Path, before: &str, after: &str) -> Result<bool, EditError> {
    if before == after {
        return Ok(false);
    }
    fs::write(path, after).map_err(|source| EditError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// [`add_or_replace`] applied to a file. Returns whether the file changed.
pub fn ensure_line(path: &Path, line: &str, tag: &str) -> Result<bool, EditError> {
    let content = read(path)?;
    let updated = add_or_replace(&content, line, tag)?;
    write_if_changed(path, &content, &updated)
}

/// [`remove`] applied to a file. Returns whether the file changed.
pub fn ensure_removed(path: &Path, tag: &str) -> Result<bool, EditError> {
    let content = read(path)?;
    let updated = remove(&content, tag)?;
    write_if_changed(path, &content, &updated)
}
