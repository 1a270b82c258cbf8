//! `go.mod` reader and writer
//!
//! Only `replace` statements are interpreted. Every other line is kept
//! byte-for-byte, so rewriting a file only ever deletes lines.

use std::collections::HashSet;
use std::path::Path;

use super::{Manifest, ManifestError, ManifestFormat, ReplaceDirective};

const REPLACE_USAGE: &str = "usage: replace module/path [v1.2.3] => other/module v1.4 \
                             or replace module/path [v1.2.3] => ../local/directory";

/// [`ManifestFormat`] for Go module files
#[derive(Debug, Clone, Copy, Default)]
pub struct GoModFormat;

impl ManifestFormat for GoModFormat {
    type Manifest = GoMod;

    fn parse(&self, path: &Path, data: &[u8]) -> Result<GoMod, ManifestError> {
        GoMod::parse(path, data)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Other,
    BlockStart,
    BlockEnd,
    Replace(ReplaceDirective),
}

#[derive(Debug, Clone)]
struct Line {
    /// Original text including its line terminator
    raw: String,
    entry: Entry,
    /// Index of the opening line of the enclosing `verb (` block
    block: Option<usize>,
    dropped: bool,
}

/// A parsed `go.mod`
#[derive(Debug, Clone)]
pub struct GoMod {
    lines: Vec<Line>,
}

impl GoMod {
    pub fn parse(path: &Path, data: &[u8]) -> Result<Self, ManifestError> {
        let text = std::str::from_utf8(data).map_err(|_| ManifestError::Encoding {
            path: path.to_path_buf(),
        })?;
        let syntax = |line: usize, message: String| ManifestError::Syntax {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut lines = Vec::new();
        // (index of the opening line, whether it is a replace block)
        let mut open_block: Option<(usize, bool)> = None;

        for (idx, raw) in text.split_inclusive('\n').enumerate() {
            let lineno = idx + 1;
            let tokens = tokenize(raw).map_err(|message| syntax(lineno, message))?;

            let (entry, block) = match (open_block, tokens.as_slice()) {
                (_, []) => (Entry::Other, open_block.map(|(start, _)| start)),
                (Some((start, _)), [close]) if close == ")" => {
                    open_block = None;
                    (Entry::BlockEnd, Some(start))
                }
                (Some((start, true)), spec) => {
                    let directive = parse_replace(spec).map_err(|m| syntax(lineno, m))?;
                    (Entry::Replace(directive), Some(start))
                }
                (Some((start, false)), _) => (Entry::Other, Some(start)),
                (None, [close]) if close == ")" => {
                    return Err(syntax(lineno, "unexpected )".to_string()));
                }
                (None, [verb, open]) if open == "(" => {
                    open_block = Some((idx, verb == "replace"));
                    (Entry::BlockStart, Some(idx))
                }
                (None, [verb, spec @ ..]) if verb == "replace" => {
                    let directive = parse_replace(spec).map_err(|m| syntax(lineno, m))?;
                    (Entry::Replace(directive), None)
                }
                (None, _) => (Entry::Other, None),
            };

            lines.push(Line {
                raw: raw.to_string(),
                entry,
                block,
                dropped: false,
            });
        }

        if let Some((start, _)) = open_block {
            return Err(syntax(start + 1, "unterminated block: missing )".to_string()));
        }

        Ok(Self { lines })
    }

    /// Replace blocks whose every directive has been dropped
    fn emptied_blocks(&self) -> HashSet<usize> {
        let mut emptied = HashSet::new();
        let mut kept = HashSet::new();

        for line in &self.lines {
            if let (Some(start), Entry::Replace(_)) = (line.block, &line.entry) {
                if line.dropped {
                    emptied.insert(start);
                } else {
                    kept.insert(start);
                }
            }
        }

        emptied.retain(|start| !kept.contains(start));
        emptied
    }
}

impl Manifest for GoMod {
    fn directives(&self) -> Vec<ReplaceDirective> {
        self.lines
            .iter()
            .filter(|line| !line.dropped)
            .filter_map(|line| match &line.entry {
                Entry::Replace(directive) => Some(directive.clone()),
                _ => None,
            })
            .collect()
    }

    fn drop_replace(
        &mut self,
        old_path: &str,
        old_version: Option<&str>,
    ) -> Result<(), ManifestError> {
        for line in &mut self.lines {
            if let Entry::Replace(directive) = &line.entry {
                if directive.old_path == old_path && directive.old_version.as_deref() == old_version
                {
                    line.dropped = true;
                }
            }
        }
        Ok(())
    }

    fn format(&self) -> Result<Vec<u8>, ManifestError> {
        let emptied = self.emptied_blocks();
        let mut out = String::new();

        for line in &self.lines {
            if line.dropped || line.block.is_some_and(|start| emptied.contains(&start)) {
                continue;
            }
            out.push_str(&line.raw);
        }

        Ok(out.into_bytes())
    }
}

/// Parse `old [version] => new [version]`
fn parse_replace(spec: &[String]) -> Result<ReplaceDirective, String> {
    let arrow = spec
        .iter()
        .position(|token| token == "=>")
        .ok_or_else(|| REPLACE_USAGE.to_string())?;

    let (old_path, old_version) = match &spec[..arrow] {
        [path] => (path, None),
        [path, version] => (path, Some(version)),
        _ => return Err(REPLACE_USAGE.to_string()),
    };
    let (new_path, new_version) = match &spec[arrow + 1..] {
        [path] => (path, None),
        [path, version] => (path, Some(version)),
        _ => return Err(REPLACE_USAGE.to_string()),
    };

    match new_version {
        None if !is_directory_path(new_path) => Err(
            "replacement module without version must be directory path \
             (rooted or starting with ./ or ../)"
                .to_string(),
        ),
        Some(_) if is_directory_path(new_path) => {
            Err("replacement module directory path must not have version".to_string())
        }
        _ => Ok(ReplaceDirective {
            old_path: old_path.clone(),
            old_version: old_version.cloned(),
            new_path: new_path.clone(),
            new_version: new_version.cloned(),
        }),
    }
}

fn is_directory_path(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/')
        || path.starts_with('\\')
        || path.starts_with(".\\")
        || path.starts_with("..\\")
        || has_drive_letter(path)
}

/// `C:` style prefix of a Windows absolute path
fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Split one line into tokens, stopping at a `//` comment
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => break,
            c @ (b'(' | b')') => {
                tokens.push((c as char).to_string());
                i += 1;
            }
            b'=' if bytes.get(i + 1) == Some(&b'>') => {
                tokens.push("=>".to_string());
                i += 2;
            }
            b'"' => {
                let (token, end) = interpreted_string(line, i)?;
                tokens.push(token);
                i = end;
            }
            b'`' => {
                let len = line[i + 1..]
                    .find('`')
                    .ok_or("unterminated raw string")?;
                tokens.push(line[i + 1..i + 1 + len].to_string());
                i += len + 2;
            }
            _ => {
                let start = i;
                while i < bytes.len() && !is_delimiter(bytes, i) {
                    i += 1;
                }
                tokens.push(line[start..i].to_string());
            }
        }
    }

    Ok(tokens)
}

fn is_delimiter(bytes: &[u8], i: usize) -> bool {
    match bytes[i] {
        b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' | b'"' | b'`' => true,
        b'/' => bytes.get(i + 1) == Some(&b'/'),
        b'=' => bytes.get(i + 1) == Some(&b'>'),
        _ => false,
    }
}

/// Read a double-quoted string starting at `start`; returns the unquoted
/// value and the index just past the closing quote.
fn interpreted_string(line: &str, start: usize) -> Result<(String, usize), String> {
    let mut value = String::new();
    let mut chars = line[start + 1..].char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '"' => return Ok((value, start + offset + 2)),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            '\n' => break,
            _ => value.push(c),
        }
    }

    Err("unterminated quoted string".to_string())
}
