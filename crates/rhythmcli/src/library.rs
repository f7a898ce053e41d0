//! Pattern-library text files.
//!
//! A library is a sequence of named patterns. Each starts with a header
//! line and continues with one line per step:
//!
//! ```text
//! name, funky drummer 16;
//! 0, 36 42;
//! 1, 0;
//! 2, 42;
//! ```
//!
//! A step holding only key 0 is silent.

use anyhow::{anyhow, bail, Context, Result};
use rhythm_descriptors::PatternList;
use std::collections::BTreeSet;
use tracing::debug;

/// One pattern read from a library file.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryPattern {
    pub name: String,
    pub pattern: PatternList,
}

struct Header {
    name: String,
    declared_len: usize,
}

fn parse_header(rest: &str, line_no: usize) -> Result<Header> {
    let rest = rest.trim().trim_end_matches(';').trim();
    let (name, len) = rest
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| anyhow!("line {line_no}: header needs a name and a length"))?;
    let declared_len = len
        .parse()
        .with_context(|| format!("line {line_no}: invalid pattern length `{len}`"))?;
    Ok(Header {
        name: name.trim().to_string(),
        declared_len,
    })
}

fn parse_step(line: &str, line_no: usize) -> Result<BTreeSet<u8>> {
    let line = line.trim_end_matches(';');
    let (_, keys) = line
        .split_once(',')
        .ok_or_else(|| anyhow!("line {line_no}: expected `<step>, <keys>;`"))?;

    let mut step = BTreeSet::new();
    for token in keys.split_whitespace() {
        let key: u8 = token
            .parse()
            .with_context(|| format!("line {line_no}: invalid instrument key `{token}`"))?;
        if key != 0 {
            step.insert(key);
        }
    }
    Ok(step)
}

/// Parse every pattern in a library, forcing each to `length` steps.
///
/// Patterns with fewer step lines are padded with silence; longer ones
/// are truncated.
pub fn parse_library(text: &str, length: usize) -> Result<Vec<LibraryPattern>> {
    let mut patterns = Vec::new();
    let mut current: Option<(Header, Vec<BTreeSet<u8>>)> = None;

    let mut finish = |entry: Option<(Header, Vec<BTreeSet<u8>>)>| {
        if let Some((header, mut steps)) = entry {
            if steps.len() != header.declared_len {
                debug!(
                    name = %header.name,
                    declared = header.declared_len,
                    read = steps.len(),
                    "pattern length differs from its header"
                );
            }
            steps.resize(length, BTreeSet::new());
            patterns.push(LibraryPattern {
                name: header.name,
                pattern: PatternList::new(steps),
            });
        }
    };

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("name,") {
            finish(current.take());
            current = Some((parse_header(rest, line_no)?, Vec::new()));
            continue;
        }

        match current.as_mut() {
            Some((_, steps)) => steps.push(parse_step(line, line_no)?),
            None => bail!("line {line_no}: step before any `name,` header"),
        }
    }
    finish(current.take());

    Ok(patterns)
}
