use crate::app::codec;
use crate::app::config::split_front_matter;
use crate::app::error::{DecodeError, Error, Result};
use crate::app::models::{Encoding, WriteIntent, BLOCK_MARKER};
use regex::Regex;
use std::sync::OnceLock;

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Opening fence line, then the shortest body up to a fence at line start.
    PATTERN.get_or_init(|| Regex::new(r"(?ms)^```([^\n]*)\n(.*?)^```").expect("valid block regex"))
}

/// Path and optional encoding tag from a block's opening fence line.
pub fn split_header(raw: &str) -> (&str, Option<Encoding>) {
    let raw = raw.trim();
    let raw = raw.strip_prefix(BLOCK_MARKER).unwrap_or(raw);
    // Only a known tag after the last colon counts, so URLs keep their scheme.
    match raw.rsplit_once(':') {
        Some((path, tag)) => match Encoding::from_tag(tag) {
            Some(encoding) => (path, Some(encoding)),
            None => (raw, None),
        },
        None => (raw, None),
    }
}

/// Vault path a block is restored to; remote URLs lose their scheme.
pub fn restore_path(path: &str) -> String {
    match path.split_once("://") {
        Some((_, rest)) => rest
            .replace(['?', '#'], "_")
            .trim_matches('/')
            .to_string(),
        None => path.to_string(),
    }
}

/// Drops the line break written before the closing fence. A note whose
/// fence lines end in CRLF pads with `\r\n`; any other `\r` is content.
fn strip_padding<'b>(header: &str, body: &'b str) -> &'b str {
    let padding = if header.ends_with('\r') { "\r\n" } else { "\n" };
    body.strip_suffix(padding).unwrap_or(body)
}

/// Decodes one block into a write intent.
pub fn parse_block(header: &str, body: &str) -> Result<WriteIntent> {
    let (path, tag) = split_header(header);
    if path.is_empty() {
        return Err(Error::Decode {
            path: header.trim().to_string(),
            source: DecodeError::MissingPath,
        });
    }
    let encoding = tag.unwrap_or_else(|| {
        if codec::is_plain_text(path) {
            Encoding::Plain
        } else {
            Encoding::Bin
        }
    });

    let content =
        codec::decode(strip_padding(header, body), encoding).map_err(|source| Error::Decode {
            path: path.to_string(),
            source,
        })?;
    Ok(WriteIntent {
        path: restore_path(path),
        content,
        encoding,
    })
}

/// All blocks after the front matter, each decoded independently.
///
/// Fails only when the front matter is missing; per-block failures are
/// returned in place so the caller can report them and carry on.
pub fn parse(document: &str) -> Result<Vec<Result<WriteIntent>>> {
    let (_, body) = split_front_matter(document)?;
    Ok(block_pattern()
        .captures_iter(body)
        .map(|caps| parse_block(&caps[1], &caps[2]))
        .collect())
}
