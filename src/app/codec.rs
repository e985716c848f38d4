use crate::app::error::DecodeError;
use crate::app::models::Encoding;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Result of classifying raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    pub fn encoding(&self) -> Encoding {
        match self {
            Content::Text(_) => Encoding::Plain,
            Content::Binary(_) => Encoding::Bin,
        }
    }
}

/// Strict UTF-8 decode decides text vs binary; extensions are not consulted.
pub fn classify(bytes: Vec<u8>) -> Content {
    match String::from_utf8(bytes) {
        Ok(text) => Content::Text(text),
        Err(err) => Content::Binary(err.into_bytes()),
    }
}

/// Extension hint used only when a restored block carries no encoding tag.
pub fn is_plain_text(filename: &str) -> bool {
    const PLAIN_EXTENSIONS: &[&str] = &[
        ".md", ".txt", ".svg", ".html", ".csv", ".css", ".js", ".json", ".xml", ".ts",
    ];
    PLAIN_EXTENSIONS.iter().any(|ext| filename.ends_with(ext))
}

/// Encodes classified content into a block body.
pub fn encode(content: &Content) -> String {
    match content {
        Content::Text(text) => escape_text(text),
        Content::Binary(bytes) => encode_binary(bytes),
    }
}

pub fn escape_text(text: &str) -> String {
    // Backslashes first, so the escape inserted before backticks stays single.
    text.replace('\\', "\\\\").replace('`', "\\`")
}

pub fn unescape_text(body: &str) -> Result<String, DecodeError> {
    validate_escapes(body)?;
    Ok(body.replace("\\`", "`").replace("\\\\", "\\"))
}

fn validate_escapes(body: &str) -> Result<(), DecodeError> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => match bytes.get(i + 1) {
                Some(b'\\') | Some(b'`') => i += 2,
                _ => return Err(DecodeError::InvalidEscape(i)),
            },
            b'`' => return Err(DecodeError::UnescapedBacktick(i)),
            _ => i += 1,
        }
    }
    Ok(())
}

pub fn encode_binary(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Whitespace is dropped first so hand-wrapped bodies still decode.
pub fn decode_binary(body: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Inverse of [`encode`] for a body tagged with `encoding`.
pub fn decode(body: &str, encoding: Encoding) -> Result<Vec<u8>, DecodeError> {
    match encoding {
        Encoding::Plain => unescape_text(body).map(String::into_bytes),
        Encoding::Bin => decode_binary(body),
    }
}
