//! Byte stream decoding.
//!
//! A byte order mark selects UCS-4 (either byte order), UTF-16 or UTF-8.
//! Without one the bytes must be valid UTF-8.

use encoding_rs::{Encoding, UTF_8};

use crate::SourceError;

/// Decode the raw bytes of the resource at `uri` into text.
pub fn decode(uri: &str, bytes: &[u8]) -> Result<String, SourceError> {
    match bytes {
        [0x00, 0x00, 0xFE, 0xFF, rest @ ..] => decode_ucs4(uri, rest, u32::from_be_bytes),
        [0xFF, 0xFE, 0x00, 0x00, rest @ ..] => decode_ucs4(uri, rest, u32::from_le_bytes),
        _ => {
            let (encoding, body) = match Encoding::for_bom(bytes) {
                Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
                None => (UTF_8, bytes),
            };
            encoding
                .decode_without_bom_handling_and_without_replacement(body)
                .map(|text| text.into_owned())
                .ok_or_else(|| SourceError::Decode {
                    uri: uri.to_string(),
                    message: format!("malformed {} input", encoding.name()),
                })
        }
    }
}

fn decode_ucs4(uri: &str, bytes: &[u8], word: fn([u8; 4]) -> u32) -> Result<String, SourceError> {
    let decode_error = |message: String| SourceError::Decode {
        uri: uri.to_string(),
        message,
    };

    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        return Err(decode_error(format!(
            "UCS-4 input length {} is not a multiple of 4",
            bytes.len()
        )));
    }

    let mut text = String::with_capacity(bytes.len() / 4);
    for chunk in chunks {
        let code = word([chunk[0], chunk[1], chunk[2], chunk[3]]);
        match char::from_u32(code) {
            Some(c) => text.push(c),
            None => return Err(decode_error(format!("invalid character 0x{code:x} in encoding"))),
        }
    }
    Ok(text)
}
