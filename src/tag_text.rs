//! Text carried by the physical tag that selects a playlist.
//!
//! The tag holds one NDEF text record whose text is the playlist's
//! character dir key. Only the record bytes are produced and parsed here;
//! talking to a reader is someone else's job.

use crate::models::{PlaylistId, CHARACTER_DIR_PREFIX};

const LANGUAGE: &str = "en";
/// Well-known, short record, message begin and end.
const RECORD_HEADER: u8 = 0xD1;
const TEXT_TYPE: u8 = b'T';

/// Text written to the tag for `id`.
pub fn tag_text(id: &PlaylistId) -> String {
    id.character_dir()
}

/// A complete NDEF text record for `id`.
pub fn encode_record(id: &PlaylistId) -> Vec<u8> {
    let payload = encode_payload(id);
    let mut record = Vec::with_capacity(payload.len() + 4);
    record.push(RECORD_HEADER);
    record.push(1);
    record.push(payload.len() as u8);
    record.push(TEXT_TYPE);
    record.extend_from_slice(&payload);
    record
}

/// Status byte, language code, then the UTF-8 text.
pub fn encode_payload(id: &PlaylistId) -> Vec<u8> {
    let text = tag_text(id);
    let mut payload = Vec::with_capacity(1 + LANGUAGE.len() + text.len());
    payload.push(LANGUAGE.len() as u8);
    payload.extend_from_slice(LANGUAGE.as_bytes());
    payload.extend_from_slice(text.as_bytes());
    payload
}

/// Extracts the playlist id from a text record payload.
///
/// Returns `None` unless the text starts with the character dir prefix
/// followed by four digits.
pub fn decode_payload(payload: &[u8]) -> Option<PlaylistId> {
    let (&status, rest) = payload.split_first()?;
    if status & 0x80 != 0 {
        // UTF-16 text never carries an id.
        return None;
    }
    let lang_len = (status & 0x3F) as usize;
    let text = std::str::from_utf8(rest.get(lang_len..)?).ok()?;

    let id = text.strip_prefix(CHARACTER_DIR_PREFIX)?.get(..4)?;
    PlaylistId::parse(id).ok()
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
