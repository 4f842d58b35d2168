//! The XML header writer (§4.10): a single self-closing `<Dictionary .../>`
//! element, UTF-16LE encoded, framed with a 4-byte big-endian length prefix
//! and a 4-byte little-endian Adler-32 trailer.

use adler::adler32_slice;
use chrono::Datelike;

use super::config::{Encoding, FormatVersion};
use crate::crypto::encrypt_key;
use crate::Result;

fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#x27;")
}

/// `YYYY-M-D`, current date, months and days NOT zero-padded. Must not use
/// `chrono`'s `%m`/`%d` format specifiers, which always zero-pad.
fn creation_date(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("{}-{}-{}", now.year(), now.month(), now.day())
}

pub struct HeaderFields<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub encoding: Encoding,
    pub version: FormatVersion,
    pub encrypt_key: Option<&'a [u8]>,
    pub user_email: Option<&'a [u8]>,
    pub encrypt_index: bool,
}

fn reg_code(encrypt_key_bytes: Option<&[u8]>, user_email: Option<&[u8]>) -> Result<String> {
    match (encrypt_key_bytes, user_email) {
        (Some(key), Some(email)) => encrypt_key(key, email),
        _ => Ok(String::new()),
    }
}

/// Builds the framed header bytes: length prefix, UTF-16LE element text,
/// Adler-32 trailer.
pub fn build_header(fields: &HeaderFields, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<u8>> {
    let encrypted = encrypted_flags(fields.encrypt_key.is_some(), fields.encrypt_index);
    let reg_code = reg_code(fields.encrypt_key, fields.user_email)?;

    let element = format!(
        "<Dictionary GeneratedByEngineVersion=\"{engine}\" RequiredEngineVersion=\"{engine}\" \
Encrypted=\"{encrypted}\" Encoding=\"{encoding}\" Format=\"Html\" CreationDate=\"{date}\" \
Compact=\"No\" Compat=\"No\" KeyCaseSensitive=\"No\" Description=\"{description}\" \
Title=\"{title}\" DataSourceFormat=\"106\" StyleSheet=\"\" RegisterBy=\"Email\" \
RegCode=\"{reg_code}\" />\r\n\0",
        engine = fields.version.engine_version_str(),
        encoding = fields.encoding.canonical_name(),
        date = creation_date(now),
        description = escape_xml_attr(fields.description),
        title = escape_xml_attr(fields.title),
        reg_code = reg_code,
    );

    let utf16le: Vec<u8> = element
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();

    let mut out = Vec::with_capacity(4 + utf16le.len() + 4);
    out.extend_from_slice(&(utf16le.len() as u32).to_be_bytes());
    out.extend_from_slice(&utf16le);
    out.extend_from_slice(&adler32_slice(&utf16le).to_le_bytes());
    Ok(out)
}

/// The `Encrypted` attribute per §4.10: bitwise OR of 1 (dictionary-key
/// encryption enabled) and 2 (index encryption enabled). Kept as a free
/// function so the assembler, which knows `encrypt_index` and the header
/// writer, which does not, agree on one formula.
pub fn encrypted_flags(encrypt_key_set: bool, encrypt_index: bool) -> u32 {
    (encrypt_key_set as u32) | ((encrypt_index as u32) << 1)
}
