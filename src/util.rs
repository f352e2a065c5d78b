//! Utility functions with platform-specific implementations.

use std::borrow::Cow;

use encoding_rs::Encoding;

/// Get current time as milliseconds since Unix epoch.
///
/// On native platforms, uses `SystemTime::now()`.
/// On WASM, uses `js_sys::Date::now()`.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn time_now_millis() -> u64 {
    // js_sys::Date::now() returns milliseconds as f64
    js_sys::Date::now() as u64
}

/// Text decoded from raw book bytes.
#[derive(Debug)]
pub struct Decoded<'a> {
    pub text: Cow<'a, str>,
    /// Encoding that decoded the text.
    pub encoding: &'static Encoding,
    /// Whether the bytes started with a byte order mark.
    pub bom: bool,
}

/// Decode raw book bytes to a string.
///
/// Resolution order:
/// 1. A byte order mark, if present
/// 2. The encoding named in `<?xml ... encoding="..."?>`
/// 3. UTF-8
/// 4. Windows-1251 when the bytes are not valid UTF-8 (the usual legacy
///    encoding of FictionBook files)
///
/// The encoding and BOM are reported so the document can be written back
/// the same way with [`encode_text`].
pub fn decode_text(bytes: &[u8]) -> Decoded<'_> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return Decoded { text, encoding, bom: true };
    }

    if let Some(encoding) = extract_xml_encoding(bytes).and_then(|name| Encoding::for_label(name.as_bytes()))
        && encoding != encoding_rs::UTF_8
    {
        let (text, _) = encoding.decode_without_bom_handling(bytes);
        return Decoded { text, encoding, bom: false };
    }

    let (text, malformed) = encoding_rs::UTF_8.decode_without_bom_handling(bytes);
    if !malformed {
        return Decoded {
            text,
            encoding: encoding_rs::UTF_8,
            bom: false,
        };
    }

    let (text, _) = encoding_rs::WINDOWS_1251.decode_without_bom_handling(bytes);
    Decoded {
        text,
        encoding: encoding_rs::WINDOWS_1251,
        bom: false,
    }
}

/// Encode text for output in `encoding`, prefixed with its byte order mark
/// when `bom` is set.
///
/// encoding_rs only encodes into ASCII-compatible encodings (it writes UTF-8
/// for UTF-16), so UTF-16 is encoded from code units here. Characters a
/// legacy encoding cannot represent become numeric character references,
/// which keeps the output well-formed XML.
pub fn encode_text<'a>(text: &'a str, encoding: &'static Encoding, bom: bool) -> Cow<'a, [u8]> {
    if encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE {
        let little = encoding == encoding_rs::UTF_16LE;
        let bytes = bom
            .then_some(0xFEFF_u16)
            .into_iter()
            .chain(text.encode_utf16())
            .flat_map(|unit| if little { unit.to_le_bytes() } else { unit.to_be_bytes() })
            .collect();
        return Cow::Owned(bytes);
    }

    let (bytes, _, _) = encoding.encode(text);
    if bom && encoding == encoding_rs::UTF_8 {
        let mut out = Vec::with_capacity(bytes.len() + 3);
        out.extend_from_slice(b"\xEF\xBB\xBF");
        out.extend_from_slice(&bytes);
        return Cow::Owned(out);
    }
    bytes
}

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` to extract the encoding name.
/// Only the first 100 bytes are checked.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = rest.iter().position(|&b| b == quote)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}

/// Extract local name from namespaced XML name (e.g., "fb:body" -> "body").
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}
