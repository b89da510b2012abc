//! Content-based MIME detection
//!
//! Recognises the raster formats the inspector can probe by their magic
//! bytes, and markup documents by their root element.

/// How far into a text document the root element is searched for.
const MARKUP_SNIFF_WINDOW: usize = 1024;

struct Signature {
    offset: usize,
    magic: &'static [u8],
    mime: &'static str,
}

#[rustfmt::skip]
const SIGNATURES: &[Signature] = &[
    Signature { offset: 0, magic: b"\x89PNG\r\n\x1a\n", mime: "image/png" },
    Signature { offset: 0, magic: b"\xFF\xD8\xFF", mime: "image/jpeg" },
    Signature { offset: 0, magic: b"GIF87a", mime: "image/gif" },
    Signature { offset: 0, magic: b"GIF89a", mime: "image/gif" },
    Signature { offset: 8, magic: b"WEBP", mime: "image/webp" },
    Signature { offset: 0, magic: b"BM", mime: "image/bmp" },
    Signature { offset: 0, magic: b"II*\0", mime: "image/tiff" },
    Signature { offset: 0, magic: b"MM\0*", mime: "image/tiff" },
    Signature { offset: 0, magic: b"\0\0\x01\0", mime: "image/x-icon" },
];

/// Guess a MIME type from content alone.
///
/// Returns `None` when the content matches no known signature; callers fall
/// back to the filename.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    for sig in SIGNATURES {
        let end = sig.offset + sig.magic.len();
        if data.len() >= end && &data[sig.offset..end] == sig.magic {
            // RIFF containers other than WebP share the offset-8 slot
            if sig.mime == "image/webp" && !data.starts_with(b"RIFF") {
                continue;
            }
            return Some(sig.mime);
        }
    }

    match root_element(data)?.to_ascii_lowercase().as_str() {
        "svg" => Some(crate::SVG_MIME),
        "html" => Some("text/html"),
        _ => None,
    }
}

/// Name of the first element of a markup document, local part only.
///
/// Skips a BOM, whitespace, the XML declaration, processing instructions,
/// comments and a DOCTYPE. Returns `None` for anything that is not markup or
/// whose root lies beyond the sniff window.
fn root_element(data: &[u8]) -> Option<String> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let head = &data[..data.len().min(MARKUP_SNIFF_WINDOW)];
    let text = String::from_utf8_lossy(head);
    let mut rest = text.trim_start();

    loop {
        if rest.starts_with("<?") {
            rest = skip_past(rest, "?>")?;
        } else if rest.starts_with("<!--") {
            rest = skip_past(rest, "-->")?;
        } else if rest.starts_with("<!") {
            rest = skip_doctype(rest)?;
        } else {
            break;
        }
        rest = rest.trim_start();
    }

    let name: String = rest
        .strip_prefix('<')?
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.'))
        .collect();
    let local = name.rsplit(':').next().unwrap_or_default();

    (!local.is_empty()).then(|| local.to_string())
}

fn skip_past<'a>(text: &'a str, terminator: &str) -> Option<&'a str> {
    text.find(terminator).map(|at| &text[at + terminator.len()..])
}

/// A DOCTYPE may carry an internal subset in brackets containing `>`.
fn skip_doctype(text: &str) -> Option<&str> {
    let close = text.find('>')?;
    match text.find('[') {
        Some(open) if open < close => {
            let subset_end = skip_past(&text[open..], "]")?;
            skip_past(subset_end, ">")
        }
        _ => Some(&text[close + 1..]),
    }
}
