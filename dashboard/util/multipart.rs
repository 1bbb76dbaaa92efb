/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: Option<String>,
    /// Set only for file uploads.
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    pub fn text(&self) -> Option<String> {
        String::from_utf8(self.data.clone()).ok()
    }
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
}

/// Reads a quoted `key="..."` attribute from a part's header block.
/// `key` must include the leading separator (e.g. `; name=`) so that `name=`
/// does not match inside `filename=`.
fn header_attr(headers: &str, key: &str) -> Option<String> {
    let pos = headers.find(key)?;
    let rest = headers[pos + key.len()..].strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_owned())
}

/// Parses a multipart body into its parts. Malformed parts (no header/body
/// separator) are skipped.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Vec<Part> {
    let delimiter = format!("--{}", boundary);
    let sep = b"\r\n\r\n";

    split_on(body, delimiter.as_bytes())
        .into_iter()
        .filter_map(|part| {
            let sep_pos = find_subsequence(part, sep)?;
            let headers = String::from_utf8_lossy(&part[..sep_pos]);
            let raw = &part[sep_pos + sep.len()..];
            let data = raw.strip_suffix(b"\r\n").unwrap_or(raw).to_vec();
            Some(Part {
                name: header_attr(&headers, "; name="),
                filename: header_attr(&headers, "; filename="),
                data,
            })
        })
        .collect()
}

/// First text field named `name`.
pub fn text_field(parts: &[Part], name: &str) -> Option<String> {
    parts.iter()
        .find(|p| !p.is_file() && p.name.as_deref() == Some(name))
        .and_then(|p| p.text())
}

/// Bytes of the first non-empty file upload.
pub fn first_file(parts: &[Part]) -> Option<&[u8]> {
    parts.iter()
        .find(|p| p.is_file() && !p.data.is_empty())
        .map(|p| p.data.as_slice())
}
