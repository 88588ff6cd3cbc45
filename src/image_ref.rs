//! Opaque `file://` references passed between screens.

use std::fmt;
use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file://";

/// URI naming a picked, captured, cropped or saved image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    /// Build a `file://` reference for a local path.
    pub fn from_path(path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let raw = path_bytes(&absolute);
        if raw.first() == Some(&b'/') {
            Self::from_decoded(&raw)
        } else {
            let mut rooted = Vec::with_capacity(raw.len() + 1);
            rooted.push(b'/');
            rooted.extend_from_slice(&raw);
            Self::from_decoded(&rooted)
        }
    }

    /// Accept a `file://` URI or a plain filesystem path.
    ///
    /// URIs are re-encoded, so equal paths give equal references however
    /// the input was escaped.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(rest) = text.strip_prefix(FILE_SCHEME) {
            if rest.is_empty() {
                return None;
            }
            return Some(Self::from_decoded(&percent_decode(rest)));
        }
        if text.contains("://") {
            return None;
        }
        Some(Self::from_path(Path::new(text)))
    }

    fn from_decoded(raw: &[u8]) -> Self {
        let encoded = percent_encode(raw);
        let mut uri = String::with_capacity(FILE_SCHEME.len() + encoded.len());
        uri.push_str(FILE_SCHEME);
        uri.push_str(&encoded);
        Self(uri)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local path this reference points at.
    pub fn to_path(&self) -> PathBuf {
        let rest = self.0.strip_prefix(FILE_SCHEME).unwrap_or(&self.0);
        let mut decoded = percent_decode(rest);
        // `/C:/Users/...` is a Windows drive path.
        if decoded.len() >= 3 && decoded[0] == b'/' && decoded[2] == b':' {
            decoded.remove(0);
        }
        path_from_bytes(decoded)
    }

    /// Best-effort file name for status messages.
    pub fn display_name(&self) -> String {
        let path = self.to_path();
        path.file_name()
            .and_then(|s| s.to_str())
            .map_or_else(|| path.display().to_string(), ToOwned::to_owned)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().replace('\\', "/").into_bytes()
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(std::ffi::OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

/// Bytes that stay literal in a path segment; everything else is escaped.
const fn is_path_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'/' | b'-' | b'.' | b'_' | b'~' | b'!' | b'$' | b'\'' | b'(' | b')' | b'*' | b',' | b';'
                | b':' | b'@'
        )
}

fn percent_encode(raw: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(raw.len());
    for &byte in raw {
        if is_path_safe(byte) {
            out.push(char::from(byte));
        } else {
            out.push('%');
            out.push(char::from(HEX[usize::from(byte >> 4)]));
            out.push(char::from(HEX[usize::from(byte & 0x0f)]));
        }
    }
    out
}

fn percent_decode(encoded: &str) -> Vec<u8> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%'
            && idx + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[idx + 1]), hex_value(bytes[idx + 2]))
        {
            out.push((hi << 4) | lo);
            idx += 3;
            continue;
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    out
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_round_trips_through_uri() {
        let path = Path::new("/home/user/My Pictures/a?b#c.jpg");
        let uri = ImageRef::from_path(path);
        assert_eq!(
            uri.as_str(),
            "file:///home/user/My%20Pictures/a%3Fb%23c.jpg"
        );
        assert_eq!(uri.to_path(), path);
    }

    #[test]
    fn parse_accepts_plain_paths_and_file_uris() {
        let plain = ImageRef::parse("/tmp/photo.png").expect("plain path");
        assert_eq!(plain.as_str(), "file:///tmp/photo.png");
        let uri = ImageRef::parse("file:///tmp/photo.png").expect("uri");
        assert_eq!(plain, uri);
    }

    #[test]
    fn parse_rejects_foreign_schemes_and_blanks() {
        assert!(ImageRef::parse("content://media/external/images/1").is_none());
        assert!(ImageRef::parse("   ").is_none());
        assert!(ImageRef::parse("file://").is_none());
    }

    #[test]
    fn windows_drive_paths_drop_leading_slash() {
        let uri = ImageRef::parse("file:///C:/Users/me/pic.jpg").expect("uri");
        assert_eq!(uri.to_path(), PathBuf::from("C:/Users/me/pic.jpg"));
    }

    #[test]
    fn parse_normalizes_escaping() {
        let spaced = ImageRef::parse("file:///a b.jpg").expect("uri");
        assert_eq!(spaced, ImageRef::from_path(Path::new("/a b.jpg")));
        assert_eq!(spaced.as_str(), "file:///a%20b.jpg");

        let lower = ImageRef::parse("file:///tmp/caf%c3%a9.jpg").expect("uri");
        let literal = ImageRef::parse("file:///tmp/café.jpg").expect("uri");
        assert_eq!(lower, literal);
        assert_eq!(literal.as_str(), "file:///tmp/caf%C3%A9.jpg");
        assert_eq!(literal.to_path(), Path::new("/tmp/café.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_round_trip() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/tmp/caf\xe9.jpg"));
        let uri = ImageRef::from_path(path);
        assert_eq!(uri.as_str(), "file:///tmp/caf%E9.jpg");
        assert_eq!(uri.to_path(), path);
        assert_eq!(ImageRef::parse(uri.as_str()), Some(uri));
    }

    #[test]
    fn display_name_is_the_file_name() {
        let uri = ImageRef::from_path(Path::new("/tmp/dir/shot.jpg"));
        assert_eq!(uri.display_name(), "shot.jpg");
    }
}
