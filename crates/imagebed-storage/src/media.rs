// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Filename extensions and content-type inference
//!
//! Public image URLs carry the original file's extension (`/image/{key}.webp`).
//! The extension is what picks the served content type; whatever the backend
//! declares is only consulted when the extension is unknown.

/// Extension used when a filename has no recognizable suffix
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Content type served when nothing better is known
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Generic placeholder that upstreams send when they do not know the type
pub const OCTET_STREAM: &str = "application/octet-stream";

const EXTENSION_MIME_TABLE: &[(&str, &str)] = &[
    (".gif", "image/gif"),
    (".png", "image/png"),
    (".webp", "image/webp"),
    (".svg", "image/svg+xml"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".bmp", "image/bmp"),
    (".ico", "image/x-icon"),
    (".tiff", "image/tiff"),
    (".tif", "image/tiff"),
    (".avif", "image/avif"),
    (".heic", "image/heic"),
];

/// Returns the trailing `\.[A-Za-z0-9]+$` suffix of `name`, lower-cased, if any.
pub fn extension_suffix(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    let tail = &name[dot + 1..];
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", tail.to_ascii_lowercase()))
}

/// Derive the public URL extension for an uploaded filename.
///
/// # Examples
///
/// ```
/// use imagebed_storage::media::derive_extension;
///
/// assert_eq!(derive_extension("a.PNG"), ".png");
/// assert_eq!(derive_extension("noext"), ".jpg");
/// ```
pub fn derive_extension(filename: &str) -> String {
    extension_suffix(filename).unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Split a public identifier such as `abc123.png` into `("abc123", Some(".png"))`.
///
/// Identifiers without a recognizable suffix come back unchanged with `None`.
pub fn split_identifier(identifier: &str) -> (&str, Option<String>) {
    match extension_suffix(identifier) {
        Some(ext) => {
            let stem = &identifier[..identifier.len() - ext.len()];
            (stem, Some(ext))
        }
        None => (identifier, None),
    }
}

/// Look up the content type for a dotted, lower-case extension.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    EXTENSION_MIME_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Content type hint for a filename, used when writing blobs.
pub fn mime_for_filename(filename: &str) -> Option<&'static str> {
    extension_suffix(filename).and_then(|ext| mime_for_extension(&ext))
}

/// Pick the content type to serve.
///
/// Priority: the extension table, then a specific backend-declared type,
/// then [`DEFAULT_CONTENT_TYPE`].
pub fn resolve_content_type(extension: Option<&str>, declared: Option<&str>) -> String {
    if let Some(mime) = extension.and_then(mime_for_extension) {
        return mime.to_string();
    }

    match declared.map(str::trim) {
        Some(declared) if !declared.is_empty() && !declared.eq_ignore_ascii_case(OCTET_STREAM) => {
            declared.to_string()
        }
        _ => DEFAULT_CONTENT_TYPE.to_string(),
    }
}
