use std::path::Path;

/// MIME types the upload flow accepts without looking at the extension.
/// `image/jpg` is not a registered type but some clients report it.
pub const ALLOWED_MIMES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// Extensions (with leading dot, lowercase) accepted when the MIME type is not.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

/// Classify a file path by its extension into an image MIME type.
///
/// Returns `None` for anything that is not a recognised image. Extensions are
/// matched case-insensitively.
pub fn classify(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };

    Some(mime)
}

/// True when `mime` is on the upload allow-list.
pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIMES.contains(&mime)
}

/// Dotted, lowercased extension of a file name: `"Photo.PNG"` -> `".png"`.
/// Empty when the name has no dot.
pub fn dotted_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// Extension used by search filters: the lowercased text after the last dot,
/// or the whole lowercased name when there is none.
pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or(filename)
        .to_lowercase()
}
