//! Recognized pass asset names.
//!
//! Wallet only reads a fixed set of image roles from the package root, each
//! at 1x, 2x and 3x density, plus the `pass.json` description.

/// Pass description file. Must be present before a manifest can be built.
pub const PASS_JSON: &str = "pass.json";

/// Name of the generated manifest entry.
pub const MANIFEST_NAME: &str = "manifest.json";

/// Name of the generated signature entry.
pub const SIGNATURE_NAME: &str = "signature";

/// Icon variants; at least one must be present before a manifest can be built.
pub const PASS_ICONS: [&str; 3] = ["icon.png", "icon@2x.png", "icon@3x.png"];

/// Asset names accepted by validated inserts.
pub const ALLOWED_ASSETS: [&str; 19] = [
    "background.png",
    "background@2x.png",
    "background@3x.png",
    "footer.png",
    "footer@2x.png",
    "footer@3x.png",
    "icon.png",
    "icon@2x.png",
    "icon@3x.png",
    "logo.png",
    "logo@2x.png",
    "logo@3x.png",
    "pass.json",
    "strip.png",
    "strip@2x.png",
    "strip@3x.png",
    "thumbnail.png",
    "thumbnail@2x.png",
    "thumbnail@3x.png",
];

/// Returns `true` if `name` is on the allow-list.
pub fn is_allowed(name: &str) -> bool {
    ALLOWED_ASSETS.contains(&name)
}

/// Returns `true` if `name` is one of the generated entries.
pub fn is_reserved(name: &str) -> bool {
    name == MANIFEST_NAME || name == SIGNATURE_NAME
}

/// Checks that `name` can be stored as a zip entry at or below the archive root.
///
/// Returns the reason the name was rejected.
pub(crate) fn check_archive_path(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name.starts_with('/') {
        return Err("absolute paths are not allowed");
    }
    if name.contains('\\') {
        return Err("backslash separators are not allowed");
    }
    if name
        .split('/')
        .any(|component| component.is_empty() || component == "." || component == "..")
    {
        return Err("empty, `.` or `..` path components are not allowed");
    }
    Ok(())
}
