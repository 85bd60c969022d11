//! Bookmark title derivation from directory names.
//!
//! Directories are usually numbered so that alphabetical order matches
//! reading order: `01. Introduction`, `02. Chapter One`, `10) Appendix`.
//! The number is only there for sorting, so when an order-number separator
//! is configured everything up to and including its first occurrence is
//! dropped from the bookmark title:
//!
//! - `"02. Chapter Two"` with `"."` → `"Chapter Two"`
//! - `"10) Appendix"` with `")"` → `"Appendix"`
//! - `"ChapterOnlyName"` with `"."` → `"ChapterOnlyName"` (no separator, unchanged)
//!
//! Rename overrides beat all of this; see [`resolve_title`].

/// Strip an ordering prefix up to the first `separator`.
///
/// Falls back to the raw name when the separator does not occur or when
/// nothing but whitespace follows it (`"01."` stays `"01."`).
pub fn strip_order_prefix<'a>(name: &'a str, separator: &str) -> &'a str {
    if separator.is_empty() {
        return name;
    }
    match name.split_once(separator) {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim(),
        _ => name,
    }
}

/// Resolve the display title of a directory bookmark.
///
/// Priority: rename override → separator-stripped name → raw name.
pub fn resolve_title(raw_name: &str, rename: Option<&str>, separator: Option<&str>) -> String {
    if let Some(title) = rename.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    match separator {
        Some(sep) => strip_order_prefix(raw_name, sep).to_string(),
        None => raw_name.to_string(),
    }
}
