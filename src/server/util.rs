use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const FALLBACK_STEM: &str = "upload";

/// Reduces a client-supplied filename to a safe single path component:
/// ASCII only, separators and whitespace folded to `_`, anything outside
/// `[A-Za-z0-9_.-]` dropped, and no leading or trailing `.`/`_`.
pub(crate) fn secure_filename(name: &str) -> String {
    let ascii: String = name.chars().filter(char::is_ascii).collect();
    let ascii = ascii.replace(['/', '\\'], " ");
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|ch| ch == '.' || ch == '_').to_string()
}

/// Sanitized name, or `upload.<ext>` with the extension sniffed from the
/// content when nothing usable is left of the original.
pub(crate) fn upload_filename(original: &str, bytes: &[u8]) -> String {
    let sanitized = secure_filename(original);
    if !sanitized.is_empty() {
        return sanitized;
    }
    let ext = infer::get(bytes)
        .map(|kind| kind.extension())
        .unwrap_or("bin");
    format!("{}.{}", FALLBACK_STEM, ext)
}

/// Writes the upload under `dir`. Same-named uploads overwrite each other.
pub(crate) fn save_upload(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create upload dir: {}", dir.display()))?;
    let path = dir.join(filename);
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to save upload: {}", path.display()))?;
    Ok(path)
}
