use std::path::{Path, PathBuf};

use logitrack_core::Attachment;

use crate::StoreError;

/// Write an attachment's bytes into `dir`.
///
/// Only the final path component of `filename` is used, so a record's
/// declared name cannot point outside `dir`. Falls back to the attachment's
/// own filename, then to `default_filename`.
pub async fn save_attachment(
    attachment: &Attachment,
    filename: Option<&str>,
    default_filename: &str,
    dir: &Path,
) -> Result<PathBuf, StoreError> {
    let name = [filename, Some(attachment.filename())]
        .into_iter()
        .flatten()
        .find_map(safe_file_name)
        .unwrap_or_else(|| default_filename.to_string());
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, attachment.bytes()).await?;
    tracing::debug!("saved {} bytes to {}", attachment.len(), path.display());
    Ok(path)
}

fn safe_file_name(candidate: &str) -> Option<String> {
    let normalized = candidate.replace('\\', "/");
    let name = Path::new(&normalized).file_name()?.to_str()?.trim();
    if name.is_empty() || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
