//! Blob naming and MIME detection.

use uuid::Uuid;

/// Lowercased extension of `file_name`, if it has one.
fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.contains(['/', '\\']) {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Fresh object-store name for an upload called `file_name`: `<uuid>.<ext>`.
///
/// Files without an extension get a bare uuid.
pub fn blob_name(file_name: &str) -> String {
    match extension(file_name) {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    }
}

/// Guess MIME type from a file path extension.
pub fn mime_from_path(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
