//! Archive key generation shared by all storage backends.
//!
//! Key format: `uploads/{user_id}/{filename}`.

use crate::traits::{StorageError, StorageResult};

/// Prefix under which every archived upload is stored.
pub const ARCHIVE_PREFIX: &str = "uploads";

/// Segment used when the submitter did not provide a user identifier.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Build the archive key for an upload.
///
/// Only the final path component of `filename` is kept, so client-supplied
/// directory parts never end up in the key. Segments that are empty, `.` or
/// `..` are rejected.
pub fn archive_key(user_id: Option<&str>, filename: &str) -> StorageResult<String> {
    let user_segment = match user_id.map(str::trim) {
        None | Some("") => ANONYMOUS_USER,
        Some(user) => {
            if user.contains('/') || user.contains('\\') || is_dot_segment(user) {
                return Err(StorageError::InvalidKey(format!(
                    "user id cannot be used as a path segment: {}",
                    user
                )));
            }
            user
        }
    };

    let name = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || is_dot_segment(name) {
        return Err(StorageError::InvalidKey(format!(
            "filename cannot be used as a path segment: {}",
            filename
        )));
    }

    Ok(format!("{}/{}/{}", ARCHIVE_PREFIX, user_segment, name))
}

fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_key_layout() {
        assert_eq!(
            archive_key(Some("user-42"), "scan.pdf").unwrap(),
            "uploads/user-42/scan.pdf"
        );
    }

    #[test]
    fn test_missing_user_is_anonymous() {
        assert_eq!(
            archive_key(None, "scan.pdf").unwrap(),
            "uploads/anonymous/scan.pdf"
        );
        assert_eq!(
            archive_key(Some("  "), "scan.pdf").unwrap(),
            "uploads/anonymous/scan.pdf"
        );
    }

    #[test]
    fn test_filename_reduced_to_basename() {
        assert_eq!(
            archive_key(Some("u"), "../../etc/passwd").unwrap(),
            "uploads/u/passwd"
        );
        assert_eq!(
            archive_key(Some("u"), "C:\\Users\\me\\invoice.png").unwrap(),
            "uploads/u/invoice.png"
        );
    }

    #[test]
    fn test_invalid_segments_rejected() {
        assert!(archive_key(Some("u"), "").is_err());
        assert!(archive_key(Some("u"), "dir/").is_err());
        assert!(archive_key(Some("u"), "..").is_err());
        assert!(archive_key(Some("a/b"), "f.pdf").is_err());
        assert!(archive_key(Some(".."), "f.pdf").is_err());
    }
}
