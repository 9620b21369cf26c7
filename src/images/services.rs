use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::storage::StorageClient;

/// URL prefix under which stored images are served; also the prefix of
/// every image reference saved on a recipe.
pub const PUBLIC_PREFIX: &str = "uploads";

/// A file that arrived with a create/edit request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub body: Bytes,
}

/// Result of trying to attach an upload. `path` is set only when the bytes
/// were persisted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StoredImage {
    pub path: Option<String>,
    pub warning: Option<String>,
}

/// Last path component of a client-supplied file name, with both `/` and
/// `\` treated as separators.
pub fn sanitize_basename(file_name: &str) -> Option<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let base: String = base.chars().filter(|c| !c.is_control()).collect();
    match base.as_str() {
        "" | "." | ".." => None,
        _ => Some(base),
    }
}

pub fn storage_key(token: &str, base: &str) -> String {
    format!("{token}_{base}")
}

/// Upload time in milliseconds plus a random suffix, so two uploads of the
/// same name never share a key.
fn unique_token() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{millis}-{}", Uuid::new_v4().simple())
}

/// Persists an optional upload. Never fails: a missing upload yields an
/// empty result, a write failure yields a warning for the caller to show.
pub async fn store_upload(storage: &dyn StorageClient, upload: Option<Upload>) -> StoredImage {
    let Some(upload) = upload else {
        return StoredImage::default();
    };
    if upload.body.is_empty() {
        return StoredImage::default();
    }
    let Some(base) = sanitize_basename(&upload.file_name) else {
        warn!(file_name = %upload.file_name, "upload without a usable file name");
        return StoredImage {
            path: None,
            warning: Some("Image upload failed: invalid file name.".into()),
        };
    };

    let key = storage_key(&unique_token(), &base);
    match storage.put_object(&key, upload.body).await {
        Ok(()) => {
            info!(%key, "image stored");
            StoredImage {
                path: Some(format!("{PUBLIC_PREFIX}/{key}")),
                warning: None,
            }
        }
        Err(e) => {
            warn!(error = ?e, %key, "image upload failed");
            StoredImage {
                path: None,
                warning: Some("Image upload failed.".into()),
            }
        }
    }
}
