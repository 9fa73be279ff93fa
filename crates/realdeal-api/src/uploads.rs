use std::path::{Path, PathBuf};

use axum::{
    Extension, Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use realdeal_types::api::UploadResponse;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// Multipart field name the client uses for every file.
pub const FILES_FIELD: &str = "files";
/// Public URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// POST /api/upload: store each `files` part on disk as
/// `<unix millis>-<sanitized name>` and return the public paths.
pub async fn upload_files(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    tokio::fs::create_dir_all(&state.upload_dir).await.map_err(|e| {
        error!("Failed to create upload directory {}: {}", state.upload_dir.display(), e);
        ApiError::Internal(e.into())
    })?;

    let mut stored: Vec<PathBuf> = Vec::new();
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard(&stored).await;
                return Err(e.into());
            }
        };
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        if files.len() == MAX_FILES_PER_REQUEST {
            discard(&stored).await;
            return Err(ApiError::bad_request(format!(
                "At most {MAX_FILES_PER_REQUEST} files per upload"
            )));
        }

        let original = field.file_name().unwrap_or("upload").to_string();
        match write_field(&state, field, &original).await {
            Ok((path, name)) => {
                stored.push(path);
                files.push(format!("{PUBLIC_PREFIX}/{name}"));
            }
            Err(e) => {
                discard(&stored).await;
                return Err(e);
            }
        }
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }

    info!("{} uploaded {} file(s)", user.email, files.len());
    Ok(Json(UploadResponse { success: true, files }))
}

/// Streams one part to disk, enforcing the per-file size limit.
async fn write_field(
    state: &AppState,
    mut field: axum::extract::multipart::Field<'_>,
    original: &str,
) -> Result<(PathBuf, String), ApiError> {
    let (path, name, mut file) = create_unique(&state.upload_dir, original).await?;

    let mut written = 0usize;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                discard(std::slice::from_ref(&path)).await;
                return Err(e.into());
            }
        };
        written += chunk.len();
        if written > state.max_upload_bytes {
            warn!("Upload {} exceeded {} bytes", original, state.max_upload_bytes);
            discard(std::slice::from_ref(&path)).await;
            return Err(ApiError::PayloadTooLarge(state.max_upload_bytes));
        }
        if let Err(e) = file.write_all(&chunk).await {
            error!("Failed to write file {}: {}", path.display(), e);
            discard(std::slice::from_ref(&path)).await;
            return Err(ApiError::Internal(e.into()));
        }
    }

    file.flush().await.map_err(|e| ApiError::Internal(e.into()))?;
    Ok((path, name))
}

/// Opens a new file named `<millis>-<name>`; if that exists (same name in the
/// same millisecond) a short random tag is inserted instead of overwriting.
async fn create_unique(dir: &Path, original: &str) -> Result<(PathBuf, String, tokio::fs::File), ApiError> {
    let safe = sanitize_filename(original);
    let millis = chrono::Utc::now().timestamp_millis();

    let mut name = format!("{millis}-{safe}");
    for _ in 0..3 {
        let path = dir.join(&name);
        match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, name, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let tag = Uuid::new_v4().simple().to_string();
                name = format!("{millis}-{}-{safe}", &tag[..8]);
            }
            Err(e) => {
                error!("Failed to create file {}: {}", path.display(), e);
                return Err(ApiError::Internal(e.into()));
            }
        }
    }
    Err(ApiError::Internal(anyhow::anyhow!("could not pick a free name for {}", safe)))
}

async fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove partial upload {}: {}", path.display(), e);
        }
    }
}

/// Client file name -> a single safe path component: directories dropped,
/// whitespace runs turned into '-', leading dots removed.
pub fn sanitize_filename(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut out = String::with_capacity(base.len());
    let mut in_space = false;
    for c in base.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else if c.is_control() {
            continue;
        } else {
            out.push(c);
            in_space = false;
        }
    }

    let trimmed = out.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_whitespace() {
        assert_eq!(sanitize_filename("my holiday  photo.jpg"), "my-holiday-photo.jpg");
    }

    #[test]
    fn sanitize_strips_directories_and_dots() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\bike.png"), "bike.png");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(".."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
