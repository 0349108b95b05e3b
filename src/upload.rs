//! Staging of the uploaded `image` field into a per-request temp file.

use std::io::Write;
use std::path::{Path, PathBuf};

use actix_multipart::{Multipart, MultipartError};
use actix_web::web;
use futures_util::StreamExt;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use crate::error::PredictError;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Upload bytes on disk. The file is removed when this value is dropped, so
/// every failure path cleans up; `close` reports deletion errors on success.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    len: usize,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn close(self) -> Result<(), PredictError> {
        self.file.close()?;
        Ok(())
    }
}

/// Run blocking work on the actix thread pool.
pub async fn blocking<F, R>(f: F) -> Result<R, PredictError>
where
    F: FnOnce() -> Result<R, PredictError> + Send + 'static,
    R: Send + 'static,
{
    web::block(f).await.map_err(|_| PredictError::Blocking)?
}

fn classify_multipart_error(err: MultipartError) -> PredictError {
    match err {
        // Not a multipart body at all: there is no image field to read.
        MultipartError::NoContentType
        | MultipartError::ParseContentType
        | MultipartError::Boundary => PredictError::MissingInput,
        other => PredictError::Payload(other.to_string()),
    }
}

/// Write the first file part named `image` into a fresh temp file under `dir`.
///
/// Parts with other names, and an `image` part without a filename, are
/// skipped. Fails with `MissingInput` when no such part exists and with
/// `TooLarge` once more than `limit` bytes have been received.
pub async fn stage_image(
    payload: &mut Multipart,
    dir: &Path,
    limit: usize,
) -> Result<StagedUpload, PredictError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(classify_multipart_error)?;

        let disposition = field.content_disposition();
        let is_image_file =
            disposition.get_name() == Some(IMAGE_FIELD) && disposition.get_filename().is_some();
        if !is_image_file {
            debug!("Skipping multipart field {:?}", disposition.get_name());
            continue;
        }

        let dir: PathBuf = dir.to_path_buf();
        let mut file = blocking(move || {
            Builder::new()
                .prefix("upload-")
                .tempfile_in(&dir)
                .map_err(PredictError::from)
        })
        .await?;

        let mut len = 0usize;
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| PredictError::Payload(e.to_string()))?;
            len += data.len();
            if len > limit {
                return Err(PredictError::TooLarge { limit });
            }
            file = blocking(move || {
                file.write_all(&data)?;
                Ok(file)
            })
            .await?;
        }

        return Ok(StagedUpload { file, len });
    }

    Err(PredictError::MissingInput)
}
