//! Multipart upload spooling
//!
//! File-upload routes stream each multipart file part into the route's
//! `temp_dir` under a unique name. The spooled paths ride along as
//! `rq_file_*` occurrences for the backend; text parts become the form
//! object. Temp files are request-scoped: the batch holds their RAII
//! paths, so they are deleted when the request finishes, success or not.

use std::io::Write;
use std::path::{Path, PathBuf};

use axum::extract::{FromRequest, Multipart, Request};
use restin_codec::ext_fields;
use restin_protocol::{FieldValue, TpError, TypedBuffer};
use serde_json::Value;
use tempfile::TempPath;

/// One spooled upload
pub(crate) struct SpooledFile {
    /// Spool location handed to the backend
    pub path: PathBuf,
    /// Client-supplied file name
    pub file_name: String,
    /// Multipart field the file arrived under
    pub form_field: String,
    /// Deletes the spool file when the request ends
    _guard: TempPath,
}

/// Everything extracted from one multipart request
pub(crate) struct UploadBatch {
    /// Spooled files in arrival order
    pub files: Vec<SpooledFile>,
    /// Non-file form fields
    pub form: serde_json::Map<String, Value>,
}

/// Stream the multipart body into the spool directory
pub(crate) async fn spool(req: Request, temp_dir: &Path) -> Result<UploadBatch, TpError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| TpError::invalid(format!("not a multipart request: {e}")))?;

    let mut batch = UploadBatch {
        files: Vec::new(),
        form: serde_json::Map::new(),
    };

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| TpError::invalid(format!("bad multipart body: {e}")))?
    {
        let form_field = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let text = field
                .text()
                .await
                .map_err(|e| TpError::invalid(format!("bad form field: {e}")))?;
            batch.form.insert(form_field, Value::String(text));
            continue;
        };

        let mut spool = tempfile::Builder::new()
            .prefix("restin-upload-")
            .tempfile_in(temp_dir)
            .map_err(|e| TpError::system(format!("cannot spool upload: {e}")))?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| TpError::invalid(format!("upload interrupted: {e}")))?
        {
            spool
                .write_all(&chunk)
                .map_err(|e| TpError::system(format!("cannot write upload: {e}")))?;
        }

        let guard = spool.into_temp_path();
        tracing::debug!(
            file = %file_name,
            spool = %guard.display(),
            "upload spooled"
        );
        batch.files.push(SpooledFile {
            path: guard.to_path_buf(),
            file_name,
            form_field,
            _guard: guard,
        });
    }

    Ok(batch)
}

/// Install the batch into the decoded ext record
pub(crate) fn install(buffer: &mut TypedBuffer, batch: &UploadBatch) {
    let Some(record) = buffer.as_record_mut() else {
        return;
    };

    if !batch.form.is_empty() {
        record.set(
            ext_fields::RQ_FORM,
            FieldValue::Json(Value::Object(batch.form.clone())),
        );
    }

    for file in &batch.files {
        record.add(
            ext_fields::RQ_FILE_PATH,
            file.path.display().to_string(),
        );
        record.add(ext_fields::RQ_FILE_NAME, file.file_name.as_str());
        record.add(ext_fields::RQ_FILE_FORM, file.form_field.as_str());
    }
}
