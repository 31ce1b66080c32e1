//! Buffered multipart form: text fields plus at most one file part.

use std::collections::HashMap;

use axum::extract::Multipart;

use devhub_core::error::AppError;
use devhub_service::UploadedFile;

/// A multipart body read into memory.
#[derive(Debug, Default)]
pub struct MultipartForm {
    /// Text fields by name. Repeated names keep every value in order.
    fields: HashMap<String, Vec<String>>,
    /// The part that carried a file name, if any.
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Reads every part of `multipart`.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("Malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                if form.file.is_some() {
                    return Err(AppError::bad_request("Only one file may be uploaded"));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Failed to read upload: {e}")))?;
                form.file = Some(UploadedFile { file_name, data });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Failed to read field '{name}': {e}")))?;
                form.fields.entry(name).or_default().push(value);
            }
        }

        Ok(form)
    }

    /// First value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a text field, splitting comma-separated lists.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .into_iter()
            .flatten()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// A boolean field; `true`, `1` and `on` are true, absence is false.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.text(name).map(str::trim), Some("true" | "1" | "on"))
    }
}
