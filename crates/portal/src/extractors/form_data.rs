//! Form body extractor accepting urlencoded and multipart submissions.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::de::DeserializeOwned;

use common::AppError;

/// A file part of a multipart submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Submitted text fields plus any uploaded files.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl FormData {
    pub fn from_fields(fields: Vec<(String, String)>) -> Self {
        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// Deserialize the text fields into a form type. Repeated names keep
    /// the last value.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| AppError::bad_request(format!("Malformed form submission: {}", e)))
    }

    /// Uploaded file for a field; empty file inputs count as absent.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, file)| file)
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            return Ok(Self::from_fields(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        let mut data = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("Failed to read field: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            match field.file_name().map(|s| s.to_string()) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::bad_request(format!("Failed to read file: {}", e)))?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    data.files.push((
                        name,
                        UploadedFile {
                            file_name,
                            bytes,
                        },
                    ));
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(format!("Failed to read field: {}", e)))?;
                    data.fields.push((name, value));
                }
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::LoginForm;

    #[test]
    fn test_parse_last_value_wins() {
        let data = FormData::from_fields(vec![
            ("username".to_string(), "first".to_string()),
            ("username".to_string(), "second".to_string()),
            ("password".to_string(), "secret".to_string()),
        ]);

        let form: LoginForm = data.parse().unwrap();
        assert_eq!(form.username, "second");
        assert_eq!(form.password, "secret");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let form: LoginForm = FormData::default().parse().unwrap();
        assert!(form.username.is_empty());
    }
}
