//! Reading `multipart/form-data` bodies that carry text fields and at most one file.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;

use crate::error::AppError;
use crate::geo::{GeoPoint, PointInput};

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl FormData {
    /// Collects all parts. Only `file_field` may carry a file, and only once.
    pub async fn read(
        multipart: Result<Multipart, MultipartRejection>,
        file_field: &str,
    ) -> Result<Self, AppError> {
        let mut multipart = multipart?;
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::Validation(err.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == file_field {
                if form.file.is_some() {
                    return Err(AppError::Validation(format!(
                        "only one file may be uploaded in {file_field}"
                    )));
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::Validation(err.body_text()))?;
                // Browsers send an empty part for an untouched file input.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.file = Some(UploadedFile { file_name, bytes });
            } else if field.file_name().is_some() {
                return Err(AppError::Validation(format!(
                    "unexpected file in {name}, files go in {file_field}"
                )));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::Validation(err.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// A text field, treating blank values as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    pub fn required(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>, AppError> {
        self.text(name)
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| AppError::Validation(format!("{name} must be an integer")))
            })
            .transpose()
    }

    pub fn required_int(&self, name: &str) -> Result<i64, AppError> {
        self.int(name)?
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    fn float(&self, name: &str) -> Result<Option<f64>, AppError> {
        self.text(name)
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| AppError::Validation(format!("{name} must be a number")))
            })
            .transpose()
    }

    /// A point sent either as JSON text (`{"x": 1, "y": 2}`) or as
    /// bracketed fields (`name[x]`, `name[y]`). Half a point is an error.
    pub fn point(&self, name: &str) -> Result<Option<GeoPoint>, AppError> {
        let input = match self.text(name) {
            Some(raw) => serde_json::from_str::<PointInput>(&raw).map_err(|err| {
                AppError::Validation(format!("{name} must be an object with x and y: {err}"))
            })?,
            None => {
                let x = self.float(&format!("{name}[x]"))?;
                let y = self.float(&format!("{name}[y]"))?;
                if x.is_none() && y.is_none() {
                    return Ok(None);
                }
                PointInput { x, y }
            }
        };

        input
            .into_point()
            .map(Some)
            .map_err(|err| AppError::Validation(format!("{name}: {err}")))
    }

    pub fn required_point(&self, name: &str) -> Result<GeoPoint, AppError> {
        self.point(name)?
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    pub fn take_file(&mut self) -> Option<UploadedFile> {
        self.file.take()
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|value| value.trim().is_empty()) && self.file.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    #[test]
    fn point_from_json_text() {
        let json = form(&[("gps_location", r#"{"x": 13.7, "y": 100.5}"#)]);
        let point = json.point("gps_location").unwrap();
        assert_eq!(point, Some(GeoPoint { x: 13.7, y: 100.5 }));
    }

    #[test]
    fn point_from_bracketed_fields() {
        let bracketed = form(&[("pickup_gps[x]", "13.7"), ("pickup_gps[y]", "100.5")]);
        let point = bracketed.required_point("pickup_gps").unwrap();
        assert_eq!(point, GeoPoint { x: 13.7, y: 100.5 });
    }

    #[test]
    fn half_a_point_is_rejected() {
        let bracketed = form(&[("pickup_gps[x]", "13.7")]);
        assert!(bracketed.point("pickup_gps").is_err());

        let json = form(&[("gps_location", r#"{"x": 13.7}"#)]);
        assert!(json.point("gps_location").is_err());
    }

    #[test]
    fn absent_point_is_none() {
        assert_eq!(form(&[]).point("gps_location").unwrap(), None);
    }

    #[test]
    fn blank_fields_count_as_absent() {
        let blank = form(&[("name", "   "), ("sender_id", "x1")]);
        assert!(blank.text("name").is_none());
        assert!(blank.required("name").is_err());
        assert!(blank.int("sender_id").is_err());
    }
}
