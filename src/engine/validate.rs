//! Checks a batch request before any work starts.

use crate::engine::batch::BatchRequest;
use crate::engine::core::{TrackKind, TrackSpec};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a request, collecting every problem rather than stopping at the first.
///
/// The source directory must exist. The output directory may be missing, since
/// the batch creates it, but must not be something other than a directory.
/// Every track needs an existing directory and a language code.
pub fn validate_request(request: &BatchRequest) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !request.source_dir.is_dir() {
        errors.push(err(
            "source_dir",
            format!(
                "Invalid series folder: {}",
                request.source_dir.display()
            ),
        ));
    }
    let output = &request.output_dir;
    if output.as_os_str().is_empty() || (output.exists() && !output.is_dir()) {
        errors.push(err(
            "output_dir",
            format!(
                "Invalid output folder: {}",
                request.output_dir.display()
            ),
        ));
    }

    for (index, spec) in request.audio.iter().enumerate() {
        validate_track(TrackKind::Audio, index, spec, &mut errors);
    }
    for (index, spec) in request.subtitles.iter().enumerate() {
        validate_track(TrackKind::Subtitle, index, spec, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_track(
    kind: TrackKind,
    index: usize,
    spec: &TrackSpec,
    errors: &mut Vec<ValidationError>,
) {
    let field = format!("{}[{}]", kind, index);
    if !spec.source_directory.is_dir() {
        errors.push(err(
            &field,
            format!("Invalid path: {}", spec.source_directory.display()),
        ));
    }
    if spec.language_code.trim().is_empty() {
        errors.push(err(&field, "Missing language code".to_string()));
    }
}

fn err(field: &str, message: String) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message,
    }
}
