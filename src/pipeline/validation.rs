//! Pipeline specification validation.
//!
//! Catches problems with a spec before any extract is read.

use super::spec::{PipelineSpec, SPEC_VERSION};
use crate::bronze::SourceId;

/// Validation error with the source it concerns, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub source: Option<SourceId>,
    pub message: String,
}

impl ValidationError {
    fn new(source: Option<SourceId>, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
        }
    }

    fn source(source: SourceId, message: impl Into<String>) -> Self {
        Self::new(Some(source), message)
    }

    fn spec(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(source) = self.source {
            write!(f, "Source {source}: {}", self.message)
        } else {
            write!(f, "Spec: {}", self.message)
        }
    }
}

/// Validate a pipeline spec.
///
/// A missing extract is reported as an error here even though the run itself
/// would carry on with the remaining sources; callers decide whether that is
/// fatal.
pub fn validate_pipeline(spec: &PipelineSpec) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if spec.version != SPEC_VERSION {
        errors.push(ValidationError::spec(format!(
            "Unsupported spec version '{}', expected '{SPEC_VERSION}'",
            spec.version
        )));
    }

    if spec.name.trim().is_empty() {
        errors.push(ValidationError::spec("Pipeline name is empty"));
    }

    if !spec.sources.dir.is_dir() {
        errors.push(ValidationError::spec(format!(
            "Source directory not found: {}",
            spec.sources.dir.display()
        )));
        return errors;
    }

    for source in SourceId::ALL {
        if let Some(file) = spec.sources.files.get(&source)
            && file.trim().is_empty()
        {
            errors.push(ValidationError::source(source, "File name override is blank"));
            continue;
        }

        let path = spec.source_path(source);
        if !path.is_file() {
            errors.push(ValidationError::source(
                source,
                format!("Extract not found: {}", path.display()),
            ));
        }
    }

    errors
}
