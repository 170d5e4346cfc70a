//! Job spec validation.
//!
//! Runs before any token debit; a rejected spec leaves no trace.

use wbgen_core::config::generation::GenerationSettings;
use wbgen_core::error::AppError;
use wbgen_core::result::AppResult;
use wbgen_entity::job::JobSpec;

/// Maximum product name length in characters.
pub const MAX_PRODUCT_NAME_CHARS: usize = 100;
/// Maximum category length in characters.
pub const MAX_CATEGORY_CHARS: usize = 100;
/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
/// Maximum number of source images per job.
pub const MAX_SOURCE_IMAGES: usize = 10;

/// Fragments that mark free text as injection-looking. The fields end up
/// inside provider prompts and rendered pages, so these are rejected
/// outright rather than escaped.
const SUSPICIOUS_FRAGMENTS: &[&str] = &["<script", "javascript:", "${", "{{", "<?", "]]>"];

/// Validate a job spec against the per-kind settings.
pub fn validate_spec(spec: &JobSpec, settings: &GenerationSettings) -> AppResult<()> {
    if spec.product_name.trim().is_empty() {
        return Err(AppError::validation("product_name must not be empty"));
    }
    check_free_text("product_name", &spec.product_name, MAX_PRODUCT_NAME_CHARS)?;

    if spec.category.trim().is_empty() {
        return Err(AppError::validation("category must not be empty"));
    }
    check_free_text("category", &spec.category, MAX_CATEGORY_CHARS)?;

    check_free_text("description", &spec.description, MAX_DESCRIPTION_CHARS)?;

    if spec.source_images.is_empty() {
        return Err(AppError::validation("source_images requires at least one image"));
    }
    if spec.source_images.len() > MAX_SOURCE_IMAGES {
        return Err(AppError::validation(format!(
            "source_images accepts at most {MAX_SOURCE_IMAGES} images"
        )));
    }
    if spec.source_images.iter().any(|path| path.trim().is_empty()) {
        return Err(AppError::validation("source_images contains an empty path"));
    }

    if spec.task_count == 0 {
        return Err(AppError::validation("task_count must be at least 1"));
    }
    if spec.task_count > settings.max_tasks_per_job {
        return Err(AppError::validation(format!(
            "task_count exceeds the maximum of {} for this kind",
            settings.max_tasks_per_job
        )));
    }

    Ok(())
}

fn check_free_text(field: &str, value: &str, max_chars: usize) -> AppResult<()> {
    if value.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "{field} exceeds {max_chars} characters"
        )));
    }
    if value
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err(AppError::validation(format!(
            "{field} contains control characters"
        )));
    }
    let lowered = value.to_lowercase();
    if SUSPICIOUS_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
        return Err(AppError::validation(format!(
            "{field} contains disallowed content"
        )));
    }
    Ok(())
}
