//! Item photos arrive either as an inline `data:` URI (the browser reads the
//! file and embeds it) or as a link to an image hosted elsewhere.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::AppError;

const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

pub fn validate_image(image: &str, max_bytes: usize) -> Result<(), AppError> {
    let image = image.trim();

    if image.starts_with("https://") || image.starts_with("http://") {
        return Ok(());
    }

    let Some(rest) = image.strip_prefix("data:") else {
        return Err(AppError::InvalidInput(
            "Image must be a data URI or an http(s) URL".to_string(),
        ));
    };

    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        AppError::InvalidInput("Image data URI is missing its payload".to_string())
    })?;

    let content_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::InvalidInput("Image data URI must be base64 encoded".to_string()))?
        .to_lowercase();

    if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "Unsupported image type '{}'. Allowed: {}",
            content_type,
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }

    // Reject oversized payloads before decoding them.
    if payload.len() / 4 * 3 > max_bytes {
        return Err(AppError::InvalidInput(format!(
            "Image exceeds the maximum size of {} bytes",
            max_bytes
        )));
    }

    let decoded = STANDARD
        .decode(payload)
        .map_err(|e| AppError::InvalidInput(format!("Image payload is not valid base64: {}", e)))?;

    if decoded.is_empty() {
        return Err(AppError::InvalidInput("Image payload is empty".to_string()));
    }

    if decoded.len() > max_bytes {
        return Err(AppError::InvalidInput(format!(
            "Image exceeds the maximum size of {} bytes",
            max_bytes
        )));
    }

    Ok(())
}
