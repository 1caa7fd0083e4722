//! Validation of free-form item fields

pub mod image;
pub mod public_id;

pub use image::validate_image;
pub use public_id::validate_public_id;
