//! Utility functions for common operations.
//!
//! - **URL validation**: API base URL policy and safe browser hand-off
//! - **Text processing**: terminal-safe, width-aware rendering of backend text

mod text;
mod url_validator;

pub use text::{display_width, one_line, strip_control_chars, truncate_to_width, wrap_to_width};
pub use url_validator::{validate_api_base, validate_url_for_open, UrlValidationError};
