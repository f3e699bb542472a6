//! Player name validation
//!
//! Display names are cleaned up and checked before a player joins a
//! session. Names are only shown to other players, so duplicates are fine,
//! but empty, overly long or inappropriate names are refused.

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;

use crate::constants::names::MAX_LENGTH;

/// Errors that can occur during name validation
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
}

/// Validates a requested display name
///
/// # Arguments
///
/// * `name` - The requested name (will be trimmed of whitespace)
///
/// # Returns
///
/// The cleaned name on success.
///
/// # Errors
///
/// * `Error::Empty` - Name is empty after trimming whitespace
/// * `Error::TooLong` - Name exceeds 30 characters after trimming
/// * `Error::Sinful` - Name contains inappropriate content
pub fn validate(name: &str) -> Result<String, Error> {
    let name = rustrict::trim_whitespace(name);
    if name.is_empty() {
        return Err(Error::Empty);
    }
    if name.chars().count() > MAX_LENGTH {
        return Err(Error::TooLong);
    }
    if name.is_inappropriate() {
        return Err(Error::Sinful);
    }
    Ok(name.to_owned())
}
