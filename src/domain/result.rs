//! Result type alias for the pipeline

use super::errors::EtlError;

/// Result type alias for pipeline operations
///
/// # Examples
///
/// ```
/// use entsoe_etl::domain::result::Result;
/// use entsoe_etl::domain::errors::EtlError;
///
/// fn failing_function() -> Result<()> {
///     Err(EtlError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, EtlError>;
