pub mod candidate;
pub mod job;
pub mod matches;

use uuid::Uuid;

use crate::errors::ValidationError;

/// Unwraps a nullable column, failing with the row identity and column name.
pub(crate) fn required<T>(
    value: Option<T>,
    entity: &'static str,
    id: Uuid,
    field: &'static str,
) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField { entity, id, field })
}
