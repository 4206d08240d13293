use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("invalid input for {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },
}

impl CalcError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        CalcError::InvalidInput { field, reason }
    }
}
