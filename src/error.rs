use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("period catalog unavailable for year {year}: {reason}")]
    CatalogUnavailable { year: i32, reason: String },

    #[error("data field `{field}` failed: {reason}")]
    PartialDataFailure { field: String, reason: String },

    #[error("batch v{version} was cancelled")]
    Cancelled { version: u64 },

    #[error("batch v{version} aborted before completing")]
    Aborted { version: u64 },

    #[error("filter bootstrap did not complete within {waited_ms} ms")]
    BootstrapTimeout { waited_ms: u64 },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("render error: {0}")]
    Render(String),
}

impl ReportError {
    /// Returns `true` for errors that must reach the user as a visible message.
    ///
    /// Everything else degrades silently (hidden panel, dropped batch).
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::CatalogUnavailable { .. } | Self::BootstrapTimeout { .. }
        )
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::ReportError;

    #[test]
    fn only_catalog_and_bootstrap_failures_are_user_visible() {
        assert!(
            ReportError::CatalogUnavailable {
                year: 2024,
                reason: "down".to_owned()
            }
            .is_user_visible()
        );
        assert!(ReportError::BootstrapTimeout { waited_ms: 5000 }.is_user_visible());
        assert!(
            !ReportError::PartialDataFailure {
                field: "origins.tourists.country".to_owned(),
                reason: "500".to_owned()
            }
            .is_user_visible()
        );
        assert!(!ReportError::Cancelled { version: 3 }.is_user_visible());
        assert!(ReportError::Cancelled { version: 3 }.is_cancelled());
        assert!(!ReportError::Aborted { version: 3 }.is_user_visible());
        assert!(!ReportError::Aborted { version: 3 }.is_cancelled());
    }
}
