use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfiguration {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(
        field: &'static str,
        reason: String,
    ) -> Self {
        ConfigError::InvalidConfiguration {
            field,
            reason,
        }
    }
}
