//! Error types for hotswap-configurator.

/// Result type alias for hotswap-configurator operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading, watching or reading configuration.
///
/// The first three variants are the construction-time failures. They are
/// also what a failed reload reports through
/// [`ReloadStatus`](crate::core::ReloadStatus) and the reload error hook.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration path could not be made absolute, does not exist,
    /// or is not a regular file.
    #[error("Failed to resolve configuration path: {0}")]
    PathResolutionError(String),

    /// The file content is malformed for the format implied by its extension,
    /// or the extension names no supported format.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// The filesystem watch could not be armed.
    #[error("File watching error: {0}")]
    WatchSetupError(String),

    /// A configuration value could not be deserialized into the requested type.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    /// Returns `true` for errors raised while building a configurator that
    /// leave no configurator behind.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::PathResolutionError(_) | Self::ParseError(_) | Self::WatchSetupError(_)
        )
    }
}
