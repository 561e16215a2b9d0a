use thiserror::Error;

/// Errors that stop a hook run.
///
/// Missing facts and relay failures never show up here: facts degrade to
/// defaults and relay failures land in the [`crate::PublishReport`].
#[derive(Debug, Error)]
pub enum HookError {
    /// Missing or malformed secret key
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The repository identity needed for the `d` tag could not be determined
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

impl HookError {
    /// Whether the process should exit with a nonzero status.
    ///
    /// A bad key only skips this run; the commit that triggered it is fine.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HookError::Configuration(_))
    }
}
