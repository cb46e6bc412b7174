use thiserror::Error;

/// Recoverable kernel errors.
///
/// Broken invariants are not reported here: they halt the kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("thread limit reached ({limit} live threads)")]
    ThreadLimit { limit: usize },

    #[error("failed to create execution context: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
