use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
///
/// Logical failures (provider down, bad symbol, empty result) never reach
/// this type; they terminate as a `success: false` envelope with exit
/// code zero. Only a missing action or a broken output stream makes the
/// process itself fail.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("no action given; run with --help for usage")]
    MissingAction,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingAction | Self::Serialization(_) | Self::Io(_) => 1,
        }
    }
}
