use thiserror::Error;

/// Errors that can occur in the WAN failover system
#[derive(Error, Debug)]
pub enum RouteError {
    /// No priority-list entry is currently live and WAN-eligible.
    ///
    /// This is a legitimate "no default route" outcome, resolved by waiting
    /// for the next reconciliation tick.
    #[error("No eligible interface for the default route")]
    NoEligibleInterface,

    /// The name resolver found no device for a logical name
    #[error("Cannot resolve interface name: {0}")]
    UnresolvableName(String),

    /// A default route was requested with neither device nor gateway
    #[error("Invalid default route: interface or gateway required")]
    InvalidDefaultRoute,

    /// Applying the default route to the OS failed
    #[error("Failed to apply default route: {0}")]
    ApplyFailed(String),

    /// An external command failed
    #[error("Failed to execute command: {0}")]
    CommandFailed(String),

    /// Priority list input failed validation
    #[error("Invalid priority list: {0}")]
    InvalidPriorityList(String),

    /// Registry update payload was neither a list nor an object
    #[error("Wrong type of router database: {0}")]
    MalformedUpdate(String),

    /// A name-mapping rule could not be compiled
    #[error("Invalid name mapping pattern: {0}")]
    InvalidMapping(String),

    /// Persisted state could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// IO error
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Shorthand result type for route operations
pub type RouteResult<T> = Result<T, RouteError>;

/// Convert anyhow errors to RouteError
impl From<anyhow::Error> for RouteError {
    fn from(err: anyhow::Error) -> Self {
        RouteError::Unknown(err.to_string())
    }
}

impl From<serde_json::Error> for RouteError {
    fn from(err: serde_json::Error) -> Self {
        RouteError::Persistence(err.to_string())
    }
}
