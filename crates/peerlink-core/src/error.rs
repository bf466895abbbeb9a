use std::fmt;
use thiserror::Error;

/// Result type alias for peerlink operations
pub type Result<T> = std::result::Result<T, PeerlinkError>;

/// Errors that can occur while building a peer session
#[derive(Error, Debug)]
pub enum PeerlinkError {
    /// A file or directory could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Certificate content could not be parsed
    #[error("malformed certificate in {path}: {reason}")]
    MalformedCertificate {
        /// Source of the certificate bytes
        path: String,
        /// Parser failure description
        reason: String,
    },

    /// Private key content could not be parsed
    #[error("invalid private key in {path}: {reason}")]
    InvalidKey {
        /// Key file that failed to parse
        path: String,
        /// Parser failure description
        reason: String,
    },

    /// The key directory holds no candidate key file
    #[error("no private key found in {path}")]
    EmptyKeyDirectory {
        /// Directory that was searched
        path: String,
    },

    /// The key directory holds more than one candidate and a single key was required
    #[error("expected exactly one private key in {path}, found {count}")]
    AmbiguousKeyDirectory {
        /// Directory that was searched
        path: String,
        /// Number of candidate files
        count: usize,
    },

    /// The organization (MSP) identifier is unusable
    #[error("invalid organization id {value:?}: {reason}")]
    InvalidOrganizationId {
        /// Rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The transport could not be established
    #[error("connection to {endpoint} failed: {reason}")]
    Connection {
        /// Endpoint that was dialed
        endpoint: String,
        /// Failure description
        reason: String,
    },

    /// The peer certificate chain or name was rejected
    #[error("trust verification failed for {authority}: {reason}")]
    TrustVerification {
        /// Host name checked against the peer certificate
        authority: String,
        /// Failure description
        reason: String,
    },

    /// A signature could not be produced
    #[error("signing failed: {0}")]
    Signing(String),

    /// Session composition was attempted with missing parts
    #[error("incomplete session: missing {}", .missing.join(", "))]
    IncompleteSession {
        /// Names of the absent parts
        missing: Vec<&'static str>,
    },

    /// The channel has already been closed
    #[error("channel to {endpoint} is closed")]
    ChannelClosed {
        /// Endpoint of the closed channel
        endpoint: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Fieldless discriminant of [`PeerlinkError`], convenient for matching in tests and callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`PeerlinkError::Io`]
    Io,
    /// See [`PeerlinkError::MalformedCertificate`]
    MalformedCertificate,
    /// See [`PeerlinkError::InvalidKey`]
    InvalidKey,
    /// See [`PeerlinkError::EmptyKeyDirectory`]
    EmptyKeyDirectory,
    /// See [`PeerlinkError::AmbiguousKeyDirectory`]
    AmbiguousKeyDirectory,
    /// See [`PeerlinkError::InvalidOrganizationId`]
    InvalidOrganizationId,
    /// See [`PeerlinkError::Connection`]
    Connection,
    /// See [`PeerlinkError::TrustVerification`]
    TrustVerification,
    /// See [`PeerlinkError::Signing`]
    Signing,
    /// See [`PeerlinkError::IncompleteSession`]
    IncompleteSession,
    /// See [`PeerlinkError::ChannelClosed`]
    ChannelClosed,
    /// See [`PeerlinkError::Config`]
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl PeerlinkError {
    /// Build an I/O error tagged with the offending path
    pub fn io(path: impl fmt::Display, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }

    /// Returns the kind of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::MalformedCertificate { .. } => ErrorKind::MalformedCertificate,
            Self::InvalidKey { .. } => ErrorKind::InvalidKey,
            Self::EmptyKeyDirectory { .. } => ErrorKind::EmptyKeyDirectory,
            Self::AmbiguousKeyDirectory { .. } => ErrorKind::AmbiguousKeyDirectory,
            Self::InvalidOrganizationId { .. } => ErrorKind::InvalidOrganizationId,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::TrustVerification { .. } => ErrorKind::TrustVerification,
            Self::Signing(_) => ErrorKind::Signing,
            Self::IncompleteSession { .. } => ErrorKind::IncompleteSession,
            Self::ChannelClosed { .. } => ErrorKind::ChannelClosed,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns true if retrying the same call could succeed.
    ///
    /// Nothing in this workspace retries; the flag is for callers that own a retry policy.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns true if the error comes from certificate or key trust material
    #[must_use]
    pub const fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedCertificate { .. }
                | Self::InvalidKey { .. }
                | Self::EmptyKeyDirectory { .. }
                | Self::AmbiguousKeyDirectory { .. }
                | Self::InvalidOrganizationId { .. }
        )
    }
}
