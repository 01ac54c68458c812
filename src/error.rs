//! Error types for certificate expiry checks.
//!
//! Every way a check can end other than success is a variant of [`CheckError`].
//! The two validity failures carry the offending certificate and boundary; the
//! rest describe why the chain could not be checked at all.

use chrono::{DateTime, Utc};
use std::fmt;
use std::io;

use crate::config::ConfigError;

/// Exit code for a chain that is fully valid at the reference instant.
pub const EXIT_OK: i32 = 0;
/// Exit code when a certificate is no longer valid at the reference instant.
pub const EXIT_EXPIRED: i32 = 1;
/// Exit code when a certificate is not yet valid at the reference instant.
pub const EXIT_NOT_YET_VALID: i32 = 2;
/// Exit code for every error that prevented the check from running.
pub const EXIT_ERROR: i32 = 3;

/// Error type for a failed expiry check.
#[derive(Debug)]
pub enum CheckError {
    /// The reference instant precedes the certificate's `notBefore`
    NotYetValid {
        /// Display name of the certificate
        common_name: String,
        /// Start of validity, in UTC
        not_before: DateTime<Utc>,
    },

    /// The reference instant follows the certificate's `notAfter`
    Expired {
        /// Display name of the certificate
        common_name: String,
        /// End of validity, in UTC
        not_after: DateTime<Utc>,
    },

    /// DNS resolution failed for the given hostname
    DnsResolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TCP connection failed to the target address
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TLS handshake failed
    HandshakeFailed {
        /// Details about why the handshake failed
        details: String,
    },

    /// The peer presented no usable certificate
    CertificateError {
        /// Description of what went wrong
        reason: String,
    },

    /// OpenSSL error occurred
    OpenSSLError {
        /// The underlying OpenSSL error
        details: String,
    },

    /// Generic I/O error
    IoError {
        /// The underlying I/O error
        source: io::Error,
    },

    /// Invalid command line input
    InvalidInput {
        /// Which field/parameter was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },

    /// Configuration file could not be loaded
    Config(ConfigError),
}

impl CheckError {
    /// Maps the error onto the process exit code reported to monitoring scripts.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Expired { .. } => EXIT_EXPIRED,
            Self::NotYetValid { .. } => EXIT_NOT_YET_VALID,
            _ => EXIT_ERROR,
        }
    }

    /// True for the two outcomes that describe a certificate's validity window.
    pub fn is_validity_failure(&self) -> bool {
        matches!(self, Self::Expired { .. } | Self::NotYetValid { .. })
    }

    /// True when the chain could not be retrieved or read.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::DnsResolution { .. }
                | Self::ConnectionFailed { .. }
                | Self::HandshakeFailed { .. }
                | Self::CertificateError { .. }
                | Self::OpenSSLError { .. }
                | Self::IoError { .. }
        )
    }

    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotYetValid {
                common_name,
                not_before,
            } => {
                write!(
                    f,
                    "{} is not going to be valid before {}",
                    common_name, not_before
                )
            }
            Self::Expired {
                common_name,
                not_after,
            } => {
                write!(
                    f,
                    "{} is not going to be valid after {}",
                    common_name, not_after
                )
            }
            Self::DnsResolution { hostname, .. } => {
                write!(
                    f,
                    "Failed to resolve hostname: {}. Check that the hostname is spelled correctly and your DNS configuration is working.",
                    hostname
                )
            }
            Self::ConnectionFailed { address, source } => {
                write!(f, "Connection failed to {}: {}", address, source)
            }
            Self::HandshakeFailed { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::CertificateError { reason } => {
                write!(f, "Certificate error: {}", reason)
            }
            Self::OpenSSLError { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::IoError { source } => {
                write!(f, "I/O error: {}", source)
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid input for '{}': {}", field, reason)
            }
            Self::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::IoError { source } => Some(source),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CheckError {
    fn from(e: io::Error) -> Self {
        Self::IoError { source: e }
    }
}

impl From<ConfigError> for CheckError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<openssl::error::ErrorStack> for CheckError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSLError {
            details: e.to_string(),
        }
    }
}

impl<S: std::fmt::Debug> From<openssl::ssl::HandshakeError<S>> for CheckError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        Self::HandshakeFailed {
            details: format!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_display() {
        let err = CheckError::InvalidInput {
            field: "hostname".to_string(),
            reason: "cannot be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid input for 'hostname': cannot be empty"
        );
    }

    #[test]
    fn test_validity_messages_name_certificate_and_boundary() {
        let instant = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        let expired = CheckError::Expired {
            common_name: "example.com".to_string(),
            not_after: instant,
        };
        assert_eq!(
            expired.to_string(),
            "example.com is not going to be valid after 2030-01-02 03:04:05 UTC"
        );

        let early = CheckError::NotYetValid {
            common_name: "example.com".to_string(),
            not_before: instant,
        };
        assert_eq!(
            early.to_string(),
            "example.com is not going to be valid before 2030-01-02 03:04:05 UTC"
        );
    }

    #[test]
    fn test_exit_codes() {
        let now = Utc::now();
        let expired = CheckError::Expired {
            common_name: "a".to_string(),
            not_after: now,
        };
        let early = CheckError::NotYetValid {
            common_name: "a".to_string(),
            not_before: now,
        };
        let handshake = CheckError::HandshakeFailed {
            details: "no shared cipher".to_string(),
        };
        let input = CheckError::invalid_input("hostname", "missing");

        assert_eq!(expired.exit_code(), EXIT_EXPIRED);
        assert_eq!(early.exit_code(), EXIT_NOT_YET_VALID);
        assert_eq!(handshake.exit_code(), EXIT_ERROR);
        assert_eq!(input.exit_code(), EXIT_ERROR);
        assert!(expired.is_validity_failure());
        assert!(!handshake.is_validity_failure());
        assert!(handshake.is_connection_error());
        assert!(!input.is_connection_error());
    }

    #[test]
    fn test_error_from_handshake_error() {
        let handshake: openssl::ssl::HandshakeError<std::net::TcpStream> =
            openssl::ssl::HandshakeError::SetupFailure(openssl::error::ErrorStack::get());

        let err: CheckError = handshake.into();
        match err {
            CheckError::HandshakeFailed { ref details } => {
                assert!(details.starts_with("stream setup failed"));
            }
            ref other => panic!("Expected HandshakeFailed, got {:?}", other),
        }
        assert!(err.is_connection_error());
        assert_eq!(err.exit_code(), EXIT_ERROR);
    }

    #[test]
    fn test_error_from_io() {
        let err: CheckError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(err.is_connection_error());
        assert_eq!(err.exit_code(), EXIT_ERROR);
    }
}
