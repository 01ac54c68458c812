//! Integration tests for the public API

use chrono::Duration;
use is_tls_expiring::config::Config;
use is_tls_expiring::{Check, CheckError};

#[test]
fn test_public_api_compiles() {
    // Not run: it needs the network. Only checks the API is usable.
    fn check_certificate(hostname: &str) -> Result<(), CheckError> {
        Check::new(hostname, Duration::days(7)).run()
    }

    let _ = check_certificate;
}

#[test]
fn test_error_types_are_public() {
    fn handle_error(err: CheckError) -> String {
        match err {
            CheckError::NotYetValid { common_name, .. } => format!("{} not yet valid", common_name),
            CheckError::Expired { common_name, .. } => format!("{} expired", common_name),
            CheckError::DnsResolution { hostname, .. } => format!("DNS failed for {}", hostname),
            CheckError::ConnectionFailed { address, .. } => {
                format!("Connection failed to {}", address)
            }
            CheckError::HandshakeFailed { details } => format!("Handshake failed: {}", details),
            CheckError::CertificateError { reason } => format!("Certificate error: {}", reason),
            CheckError::OpenSSLError { details } => format!("OpenSSL error: {}", details),
            CheckError::IoError { source } => format!("I/O error: {}", source),
            CheckError::InvalidInput { field, reason } => format!("Invalid {}: {}", field, reason),
            CheckError::Config(e) => format!("Config: {}", e),
        }
    }

    let err = CheckError::InvalidInput {
        field: "test".to_string(),
        reason: "test reason".to_string(),
    };

    assert_eq!(handle_error(err), "Invalid test: test reason");
}

#[test]
fn test_missing_hostname_fails_before_connecting() {
    let err = Config::default().into_check(Vec::new()).unwrap_err();

    assert!(matches!(err, CheckError::InvalidInput { .. }));
    assert!(!err.is_connection_error());
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_check_defaults() {
    let check = Check::new("example.com", Duration::days(7));

    assert_eq!(check.port, is_tls_expiring::DEFAULT_PORT);
    assert_eq!(check.timeout, None);
}
