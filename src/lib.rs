//! # is-tls-expiring
//!
//! Checks whether every certificate a TLS server presents will still be valid
//! some time from now.
//!
//! The chain is fetched with a real handshake ([`connector::fetch_chain`]), the
//! reference instant is computed once as `now + offset`, and each certificate is
//! validated in server order. The first certificate outside its validity window
//! ends the check.
//!
//! ```no_run
//! use is_tls_expiring::{Check, CheckError};
//!
//! let check = Check::new("example.com", chrono::Duration::days(7));
//! match check.run() {
//!     Ok(()) => println!("valid for at least another week"),
//!     Err(e @ CheckError::Expired { .. }) => println!("{}", e),
//!     Err(e) => println!("could not check: {}", e),
//! }
//! ```

use chrono::{DateTime, Utc};
use log::info;
use openssl::x509::X509;
use std::time::Duration;

pub mod config;
pub mod connector;
pub mod duration;
pub mod error;
pub mod validity;

pub use error::CheckError;
pub use validity::{validate, CertificateValidity, Validity};

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 443;

/// One expiry check against a single host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub host: String,
    pub port: u16,
    /// Offset from now at which the chain must be valid
    pub offset: chrono::Duration,
    /// Network timeout; `None` blocks as long as the platform allows
    pub timeout: Option<Duration>,
}

impl Check {
    /// Creates a check on port 443 without a network timeout.
    pub fn new(host: impl Into<String>, offset: chrono::Duration) -> Self {
        Check {
            host: host.into(),
            port: DEFAULT_PORT,
            offset,
            timeout: None,
        }
    }

    /// The instant the chain is checked against, relative to `now`.
    pub fn reference_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.offset
    }

    /// Fetches the host's chain and validates it at `now + offset`.
    pub fn run(&self) -> Result<(), CheckError> {
        let at = self.reference_instant(Utc::now());
        let chain = connector::fetch_chain(&self.host, self.port, self.timeout)?;
        verify_chain(&chain, at)
    }
}

/// Validates each certificate of `chain`, in order, against `at`.
///
/// Stops at the first certificate that is not valid and returns its failure;
/// certificates after it are never looked at.
pub fn verify_chain(chain: &[X509], at: DateTime<Utc>) -> Result<(), CheckError> {
    info!(
        "Retrieved {} certs. Checking if all are going to be valid on {}:",
        chain.len(),
        at
    );

    for (i, cert) in chain.iter().enumerate() {
        let window = CertificateValidity::from_x509(cert)?;
        info!("{}. {}", i + 1, window.common_name);

        validate(&window, &at).into_result()?;

        info!(
            "  \u{2705} valid between {} and {}",
            window.not_before, window.not_after
        );
    }

    Ok(())
}
