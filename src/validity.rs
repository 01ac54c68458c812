//! Certificate validity windows and the point-in-time check against them.

use chrono::{DateTime, TimeZone, Utc};
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509Ref};

use crate::error::CheckError;

/// The part of a certificate this crate cares about: a name and its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateValidity {
    pub common_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

/// Outcome of checking one certificate against a reference instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    NotYetValid {
        common_name: String,
        not_before: DateTime<Utc>,
    },
    Expired {
        common_name: String,
        not_after: DateTime<Utc>,
    },
}

impl CertificateValidity {
    /// Builds a window from instants in any timezone; both are stored in UTC.
    pub fn new<A: TimeZone, B: TimeZone>(
        common_name: impl Into<String>,
        not_before: DateTime<A>,
        not_after: DateTime<B>,
    ) -> Self {
        CertificateValidity {
            common_name: common_name.into(),
            not_before: not_before.with_timezone(&Utc),
            not_after: not_after.with_timezone(&Utc),
        }
    }

    /// Reads the subject name and validity window out of a parsed certificate.
    pub fn from_x509(cert: &X509Ref) -> Result<Self, CheckError> {
        Ok(CertificateValidity {
            common_name: display_name(cert.subject_name()),
            not_before: asn1_to_utc(cert.not_before())?,
            not_after: asn1_to_utc(cert.not_after())?,
        })
    }

    /// Checks whether `point_in_time` lies within `[not_before, not_after]`.
    pub fn validate<Tz: TimeZone>(&self, point_in_time: &DateTime<Tz>) -> Validity {
        validate(self, point_in_time)
    }
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    /// Converts a failed outcome into the matching [`CheckError`].
    pub fn into_result(self) -> Result<(), CheckError> {
        match self {
            Validity::Valid => Ok(()),
            Validity::NotYetValid {
                common_name,
                not_before,
            } => Err(CheckError::NotYetValid {
                common_name,
                not_before,
            }),
            Validity::Expired {
                common_name,
                not_after,
            } => Err(CheckError::Expired {
                common_name,
                not_after,
            }),
        }
    }
}

/// Validates a certificate window against a reference instant.
///
/// Both ends of the window are inclusive. The instant is normalized to UTC
/// first, so the same moment expressed in any timezone gives the same result.
pub fn validate<Tz: TimeZone>(
    cert: &CertificateValidity,
    point_in_time: &DateTime<Tz>,
) -> Validity {
    let at = point_in_time.with_timezone(&Utc);

    if at < cert.not_before {
        return Validity::NotYetValid {
            common_name: cert.common_name.clone(),
            not_before: cert.not_before,
        };
    }

    if at > cert.not_after {
        return Validity::Expired {
            common_name: cert.common_name.clone(),
            not_after: cert.not_after,
        };
    }

    Validity::Valid
}

/// Subject common name, or the full subject when there is no CN.
fn display_name(subject: &X509NameRef) -> String {
    if let Some(cn) = subject.entries_by_nid(Nid::COMMONNAME).next() {
        if let Ok(name) = cn.data().to_string() {
            return name;
        }
    }

    subject
        .entries()
        .filter_map(|entry| {
            let key = entry.object().nid().short_name().ok()?;
            let value = entry.data().to_string().ok()?;
            Some(format!("{}={}", key, value))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn asn1_to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>, CheckError> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    let secs = i64::from(diff.days) * 86_400 + i64::from(diff.secs);

    DateTime::from_timestamp(secs, 0).ok_or_else(|| CheckError::CertificateError {
        reason: format!("validity timestamp {} is out of range", time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn window(from: Duration, to: Duration, now: DateTime<Utc>) -> CertificateValidity {
        CertificateValidity::new("example.com", now + from, now + to)
    }

    #[test]
    fn test_valid_certificate() {
        let now = Utc::now();
        let cert = window(Duration::hours(-24), Duration::hours(24), now);
        assert_eq!(validate(&cert, &now), Validity::Valid);
    }

    #[test]
    fn test_not_yet_valid_certificate() {
        let now = Utc::now();
        let cert = window(Duration::hours(24), Duration::hours(48), now);
        assert_eq!(
            validate(&cert, &now),
            Validity::NotYetValid {
                common_name: "example.com".to_string(),
                not_before: now + Duration::hours(24),
            }
        );
    }

    #[test]
    fn test_expired_certificate() {
        let now = Utc::now();
        let cert = window(Duration::hours(-48), Duration::hours(-24), now);
        assert_eq!(
            validate(&cert, &now),
            Validity::Expired {
                common_name: "example.com".to_string(),
                not_after: now - Duration::hours(24),
            }
        );
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let now = Utc::now();
        let cert = window(Duration::hours(-1), Duration::hours(1), now);

        assert!(validate(&cert, &cert.not_before).is_valid());
        assert!(validate(&cert, &cert.not_after).is_valid());
        assert!(!validate(&cert, &(cert.not_before - Duration::seconds(1))).is_valid());
        assert!(!validate(&cert, &(cert.not_after + Duration::seconds(1))).is_valid());
    }

    #[test]
    fn test_timezone_invariance() {
        let now = Utc::now();
        let cert = window(Duration::hours(-2), Duration::hours(2), now);
        let zones = [
            FixedOffset::east_opt(0).unwrap(),
            FixedOffset::east_opt(9 * 3600).unwrap(),
            FixedOffset::west_opt(5 * 3600 + 1800).unwrap(),
        ];

        for offset in [Duration::hours(-3), Duration::zero(), Duration::hours(3)] {
            let instant = now + offset;
            let expected = validate(&cert, &instant);
            for zone in zones {
                assert_eq!(validate(&cert, &instant.with_timezone(&zone)), expected);
            }
        }
    }

    #[test]
    fn test_window_is_normalized_to_utc() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let start = tokyo.with_ymd_and_hms(2030, 6, 1, 9, 0, 0).unwrap();
        let end = tokyo.with_ymd_and_hms(2030, 6, 2, 9, 0, 0).unwrap();
        let cert = CertificateValidity::new("tz.example", start, end);

        assert_eq!(
            cert.not_before,
            Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap()
        );
        let just_before = Utc.with_ymd_and_hms(2030, 5, 31, 23, 59, 59).unwrap();
        assert!(matches!(
            cert.validate(&just_before),
            Validity::NotYetValid { .. }
        ));
    }

    #[test]
    fn test_into_result() {
        let now = Utc::now();
        assert!(Validity::Valid.into_result().is_ok());

        let err = window(Duration::hours(-48), Duration::hours(-24), now)
            .validate(&now)
            .into_result()
            .unwrap_err();
        assert!(matches!(err, CheckError::Expired { .. }));

        let err = window(Duration::hours(24), Duration::hours(48), now)
            .validate(&now)
            .into_result()
            .unwrap_err();
        assert!(matches!(err, CheckError::NotYetValid { .. }));
    }

    #[test]
    fn test_asn1_to_utc() {
        let time = Asn1Time::from_unix(1_700_000_000).unwrap();
        assert_eq!(
            asn1_to_utc(&time).unwrap(),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        );
    }
}
