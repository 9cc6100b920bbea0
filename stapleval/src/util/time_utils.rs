//! Instants and durations reported for an OCSP response

use core::{fmt, time::Duration};

use der::asn1::GeneralizedTime;

/// An instant asserted by an OCSP responder, i.e., producedAt, thisUpdate or nextUpdate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct StapleTime(pub der::DateTime);

impl fmt::Display for StapleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<GeneralizedTime> for StapleTime {
    fn from(gt: GeneralizedTime) -> Self {
        StapleTime(gt.to_date_time())
    }
}

impl StapleTime {
    /// Create a [`StapleTime`] from Unix epoch
    pub fn from_unix_secs(v: u64) -> der::Result<Self> {
        Ok(Self(der::DateTime::from_unix_duration(
            Duration::from_secs(v),
        )?))
    }

    /// Return Unix epoch (in seconds) for this value
    pub fn as_unix_secs(&self) -> u64 {
        self.0.unix_duration().as_secs()
    }
}

/// `StapleLifetime` is the signed distance between two [`StapleTime`] values, typically
/// producedAt and nextUpdate.
///
/// A responder may assert a nextUpdate that is not after producedAt, so the value carries a sign
/// rather than saturating at zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StapleLifetime {
    /// True when the end instant precedes the start instant
    pub negative: bool,
    /// Magnitude of the distance
    pub duration: Duration,
}

impl StapleLifetime {
    /// Returns the lifetime from `start` to `end`.
    pub fn between(start: &StapleTime, end: &StapleTime) -> Self {
        let s = start.0.unix_duration();
        let e = end.0.unix_duration();
        if e >= s {
            StapleLifetime {
                negative: false,
                duration: e - s,
            }
        } else {
            StapleLifetime {
                negative: true,
                duration: s - e,
            }
        }
    }

    /// Returns true when the lifetime is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.negative || self.duration.is_zero()
    }
}

/// Hours, minutes and seconds, e.g., 168h0m0s, 5m0s, 30s or 0s.
impl fmt::Display for StapleLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.duration.as_secs();
        if secs == 0 {
            return write!(f, "0s");
        }
        if self.negative {
            write!(f, "-")?;
        }
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        let s = secs % 60;
        if h > 0 {
            write!(f, "{}h{}m{}s", h, m, s)
        } else if m > 0 {
            write!(f, "{}m{}s", m, s)
        } else {
            write!(f, "{}s", s)
        }
    }
}

#[test]
fn lifetime_display_test() {
    let t0 = StapleTime::from_unix_secs(1704067200).unwrap();
    let week = StapleTime::from_unix_secs(1704067200 + 7 * 24 * 3600).unwrap();
    let l = StapleLifetime::between(&t0, &week);
    assert!(!l.negative);
    assert_eq!(Duration::from_secs(168 * 3600), l.duration);
    assert_eq!("168h0m0s", l.to_string());

    let back = StapleLifetime::between(&week, &t0);
    assert!(back.negative);
    assert!(back.is_empty());
    assert_eq!("-168h0m0s", back.to_string());

    let same = StapleLifetime::between(&t0, &t0);
    assert!(same.is_empty());
    assert_eq!("0s", same.to_string());

    let t1 = StapleTime::from_unix_secs(1704067200 + 301).unwrap();
    assert_eq!("5m1s", StapleLifetime::between(&t0, &t1).to_string());
    let t2 = StapleTime::from_unix_secs(1704067200 + 42).unwrap();
    assert_eq!("42s", StapleLifetime::between(&t0, &t2).to_string());
}

#[test]
fn staple_time_display_test() {
    let t0 = StapleTime::from_unix_secs(1704067200).unwrap();
    assert_eq!("2024-01-01T00:00:00Z", t0.to_string());
    assert_eq!(1704067200, t0.as_unix_secs());

    let gt = GeneralizedTime::from_unix_duration(Duration::from_secs(1704672000)).unwrap();
    assert_eq!("2024-01-08T00:00:00Z", StapleTime::from(gt).to_string());
}
