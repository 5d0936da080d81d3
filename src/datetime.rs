//! Module containing functionality related to BSON datetimes.

use std::{
    fmt,
    time::{Duration, SystemTime},
};

use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};

/// A BSON datetime: a 64-bit count of non-leap milliseconds since January 1,
/// 1970 0:00:00 UTC. Decoding always interprets the value as a UTC instant.
///
/// Equality compares the underlying instant; two values constructed from
/// different wall-clock representations of the same moment are equal.
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct DateTime(i64);

impl DateTime {
    /// The latest datetime representable in BSON.
    pub const MAX: Self = Self::from_millis(i64::MAX);

    /// The earliest datetime representable in BSON.
    pub const MIN: Self = Self::from_millis(i64::MIN);

    /// Makes a new [`DateTime`] from the number of non-leap milliseconds
    /// since the Unix epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns a [`DateTime`] corresponding to the current date and time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Returns the number of non-leap milliseconds since the Unix epoch.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    /// Converts the given [`SystemTime`] to a [`DateTime`], truncating to
    /// millisecond precision and saturating at [`DateTime::MIN`] /
    /// [`DateTime::MAX`].
    pub fn from_system_time(st: SystemTime) -> Self {
        match st.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(d) => {
                if d.as_millis() <= i64::MAX as u128 {
                    Self::from_millis(d.as_millis() as i64)
                } else {
                    Self::MAX
                }
            }
            // SystemTime from before the Unix epoch
            Err(e) => {
                let millis = e.duration().as_millis();
                if millis > i64::MAX as u128 {
                    Self::MIN
                } else {
                    Self::from_millis(-(millis as i64))
                }
            }
        }
    }

    /// Converts this [`DateTime`] to a [`SystemTime`].
    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            SystemTime::UNIX_EPOCH + Duration::from_millis(self.0 as u64)
        } else {
            SystemTime::UNIX_EPOCH - Duration::from_millis(self.0.unsigned_abs())
        }
    }

    /// Converts the given [`time::OffsetDateTime`] to a [`DateTime`],
    /// truncating to millisecond precision.
    pub fn from_time_0_3(dt: time::OffsetDateTime) -> Self {
        let millis = dt.unix_timestamp_nanos() / 1_000_000;
        match i64::try_from(millis) {
            Ok(ts) => Self::from_millis(ts),
            _ if millis > 0 => Self::MAX,
            _ => Self::MIN,
        }
    }

    /// Converts this [`DateTime`] to a [`time::OffsetDateTime`], if it is in
    /// the range the `time` crate supports.
    pub fn to_time_0_3(self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::UNIX_EPOCH.checked_add(time::Duration::milliseconds(self.0))
    }

    /// Converts this [`DateTime`] to an RFC 3339 formatted string.
    ///
    /// Errors for datetimes outside the year range supported by the `time`
    /// crate.
    pub fn try_to_rfc3339_string(self) -> Result<String> {
        let dt = self
            .to_time_0_3()
            .ok_or_else(|| Error::invalid_input(format!("{}ms is out of datetime range", self.0)))?;
        dt.format(&Rfc3339)
            .map_err(|e| Error::invalid_input(format!("cannot format {}ms as RFC 3339: {}", self.0, e)))
    }

    /// Parses an RFC 3339 formatted string into a [`DateTime`], truncating
    /// to millisecond precision.
    pub fn parse_rfc3339_str(s: impl AsRef<str>) -> Result<Self> {
        let odt = time::OffsetDateTime::parse(s.as_ref(), &Rfc3339)
            .map_err(|e| Error::invalid_input(format!("invalid RFC 3339 string: {}", e)))?;
        Ok(Self::from_time_0_3(odt))
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tup = f.debug_tuple("DateTime");
        match self.try_to_rfc3339_string() {
            Ok(s) => tup.field(&s),
            _ => tup.field(&self.0),
        };
        tup.finish()
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_to_rfc3339_string() {
            Ok(s) => f.write_str(&s),
            _ => write!(f, "DateTime({}ms)", self.0),
        }
    }
}

impl From<SystemTime> for DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl From<time::OffsetDateTime> for DateTime {
    fn from(dt: time::OffsetDateTime) -> Self {
        Self::from_time_0_3(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_round_trip() {
        let dt = DateTime::from_millis(1_627_851_066_123);
        assert_eq!(dt.timestamp_millis(), 1_627_851_066_123);
        assert_eq!(DateTime::from_system_time(dt.to_system_time()), dt);
    }

    #[test]
    fn negative_millis() {
        let dt = DateTime::from_millis(-62_135_596_800_000);
        assert_eq!(DateTime::from_system_time(dt.to_system_time()), dt);
    }

    #[test]
    fn rfc3339_round_trip() {
        let dt = DateTime::from_millis(1_627_851_066_123);
        let s = dt.try_to_rfc3339_string().expect("format");
        assert_eq!(s, "2021-08-01T20:51:06.123Z");
        assert_eq!(DateTime::parse_rfc3339_str(s).expect("parse"), dt);
    }

    #[test]
    fn out_of_range_formatting_fails_cleanly() {
        assert!(DateTime::MAX.try_to_rfc3339_string().is_err());
        assert!(DateTime::MIN.try_to_rfc3339_string().is_err());
    }
}
