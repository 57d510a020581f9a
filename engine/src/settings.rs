//! Per-period unlock times.
//!
//! Each of the three daily sections becomes available at a configurable
//! time of day. Times are stored as 24h `HH:MM` strings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MORNING_UNLOCK: UnlockTime = UnlockTime { hour: 9, minute: 0 };
pub const DEFAULT_AFTERNOON_UNLOCK: UnlockTime = UnlockTime {
    hour: 18,
    minute: 0,
};
pub const DEFAULT_EVENING_UNLOCK: UnlockTime = UnlockTime {
    hour: 21,
    minute: 0,
};

/// Path of an owner's time-settings document.
pub fn settings_path(owner_id: &str) -> String {
    format!("users/{}/settings/time-settings", owner_id)
}

/// A time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnlockTime {
    hour: u8,
    minute: u8,
}

impl UnlockTime {
    /// Create a time, rejecting out-of-range values.
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidUnlockTime(format!("{}:{}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    /// Parse a 24h `HH:MM` string.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidUnlockTime(s.to_string());

        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(h) || !two_digits(m) {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;

        Self::new(hour, minute).map_err(|_| invalid())
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for UnlockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for UnlockTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UnlockTime {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<UnlockTime> for String {
    fn from(time: UnlockTime) -> Self {
        time.to_string()
    }
}

/// One of the three daily journal sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Morning, Period::Afternoon, Period::Evening];
}

/// Unlock time for each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSettings {
    pub morning_unlock: UnlockTime,
    pub afternoon_unlock: UnlockTime,
    pub evening_unlock: UnlockTime,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            morning_unlock: DEFAULT_MORNING_UNLOCK,
            afternoon_unlock: DEFAULT_AFTERNOON_UNLOCK,
            evening_unlock: DEFAULT_EVENING_UNLOCK,
        }
    }
}

impl TimeSettings {
    /// Unlock time configured for a period.
    pub fn unlock_for(&self, period: Period) -> UnlockTime {
        match period {
            Period::Morning => self.morning_unlock,
            Period::Afternoon => self.afternoon_unlock,
            Period::Evening => self.evening_unlock,
        }
    }

    /// Whether a period is open at time `now`.
    pub fn is_unlocked(&self, period: Period, now: UnlockTime) -> bool {
        now >= self.unlock_for(period)
    }

    /// All periods open at time `now`, in day order.
    pub fn unlocked_periods(&self, now: UnlockTime) -> Vec<Period> {
        Period::ALL
            .into_iter()
            .filter(|p| self.is_unlocked(*p, now))
            .collect()
    }
}

/// The settings document as stored.
///
/// Fields may be missing or empty in older documents; [`resolve`](Self::resolve)
/// fills each gap with its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTimeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_unlock: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon_unlock: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_unlock: Option<String>,
}

impl StoredTimeSettings {
    /// Resolve into concrete settings, defaulting missing or unreadable fields.
    pub fn resolve(&self) -> TimeSettings {
        fn pick(raw: &Option<String>, default: UnlockTime) -> UnlockTime {
            raw.as_deref()
                .filter(|s| !s.is_empty())
                .and_then(|s| UnlockTime::parse(s).ok())
                .unwrap_or(default)
        }

        TimeSettings {
            morning_unlock: pick(&self.morning_unlock, DEFAULT_MORNING_UNLOCK),
            afternoon_unlock: pick(&self.afternoon_unlock, DEFAULT_AFTERNOON_UNLOCK),
            evening_unlock: pick(&self.evening_unlock, DEFAULT_EVENING_UNLOCK),
        }
    }

    /// Validate every present field.
    pub fn validate(&self) -> Result<()> {
        for raw in [
            &self.morning_unlock,
            &self.afternoon_unlock,
            &self.evening_unlock,
        ]
        .into_iter()
        .flatten()
        {
            UnlockTime::parse(raw)?;
        }
        Ok(())
    }

    /// Merge-write semantics: fields present in `other` overwrite ours.
    pub fn merge(&mut self, other: StoredTimeSettings) {
        if other.morning_unlock.is_some() {
            self.morning_unlock = other.morning_unlock;
        }
        if other.afternoon_unlock.is_some() {
            self.afternoon_unlock = other.afternoon_unlock;
        }
        if other.evening_unlock.is_some() {
            self.evening_unlock = other.evening_unlock;
        }
    }
}

impl From<TimeSettings> for StoredTimeSettings {
    fn from(settings: TimeSettings) -> Self {
        Self {
            morning_unlock: Some(settings.morning_unlock.to_string()),
            afternoon_unlock: Some(settings.afternoon_unlock.to_string()),
            evening_unlock: Some(settings.evening_unlock.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn t(s: &str) -> UnlockTime {
        UnlockTime::parse(s).unwrap()
    }

    #[test]
    fn parse_valid() {
        assert_eq!(t("09:00"), UnlockTime::new(9, 0).unwrap());
        assert_eq!(t("23:59").to_string(), "23:59");
        assert_eq!(t("00:00").to_string(), "00:00");
    }

    #[test]
    fn parse_invalid() {
        for bad in [
            "24:00", "12:60", "9:00", "0900", "ab:cd", "", "12:5", "-1:00", "+9:00", "09:+5",
            "+9:+5", " 9:00",
        ] {
            assert!(
                matches!(UnlockTime::parse(bad), Err(Error::InvalidUnlockTime(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn defaults() {
        let settings = TimeSettings::default();
        assert_eq!(settings.morning_unlock.to_string(), "09:00");
        assert_eq!(settings.afternoon_unlock.to_string(), "18:00");
        assert_eq!(settings.evening_unlock.to_string(), "21:00");
    }

    #[test]
    fn serializes_as_strings() {
        let value = serde_json::to_value(TimeSettings::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "morningUnlock": "09:00",
                "afternoonUnlock": "18:00",
                "eveningUnlock": "21:00"
            })
        );

        let bad: std::result::Result<TimeSettings, _> = serde_json::from_value(json!({
            "morningUnlock": "99:00",
            "afternoonUnlock": "18:00",
            "eveningUnlock": "21:00"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn unlock_checks() {
        let settings = TimeSettings::default();
        assert!(!settings.is_unlocked(Period::Morning, t("08:59")));
        assert!(settings.is_unlocked(Period::Morning, t("09:00")));
        assert_eq!(
            settings.unlocked_periods(t("18:30")),
            vec![Period::Morning, Period::Afternoon]
        );
        assert_eq!(settings.unlocked_periods(t("21:00")).len(), 3);
        assert!(settings.unlocked_periods(t("06:00")).is_empty());
    }

    #[test]
    fn stored_resolve_fills_gaps() {
        let stored = StoredTimeSettings {
            morning_unlock: Some("07:30".into()),
            afternoon_unlock: Some(String::new()),
            evening_unlock: None,
        };
        let settings = stored.resolve();
        assert_eq!(settings.morning_unlock, t("07:30"));
        assert_eq!(settings.afternoon_unlock, DEFAULT_AFTERNOON_UNLOCK);
        assert_eq!(settings.evening_unlock, DEFAULT_EVENING_UNLOCK);
    }

    #[test]
    fn stored_merge() {
        let mut stored = StoredTimeSettings::from(TimeSettings::default());
        stored.merge(StoredTimeSettings {
            evening_unlock: Some("22:15".into()),
            ..Default::default()
        });
        assert_eq!(stored.morning_unlock.as_deref(), Some("09:00"));
        assert_eq!(stored.evening_unlock.as_deref(), Some("22:15"));
        assert!(stored.validate().is_ok());

        stored.morning_unlock = Some("7am".into());
        assert!(stored.validate().is_err());

        stored.morning_unlock = Some("+9:+5".into());
        assert!(stored.validate().is_err());
    }

    #[test]
    fn settings_path_is_owner_scoped() {
        assert_eq!(settings_path("u1"), "users/u1/settings/time-settings");
    }
}
