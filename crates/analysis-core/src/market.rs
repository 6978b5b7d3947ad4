use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// Bar interval requested from a bar source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "2m")]
    Minute2,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "60m")]
    Minute60,
    #[serde(rename = "90m")]
    Minute90,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "5d")]
    Day5,
    #[serde(rename = "1wk")]
    Week1,
    #[serde(rename = "1mo")]
    Month1,
}

impl Interval {
    pub const ALL: [Interval; 12] = [
        Interval::Minute1,
        Interval::Minute2,
        Interval::Minute5,
        Interval::Minute15,
        Interval::Minute30,
        Interval::Minute60,
        Interval::Minute90,
        Interval::Hour1,
        Interval::Day1,
        Interval::Day5,
        Interval::Week1,
        Interval::Month1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute2 => "2m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Minute60 => "60m",
            Interval::Minute90 => "90m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Day5 => "5d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
        }
    }

    /// Sub-daily intervals. Charts label these by time of day.
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::Minute1
                | Interval::Minute2
                | Interval::Minute5
                | Interval::Minute15
                | Interval::Minute30
                | Interval::Minute60
                | Interval::Minute90
                | Interval::Hour1
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace("hr", "h");
        Interval::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == normalized)
            .ok_or_else(|| AnalysisError::InvalidData(format!("unknown interval '{}'", s)))
    }
}

/// How far back a bar request reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "5d")]
    Day5,
    #[serde(rename = "1mo")]
    Month1,
    #[serde(rename = "3mo")]
    Month3,
    #[serde(rename = "6mo")]
    Month6,
    #[serde(rename = "1y")]
    Year1,
    #[serde(rename = "2y")]
    Year2,
    #[serde(rename = "5y")]
    Year5,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub const ALL: [Period; 9] = [
        Period::Day1,
        Period::Day5,
        Period::Month1,
        Period::Month3,
        Period::Month6,
        Period::Year1,
        Period::Year2,
        Period::Year5,
        Period::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day1 => "1d",
            Period::Day5 => "5d",
            Period::Month1 => "1mo",
            Period::Month3 => "3mo",
            Period::Month6 => "6mo",
            Period::Year1 => "1y",
            Period::Year2 => "2y",
            Period::Year5 => "5y",
            Period::Max => "max",
        }
    }

    /// Calendar lookback covered by the period. `None` means all available history.
    pub fn lookback(&self) -> Option<Duration> {
        match self {
            Period::Day1 => Some(Duration::days(1)),
            Period::Day5 => Some(Duration::days(5)),
            Period::Month1 => Some(Duration::days(30)),
            Period::Month3 => Some(Duration::days(90)),
            Period::Month6 => Some(Duration::days(182)),
            Period::Year1 => Some(Duration::days(365)),
            Period::Year2 => Some(Duration::days(730)),
            Period::Year5 => Some(Duration::days(1826)),
            Period::Max => None,
        }
    }

    /// Clamp the period to what the interval can actually serve.
    ///
    /// Providers only keep fine-grained bars for a limited window, so the
    /// selection is pulled back before a request is made:
    /// - `1m` allows `1d`/`5d`, anything else becomes `1d`
    /// - `2m`..`90m` (except `60m`) allow up to `1mo`, anything else becomes `1mo`
    /// - `60m`/`1h` turn `5y`/`max` into `2y`
    pub fn compatible_with(self, interval: Interval) -> Period {
        match interval {
            Interval::Minute1 => match self {
                Period::Day1 | Period::Day5 => self,
                _ => Period::Day1,
            },
            Interval::Minute2
            | Interval::Minute5
            | Interval::Minute15
            | Interval::Minute30
            | Interval::Minute90 => match self {
                Period::Day1 | Period::Day5 | Period::Month1 => self,
                _ => Period::Month1,
            },
            Interval::Minute60 | Interval::Hour1 => match self {
                Period::Year5 | Period::Max => Period::Year2,
                _ => self,
            },
            _ => self,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| AnalysisError::InvalidData(format!("unknown period '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parse() {
        assert_eq!("1d".parse::<Interval>().unwrap(), Interval::Day1);
        assert_eq!("1WK".parse::<Interval>().unwrap(), Interval::Week1);
        assert_eq!("1hr".parse::<Interval>().unwrap(), Interval::Hour1);
        assert!("3h".parse::<Interval>().is_err());
    }

    #[test]
    fn test_period_parse_roundtrip_labels() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
        assert!("10y".parse::<Period>().is_err());
    }

    #[test]
    fn test_one_minute_caps_to_five_days() {
        assert_eq!(Period::Day5.compatible_with(Interval::Minute1), Period::Day5);
        assert_eq!(Period::Month1.compatible_with(Interval::Minute1), Period::Day1);
        assert_eq!(Period::Max.compatible_with(Interval::Minute1), Period::Day1);
    }

    #[test]
    fn test_intraday_caps_to_one_month() {
        for interval in [Interval::Minute2, Interval::Minute15, Interval::Minute90] {
            assert_eq!(Period::Year1.compatible_with(interval), Period::Month1);
            assert_eq!(Period::Day5.compatible_with(interval), Period::Day5);
        }
    }

    #[test]
    fn test_hourly_caps_to_two_years() {
        assert_eq!(Period::Max.compatible_with(Interval::Hour1), Period::Year2);
        assert_eq!(Period::Year5.compatible_with(Interval::Minute60), Period::Year2);
        assert_eq!(Period::Year1.compatible_with(Interval::Minute60), Period::Year1);
    }

    #[test]
    fn test_daily_unrestricted() {
        assert_eq!(Period::Max.compatible_with(Interval::Day1), Period::Max);
        assert_eq!(Period::Day1.compatible_with(Interval::Month1), Period::Day1);
    }

    #[test]
    fn test_intraday_flag() {
        assert!(Interval::Minute90.is_intraday());
        assert!(Interval::Hour1.is_intraday());
        assert!(!Interval::Day5.is_intraday());
    }
}
