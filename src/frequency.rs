//! Menu choices for how often a scheduled fetch runs.

use crate::constants::MIN_CUSTOM_INTERVAL_MINUTES;
use crate::error::{Error, Result};
use std::fmt;

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    EveryThirtyMinutes,
    Hourly,
    EverySixHours,
    Daily,
    /// Interval in minutes, validated by [`Frequency::custom`].
    Custom(u32),
}

/// Preset menu entries, in menu order. Choice 5 is the custom interval.
pub const PRESETS: [Frequency; 4] = [
    Frequency::EveryThirtyMinutes,
    Frequency::Hourly,
    Frequency::EverySixHours,
    Frequency::Daily,
];

pub const CUSTOM_CHOICE: u32 = 5;

/// Menu choice as typed by the user, before a custom interval is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Preset(Frequency),
    Custom,
}

/// Parses a 1-5 menu answer.
pub fn parse_choice(input: &str) -> Result<MenuChoice> {
    let invalid = || Error::InvalidMenuChoice(input.trim().to_string());
    let choice: u32 = input.trim().parse().map_err(|_| invalid())?;
    match choice {
        CUSTOM_CHOICE => Ok(MenuChoice::Custom),
        1..=4 => Ok(MenuChoice::Preset(PRESETS[(choice - 1) as usize])),
        _ => Err(invalid()),
    }
}

/// Parses a custom interval in minutes.
pub fn parse_minutes(input: &str) -> Result<Frequency> {
    let minutes: u32 = input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidMinutes(input.trim().to_string()))?;
    Frequency::custom(minutes)
}

impl Frequency {
    /// Validates a custom interval: at least the minimum, and expressible in cron.
    pub fn custom(minutes: u32) -> Result<Self> {
        if minutes < MIN_CUSTOM_INTERVAL_MINUTES {
            return Err(Error::IntervalTooShort {
                minutes,
                min: MIN_CUSTOM_INTERVAL_MINUTES,
            });
        }
        let frequency = Frequency::Custom(minutes);
        if frequency.cron_for_minutes().is_none() {
            return Err(Error::UnsupportedInterval(minutes));
        }
        Ok(frequency)
    }

    fn cron_for_minutes(&self) -> Option<String> {
        let Frequency::Custom(minutes) = *self else {
            return None;
        };
        if minutes < MINUTES_PER_HOUR {
            return Some(format!("*/{} * * * *", minutes));
        }
        if minutes == MINUTES_PER_DAY {
            return Some("0 0 * * *".to_string());
        }
        if minutes % MINUTES_PER_HOUR != 0 {
            return None;
        }
        match minutes / MINUTES_PER_HOUR {
            1 => Some("0 * * * *".to_string()),
            hours if MINUTES_PER_DAY / MINUTES_PER_HOUR % hours == 0 => {
                Some(format!("0 */{} * * *", hours))
            }
            _ => None,
        }
    }

    pub fn cron_expression(&self) -> String {
        match self {
            Frequency::EveryThirtyMinutes => "*/30 * * * *".to_string(),
            Frequency::Hourly => "0 * * * *".to_string(),
            Frequency::EverySixHours => "0 */6 * * *".to_string(),
            Frequency::Daily => "0 0 * * *".to_string(),
            Frequency::Custom(_) => self.cron_for_minutes().unwrap_or_default(),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::EveryThirtyMinutes => write!(f, "every 30 minutes"),
            Frequency::Hourly => write!(f, "every hour"),
            Frequency::EverySixHours => write!(f, "every 6 hours"),
            Frequency::Daily => write!(f, "daily at midnight"),
            Frequency::Custom(minutes) => write!(f, "every {} minutes", minutes),
        }
    }
}
