use crate::models::Season;
use chrono::{Datelike, NaiveDate};

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDate;
}

/// Reads the local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDate {
        self.0
    }
}

/// Maps calendar months onto the Indian cropping seasons.
///
/// - June to October: Kharif
/// - November to March: Rabi
/// - April and May: Zaid
pub struct SeasonResolver;

impl SeasonResolver {
    pub fn resolve(date: NaiveDate) -> Season {
        Self::for_month(date.month())
    }

    pub fn resolve_now(clock: &dyn Clock) -> Season {
        Self::resolve(clock.now())
    }

    fn for_month(month: u32) -> Season {
        match month {
            6..=10 => Season::Kharif,
            4 | 5 => Season::Zaid,
            // 11, 12 and 1-3
            _ => Season::Rabi,
        }
    }
}
