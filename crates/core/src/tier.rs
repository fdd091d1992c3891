//! Loyalty tier classification.
//!
//! A customer's tier is derived from annual spend and purchase recency every time it is read;
//! it is never stored. The reference instant is always passed in by the caller.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const PLATINUM_MIN_SPEND: i64 = 10_000;
const PLATINUM_MAX_MONTHS: i64 = 6;
const GOLD_MIN_SPEND: i64 = 1_000;
const GOLD_MAX_MONTHS: i64 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Platinum,
    Gold,
    Silver,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platinum => "Platinum",
            Self::Gold => "Gold",
            Self::Silver => "Silver",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a customer; rules are evaluated top to bottom and the first match wins.
///
/// - no recorded spend: `Silver`
/// - spend >= 10000 and last purchase at most 6 calendar months ago: `Platinum`
/// - spend >= 1000 and last purchase at most 12 calendar months ago: `Gold`
/// - everything else: `Silver`
///
/// A missing purchase date never satisfies a recency bound. A purchase dated after `now`
/// counts as recent.
pub fn classify(
    spend: Option<Decimal>,
    last_purchase: Option<DateTime<FixedOffset>>,
    now: DateTime<Utc>,
) -> Tier {
    let Some(spend) = spend else {
        return Tier::Silver;
    };

    let months_since =
        last_purchase.map_or(i64::MAX, |purchased_at| months_between(purchased_at, now));

    if spend >= Decimal::from(PLATINUM_MIN_SPEND) && months_since <= PLATINUM_MAX_MONTHS {
        Tier::Platinum
    } else if spend >= Decimal::from(GOLD_MIN_SPEND) && months_since <= GOLD_MAX_MONTHS {
        Tier::Gold
    } else {
        Tier::Silver
    }
}

/// Whole calendar months from `start` to `end`, truncated toward zero.
///
/// `end` is viewed in `start`'s offset. A month only counts once both the day of month and the
/// time of day of `start` have been reached, so 2026-04-19T12:00 to 2026-10-19T11:59 is 5.
pub fn months_between(start: DateTime<FixedOffset>, end: DateTime<Utc>) -> i64 {
    let start_local = start.naive_local();
    let end_local = end.with_timezone(start.offset()).naive_local();

    let start_date = start_local.date();
    let mut end_date = end_local.date();
    if end_date > start_date && end_local.time() < start_local.time() {
        end_date = end_date.pred_opt().unwrap_or(end_date);
    } else if end_date < start_date && end_local.time() > start_local.time() {
        end_date = end_date.succ_opt().unwrap_or(end_date);
    }

    (packed_month_day(end_date) - packed_month_day(start_date)) / 32
}

fn packed_month_day(date: NaiveDate) -> i64 {
    let proleptic_month = i64::from(date.year()) * 12 + i64::from(date.month0());
    proleptic_month * 32 + i64::from(date.day())
}
