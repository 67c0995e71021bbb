use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::TimeRange;

pub const DAY_MS: i64 = 86_400_000;

/// Timezone a day's midnight is resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DayZone {
    Utc,
    Local,
}

/// One displayed calendar day: the date plus the instant of its midnight.
///
/// The axis always spans 24 hours from `start`, DST transitions included.
/// Doubles as the key that day-scoped async results are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    date: NaiveDate,
    start: DateTime<Utc>,
    zone: DayZone,
}

impl Day {
    /// Day whose midnight is UTC midnight.
    pub fn utc(date: NaiveDate) -> Self {
        Self {
            date,
            start: date.and_time(NaiveTime::MIN).and_utc(),
            zone: DayZone::Utc,
        }
    }

    /// Day whose midnight is the local timezone's midnight.
    pub fn local(date: NaiveDate) -> Self {
        let naive = date.and_time(NaiveTime::MIN);
        let start = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc());
        Self {
            date,
            start,
            zone: DayZone::Local,
        }
    }

    pub fn today() -> Self {
        Self::local(Local::now().date_naive())
    }

    pub fn containing_utc(at: DateTime<Utc>) -> Self {
        Self::utc(at.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn zone(&self) -> DayZone {
        self.zone
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + TimeDelta::milliseconds(DAY_MS)
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start(), self.end())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.range().contains(at)
    }

    pub fn previous(&self) -> Self {
        self.shifted(-1)
    }

    pub fn next(&self) -> Self {
        self.shifted(1)
    }

    fn shifted(&self, offset: i64) -> Self {
        let date = if offset < 0 {
            self.date.checked_sub_days(Days::new(offset.unsigned_abs()))
        } else {
            self.date.checked_add_days(Days::new(offset.unsigned_abs()))
        };

        // Midnight is resolved again so DST steps do not drift the start.
        match (date, self.zone) {
            (Some(date), DayZone::Utc) => Self::utc(date),
            (Some(date), DayZone::Local) => Self::local(date),
            (None, _) => *self,
        }
    }
}
