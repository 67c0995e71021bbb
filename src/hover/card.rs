use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

use crate::{
    activity::{ActivityTimeline, ProcessUsage},
    models::{Category, ScreenshotRef},
    timeline::{IntervalSet, TimeRange},
};

use super::Point;

/// Everything the hover overlay shows for one instant of the axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverCard {
    pub anchor: Point,
    pub at: DateTime<Utc>,
    /// The hovered entry, or the free gap around `at`.
    pub range: TimeRange,
    pub label: Option<String>,
    pub category_name: Option<String>,
    pub screenshot: Option<ScreenshotRef>,
    pub top_processes: Vec<ProcessUsage>,
}

impl HoverCard {
    /// `None` only when `at` lies outside the day.
    pub fn compose(
        anchor: Point,
        at: DateTime<Utc>,
        intervals: &IntervalSet,
        categories: &[Category],
        activity: &ActivityTimeline,
        top_limit: usize,
    ) -> Option<Self> {
        let (range, label, category_name) = match intervals.entry_at(at) {
            Some(entry) => {
                let category_name = entry.category_id.and_then(|id| {
                    categories
                        .iter()
                        .find(|category| category.id == id)
                        .map(|category| category.name.clone())
                });
                (entry.range(), Some(entry.label.clone()), category_name)
            }
            None => (intervals.gap_containing(at)?, None, None),
        };

        Some(Self {
            anchor,
            at,
            range,
            label,
            category_name,
            screenshot: None,
            top_processes: activity.top_processes(range.start, range.end, top_limit),
        })
    }

    pub fn with_screenshot(mut self, screenshot: Option<ScreenshotRef>) -> Self {
        self.screenshot = screenshot.filter(ScreenshotRef::has_image);
        self
    }

    pub fn is_free_time(&self) -> bool {
        self.label.is_none()
    }

    /// Text rows of the card with times shown in `tz`.
    pub fn summary_lines<Tz>(&self, tz: &Tz) -> Vec<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let time = |at: DateTime<Utc>| at.with_timezone(tz).format("%H:%M:%S").to_string();

        let mut lines = vec![
            format!("At: {}", time(self.at)),
            format!("Range: {} - {}", time(self.range.start), time(self.range.end)),
            format!("Activity: {}", self.label.as_deref().unwrap_or("(free time)")),
        ];
        // A gap has no category at all, which differs from an uncategorised entry.
        let category = match (&self.label, &self.category_name) {
            (Some(_), Some(name)) => name.as_str(),
            (Some(_), None) => "Uncategorized",
            (None, _) => "-",
        };
        lines.push(format!("Category: {category}"));

        if self.screenshot.is_none() {
            lines.push("No screenshot at this time".to_string());
        }

        if self.top_processes.is_empty() {
            lines.push("No process activity in this range".to_string());
        } else {
            lines.extend(self.top_processes.iter().map(|row| {
                format!(
                    "{}  {} ({:.1}%)",
                    row.process_name,
                    format_duration(row.seconds),
                    row.percent
                )
            }));
        }
        lines
    }
}

/// `Hh Mm Ss`, dropping leading zero units.
pub fn format_duration(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, EntryId, ProcessSample, TimeEntry};
    use crate::timeline::Day;
    use chrono::{NaiveDate, TimeDelta};

    fn day() -> Day {
        Day::utc(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
    }

    fn at(h: i64, m: i64) -> DateTime<Utc> {
        day().start() + TimeDelta::hours(h) + TimeDelta::minutes(m)
    }

    fn fixture() -> (IntervalSet, Vec<Category>, ActivityTimeline) {
        let intervals = IntervalSet::new(
            day(),
            vec![
                TimeEntry {
                    id: EntryId(1),
                    start: at(9, 0),
                    end: at(10, 0),
                    label: "Writing".into(),
                    category_id: Some(CategoryId(3)),
                },
                TimeEntry {
                    id: EntryId(2),
                    start: at(11, 0),
                    end: at(11, 30),
                    label: "Review".into(),
                    category_id: None,
                },
            ],
        );
        let categories = vec![Category {
            id: CategoryId(3),
            name: "Work".into(),
            color: "#2563eb".into(),
        }];
        let activity = ActivityTimeline::new(vec![
            ProcessSample::new(at(9, 0), "code"),
            ProcessSample::new(at(9, 40), "chrome"),
            ProcessSample::new(at(10, 10), "slack"),
            ProcessSample::new(at(10, 20), "code"),
            ProcessSample::new(at(12, 0), "mail"),
        ]);
        (intervals, categories, activity)
    }

    #[test]
    fn entry_card_uses_entry_range_and_category() {
        let (intervals, categories, activity) = fixture();
        let card = HoverCard::compose(Point::new(1.0, 2.0), at(9, 15), &intervals, &categories, &activity, 3)
            .unwrap();

        assert_eq!(card.range, TimeRange::new(at(9, 0), at(10, 0)));
        assert_eq!(card.label.as_deref(), Some("Writing"));
        assert_eq!(card.category_name.as_deref(), Some("Work"));
        assert_eq!(card.top_processes[0].process_name, "code");
        assert_eq!(card.top_processes[0].seconds, 2400);
    }

    #[test]
    fn gap_card_covers_the_free_range() {
        let (intervals, categories, activity) = fixture();
        let card = HoverCard::compose(Point::default(), at(10, 30), &intervals, &categories, &activity, 3)
            .unwrap();

        assert!(card.is_free_time());
        assert_eq!(card.range, TimeRange::new(at(10, 0), at(11, 0)));
        let names: Vec<_> = card.top_processes.iter().map(|row| row.process_name.as_str()).collect();
        assert_eq!(names, vec!["code", "chrome", "slack"]);

        let lines = card.summary_lines(&Utc);
        assert_eq!(lines[1], "Range: 10:00:00 - 11:00:00");
        assert_eq!(lines[3], "Category: -");
    }

    #[test]
    fn uncategorised_entry_and_blank_screenshot() {
        let (intervals, categories, activity) = fixture();
        let blank = ScreenshotRef {
            timestamp: at(11, 10),
            file_path: None,
            data_url: None,
        };
        let card = HoverCard::compose(Point::default(), at(11, 10), &intervals, &categories, &activity, 3)
            .unwrap()
            .with_screenshot(Some(blank));

        assert!(card.screenshot.is_none());
        let lines = card.summary_lines(&Utc);
        assert_eq!(lines[3], "Category: Uncategorized");
        assert!(lines.contains(&"No screenshot at this time".to_string()));
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3600), "1h 0m 0s");
        assert_eq!(format_duration(3725), "1h 2m 5s");
    }
}
