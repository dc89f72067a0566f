use crate::config::Settings;
use crate::domain::period::Period;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

// Longest gap between two monthly triggers is under two months; a year covers every case.
const NEXT_RUN_HORIZON_DAYS: i64 = 400;

/// Local wall-clock trigger times for each report type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub daily_at: NaiveTime,
    pub weekly_on: Weekday,
    pub weekly_at: NaiveTime,
    pub monthly_day: u32,
    pub monthly_at: NaiveTime,
}

impl Schedule {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            daily_at: settings.daily_report_time,
            weekly_on: settings.weekly_report_day,
            weekly_at: settings.weekly_report_time,
            monthly_day: settings.monthly_report_day,
            monthly_at: settings.monthly_report_time,
        }
    }

    /// Trigger instant of `period` on `date`, if it fires that day at all.
    pub fn fire_time(&self, period: Period, date: NaiveDate) -> Option<NaiveDateTime> {
        match period {
            Period::Daily => Some(date.and_time(self.daily_at)),
            Period::Weekly => (date.weekday() == self.weekly_on).then(|| date.and_time(self.weekly_at)),
            // Months without the configured day are skipped.
            Period::Monthly => (date.day() == self.monthly_day).then(|| date.and_time(self.monthly_at)),
        }
    }

    /// Reports whose trigger falls in `(prev, now]`. A report missed several times within the
    /// window is returned once.
    pub fn due_reports(&self, prev: NaiveDateTime, now: NaiveDateTime) -> Vec<Period> {
        if now <= prev {
            return Vec::new();
        }
        let mut due = Vec::new();
        for period in Period::ALL {
            let mut date = prev.date();
            while date <= now.date() {
                if let Some(t) = self.fire_time(period, date) {
                    if prev < t && t <= now {
                        due.push((t, period));
                        break;
                    }
                }
                date += Duration::days(1);
            }
        }
        due.sort();
        due.into_iter().map(|(_, period)| period).collect()
    }

    /// First trigger of `period` strictly after `after`.
    pub fn next_run(&self, period: Period, after: NaiveDateTime) -> Option<NaiveDateTime> {
        (0..NEXT_RUN_HORIZON_DAYS)
            .map(|offset| after.date() + Duration::days(offset))
            .filter_map(|date| self.fire_time(period, date))
            .find(|t| *t > after)
    }
}
