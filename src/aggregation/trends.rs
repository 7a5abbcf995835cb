use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::insights::{EnrichedDeployment, MonthlyBucket, WeeklyBucket};
use crate::server::types::TaskState;

pub const MAX_WEEKLY_BUCKETS: usize = 52;
pub const MAX_MONTHLY_BUCKETS: usize = 12;

#[derive(Default)]
struct Counts {
    success: usize,
    failed: usize,
    total: usize,
}

/// Bucket deployments by the ISO 8601 week of their creation date.
///
/// Keeps the most recent 52 weeks. `show_year` marks the first bucket and
/// every bucket whose ISO year differs from the one before it.
pub fn weekly_trend(deployments: &[EnrichedDeployment]) -> Vec<WeeklyBucket> {
    let mut weeks: BTreeMap<(i32, u32), Counts> = BTreeMap::new();

    for deployment in deployments {
        let Some(created) = deployment.created else {
            continue;
        };
        let iso = created.date_naive().iso_week();
        let counts = weeks.entry((iso.year(), iso.week())).or_default();
        counts.total += 1;
        match deployment.state {
            TaskState::Success => counts.success += 1,
            TaskState::Failed => counts.failed += 1,
            _ => {}
        }
    }

    let skip = weeks.len().saturating_sub(MAX_WEEKLY_BUCKETS);
    let mut previous_year = None;

    weeks
        .into_iter()
        .skip(skip)
        .map(|((year, week), counts)| {
            let show_year = previous_year != Some(year);
            previous_year = Some(year);
            WeeklyBucket {
                year,
                week,
                label: format!("W{week:02}"),
                success: counts.success,
                failed: counts.failed,
                total: counts.total,
                show_year,
            }
        })
        .collect()
}

/// Monday of an ISO week.
pub fn iso_week_monday(year: i32, week: u32) -> Option<NaiveDate> {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
}

/// Re-bucket weekly counts into calendar months by each week's Monday.
///
/// Keeps the most recent 12 months.
pub fn monthly_trend(weekly: &[WeeklyBucket]) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<(i32, u32), (NaiveDate, Counts)> = BTreeMap::new();

    for bucket in weekly {
        let Some(monday) = iso_week_monday(bucket.year, bucket.week) else {
            continue;
        };
        let (_, counts) = months
            .entry((monday.year(), monday.month()))
            .or_insert_with(|| (monday, Counts::default()));
        counts.success += bucket.success;
        counts.failed += bucket.failed;
        counts.total += bucket.total;
    }

    let skip = months.len().saturating_sub(MAX_MONTHLY_BUCKETS);

    months
        .into_iter()
        .skip(skip)
        .map(|((year, month), (monday, counts))| MonthlyBucket {
            year,
            month,
            label: monday.format("%b %Y").to_string(),
            success: counts.success,
            failed: counts.failed,
            total: counts.total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn deployment(created: DateTime<Utc>, state: TaskState) -> EnrichedDeployment {
        EnrichedDeployment {
            id: created.to_rfc3339(),
            space_id: "Spaces-1".to_string(),
            space_name: "Default".to_string(),
            project_id: "Projects-1".to_string(),
            project_name: "Web".to_string(),
            environment_id: "Environments-1".to_string(),
            environment_name: "Production".to_string(),
            release_version: None,
            state,
            duration: "--".to_string(),
            created: Some(created),
            completed_time: None,
        }
    }

    fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn bucket(year: i32, week: u32, total: usize) -> WeeklyBucket {
        WeeklyBucket {
            year,
            week,
            label: format!("W{week:02}"),
            success: total,
            failed: 0,
            total,
            show_year: false,
        }
    }

    #[test]
    fn test_year_end_dates_land_in_iso_weeks() {
        // 2020-12-31 is ISO 2020-W53, 2021-01-01 too; 2024-12-30 is ISO 2025-W01.
        let deployments = vec![
            deployment(day(2020, 12, 31), TaskState::Success),
            deployment(day(2021, 1, 1), TaskState::Failed),
            deployment(day(2021, 1, 4), TaskState::Success),
        ];

        let weeks = weekly_trend(&deployments);

        assert_eq!(weeks.len(), 2);
        assert_eq!((weeks[0].year, weeks[0].week), (2020, 53));
        assert_eq!(weeks[0].total, 2);
        assert_eq!(weeks[0].success, 1);
        assert_eq!(weeks[0].failed, 1);
        assert_eq!((weeks[1].year, weeks[1].week), (2021, 1));

        let next_year = weekly_trend(&[deployment(day(2024, 12, 30), TaskState::Success)]);
        assert_eq!((next_year[0].year, next_year[0].week), (2025, 1));
    }

    #[test]
    fn test_show_year_marks_first_and_boundary_buckets() {
        let deployments = vec![
            deployment(day(2023, 12, 18), TaskState::Success),
            deployment(day(2023, 12, 27), TaskState::Success),
            deployment(day(2024, 1, 3), TaskState::Success),
            deployment(day(2024, 1, 10), TaskState::Success),
        ];

        let flags: Vec<_> = weekly_trend(&deployments)
            .iter()
            .map(|w| (w.label.clone(), w.show_year))
            .collect();

        assert_eq!(
            flags,
            vec![
                ("W51".to_string(), true),
                ("W52".to_string(), false),
                ("W01".to_string(), true),
                ("W02".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_weekly_trend_keeps_most_recent_52() {
        let start = day(2022, 1, 3);
        let deployments: Vec<_> = (0..60)
            .map(|n| deployment(start + chrono::Duration::weeks(n), TaskState::Success))
            .collect();

        let weeks = weekly_trend(&deployments);

        assert_eq!(weeks.len(), MAX_WEEKLY_BUCKETS);
        assert!(weeks[0].show_year);
        let last = weeks.last().unwrap();
        let newest = (start + chrono::Duration::weeks(59)).date_naive().iso_week();
        assert_eq!((last.year, last.week), (newest.year(), newest.week()));
    }

    #[test]
    fn test_undated_deployments_are_not_bucketed() {
        let mut undated = deployment(day(2024, 1, 1), TaskState::Success);
        undated.created = None;

        assert!(weekly_trend(&[undated]).is_empty());
    }

    #[test]
    fn test_iso_week_monday_inverse() {
        assert_eq!(
            iso_week_monday(2021, 1),
            NaiveDate::from_ymd_opt(2021, 1, 4)
        );
        assert_eq!(
            iso_week_monday(2025, 1),
            NaiveDate::from_ymd_opt(2024, 12, 30)
        );
        assert_eq!(iso_week_monday(2021, 53), None);
    }

    #[test]
    fn test_monthly_groups_weeks_by_monday() {
        // 2025-W01 starts Monday 2024-12-30, so it counts toward December 2024.
        let weekly = vec![
            bucket(2024, 51, 2),
            bucket(2024, 52, 3),
            bucket(2025, 1, 4),
            bucket(2025, 2, 5),
        ];

        let months = monthly_trend(&weekly);

        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2024, 12));
        assert_eq!(months[0].total, 9);
        assert_eq!(months[0].label, "Dec 2024");
        assert_eq!((months[1].year, months[1].month), (2025, 1));
        assert_eq!(months[1].total, 5);
    }

    #[test]
    fn test_monthly_keeps_most_recent_12() {
        let weekly: Vec<_> = (1..=52).map(|week| bucket(2023, week, 1)).collect();

        let months = monthly_trend(&weekly);

        assert_eq!(months.len(), MAX_MONTHLY_BUCKETS);
        assert_eq!(months[0].month, 1);
        assert_eq!(months.last().unwrap().month, 12);
    }
}
