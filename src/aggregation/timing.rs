use chrono::{DateTime, Duration, Utc};

use crate::insights::EnrichedDeployment;
use crate::server::types::{Task, TaskState};

/// Tasks running this long or longer are treated as stuck and left out of averages.
pub const STUCK_TASK_THRESHOLD_MS: i64 = 3_600_000;
pub const FREQUENCY_WINDOW_DAYS: i64 = 30;
const MINUTES_SAVED_PER_DEPLOYMENT: f64 = 15.0;

#[allow(clippy::cast_precision_loss)]
fn mean_minutes(durations_ms: &[i64]) -> Option<f64> {
    if durations_ms.is_empty() {
        return None;
    }
    let total: i64 = durations_ms.iter().sum();
    Some(total as f64 / durations_ms.len() as f64 / 60_000.0)
}

/// Mean time to recovery: average failed-task duration in minutes.
pub fn mttr_minutes(tasks: &[Task]) -> Option<f64> {
    let durations: Vec<i64> = tasks
        .iter()
        .filter(|t| t.state == Some(TaskState::Failed))
        .filter_map(Task::duration_ms)
        .collect();
    mean_minutes(&durations)
}

/// Average task duration in minutes, excluding stuck tasks.
pub fn average_duration_minutes(tasks: &[Task]) -> Option<f64> {
    let durations: Vec<i64> = tasks
        .iter()
        .filter_map(Task::duration_ms)
        .filter(|&ms| ms < STUCK_TASK_THRESHOLD_MS)
        .collect();
    mean_minutes(&durations)
}

/// Deployments created within the trailing window ending at `now`.
pub fn deploys_in_window(deployments: &[EnrichedDeployment], now: DateTime<Utc>) -> usize {
    let since = now - Duration::days(FREQUENCY_WINDOW_DAYS);
    deployments
        .iter()
        .filter(|d| d.created.is_some_and(|created| created >= since))
        .count()
}

#[allow(clippy::cast_precision_loss)]
pub fn deploy_frequency_per_day(recent: usize) -> f64 {
    recent as f64 / FREQUENCY_WINDOW_DAYS as f64
}

/// Rough heuristic: a fixed 15 minutes saved per deployment.
#[allow(clippy::cast_precision_loss)]
pub fn time_saved_hours(total_deployments: usize) -> f64 {
    total_deployments as f64 * MINUTES_SAVED_PER_DEPLOYMENT / 60.0
}

/// Minutes for display; undefined values render as "--".
pub fn format_minutes(minutes: Option<f64>) -> String {
    minutes.map_or_else(|| "--".to_string(), |m| format!("{m:.1} min"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(state: TaskState, duration_ms: Option<i64>) -> Task {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        Task {
            state: Some(state),
            start_time: duration_ms.map(|_| start),
            completed_time: duration_ms.map(|ms| start + Duration::milliseconds(ms)),
            ..Task::default()
        }
    }

    #[test]
    fn test_mttr_uses_failed_tasks_only() {
        let tasks = vec![
            task(TaskState::Failed, Some(10 * 60_000)),
            task(TaskState::Failed, Some(20 * 60_000)),
            task(TaskState::Failed, None),
            task(TaskState::Success, Some(90 * 60_000)),
        ];

        assert_eq!(mttr_minutes(&tasks), Some(15.0));
    }

    #[test]
    fn test_mttr_undefined_without_failures() {
        let tasks = vec![task(TaskState::Success, Some(60_000))];

        assert_eq!(mttr_minutes(&tasks), None);
        assert_eq!(format_minutes(mttr_minutes(&tasks)), "--");
    }

    #[test]
    fn test_average_duration_excludes_tasks_over_an_hour() {
        let tasks = vec![
            task(TaskState::Success, Some(3_600_000)),
            task(TaskState::Success, Some(3_600_001)),
            task(TaskState::Failed, Some(3_599_999)),
        ];

        // Only the task strictly below the threshold is kept.
        let avg = average_duration_minutes(&tasks).unwrap();
        assert!((avg - 3_599_999.0 / 60_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_duration_none_when_all_stuck() {
        let tasks = vec![task(TaskState::Success, Some(STUCK_TASK_THRESHOLD_MS + 1))];

        assert_eq!(average_duration_minutes(&tasks), None);
    }

    #[test]
    fn test_deploys_in_window_and_frequency() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let make = |created: Option<DateTime<Utc>>| EnrichedDeployment {
            id: "D".to_string(),
            space_id: String::new(),
            space_name: String::new(),
            project_id: String::new(),
            project_name: String::new(),
            environment_id: String::new(),
            environment_name: String::new(),
            release_version: None,
            state: TaskState::Success,
            duration: "--".to_string(),
            created,
            completed_time: None,
        };
        let deployments = vec![
            make(Some(now - Duration::days(1))),
            make(Some(now - Duration::days(30))),
            make(Some(now - Duration::days(31))),
            make(None),
        ];

        let recent = deploys_in_window(&deployments, now);

        assert_eq!(recent, 2);
        assert!((deploy_frequency_per_day(recent) - 2.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_time_saved_is_quarter_hour_per_deployment() {
        assert_eq!(time_saved_hours(100), 25.0);
        assert_eq!(time_saved_hours(0), 0.0);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(Some(12.34)), "12.3 min");
    }
}
