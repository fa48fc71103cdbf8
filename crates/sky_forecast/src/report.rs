//! Forecast report and verdict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::Action;
use crate::estimate::format_estimate;
use crate::forecast::Forecast;

/// Outcome of a whole forecast run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub run_id: Uuid,
    pub stack_name: String,
    pub action: Action,
    /// Every resource's messages, in document order
    pub forecast: Forecast,
    /// Expected duration of the stack operation
    pub total_seconds: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub summary: ForecastSummary,
}

/// Counts over a report's messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub resources_checked: usize,
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub unknown_checks: usize,
}

impl ForecastSummary {
    pub fn from_forecast(forecast: &Forecast, resources_checked: usize) -> Self {
        Self {
            resources_checked,
            total_checks: forecast.num_checked(),
            passed_checks: forecast.num_passed(),
            failed_checks: forecast.num_failed(),
            unknown_checks: forecast.num_unknown(),
        }
    }
}

impl ForecastReport {
    /// True only when no check failed or came back unknown.
    pub fn passed(&self) -> bool {
        self.forecast.num_failed() == 0
    }

    pub fn estimate(&self) -> String {
        format_estimate(self.total_seconds)
    }

    /// Line oriented text report. Pass messages are listed only when
    /// `show_all` is set.
    pub fn render(&self, show_all: bool) -> String {
        let mut report = String::new();
        let f = &self.forecast;

        if !self.passed() {
            report.push_str("Stormy weather ahead! 🌪\n\n");
            report.push_str(&format!(
                "{} checks failed out of {} total checks\n",
                f.num_failed(),
                f.num_checked()
            ));
            for message in &f.failed {
                report.push_str(&format!("{}\n", message));
            }
            if show_all {
                report.push_str(&format!(
                    "\n{} checks passed out of {} total checks\n",
                    f.num_passed(),
                    f.num_checked()
                ));
                for message in &f.passed {
                    report.push_str(&format!("{}\n", message));
                }
            }
        } else {
            report.push_str(&format!(
                "Clear skies! 🌞 All {} checks passed. Estimated time: {}\n",
                f.num_checked(),
                self.estimate()
            ));
            if show_all {
                report.push('\n');
                for message in &f.passed {
                    report.push_str(&format!("{}\n", message));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(forecast: Forecast) -> ForecastReport {
        let now = Utc::now();
        ForecastReport {
            run_id: Uuid::new_v4(),
            stack_name: "web".into(),
            action: Action::Create,
            summary: ForecastSummary::from_forecast(&forecast, 1),
            forecast,
            total_seconds: 85,
            started_at: now,
            completed_at: now,
        }
    }

    #[test]
    fn test_render_success() {
        let mut forecast = Forecast::new("AWS::SQS::Queue", "Jobs");
        forecast.pass(4, "Does not exist");

        let report = report(forecast);
        assert!(report.passed());
        let text = report.render(false);
        assert_eq!(
            text,
            "Clear skies! 🌞 All 1 checks passed. Estimated time: 1 minutes, 25 seconds\n"
        );
        assert!(report.render(true).contains("4: AWS::SQS::Queue Jobs - Does not exist"));
    }

    #[test]
    fn test_render_failure() {
        let mut forecast = Forecast::new("AWS::S3::Bucket", "Assets");
        forecast.pass(3, "Bucket name is valid");
        forecast.fail(5, "Already exists");

        let report = report(forecast);
        assert!(!report.passed());
        let text = report.render(false);
        assert!(text.starts_with("Stormy weather ahead!"));
        assert!(text.contains("1 checks failed out of 2 total checks"));
        assert!(text.contains("5: AWS::S3::Bucket Assets - Already exists"));
        assert!(!text.contains("Bucket name is valid"));
        assert!(report.render(true).contains("1 checks passed out of 2 total checks"));
    }

    #[test]
    fn test_unknown_fails_verdict() {
        let mut forecast = Forecast::new("AWS::IAM::Role", "Role");
        forecast.pass(2, "Does not exist");
        forecast.unknown(2, "Unable to check permissions: timeout");

        let report = report(forecast);
        assert!(!report.passed());
        assert_eq!(report.summary.unknown_checks, 1);
    }

    #[test]
    fn test_serializes_to_json() {
        let report = report(Forecast::new("AWS::SQS::Queue", "Jobs"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["action"], "create");
        assert_eq!(json["total_seconds"], 85);
    }
}
