//! Forecast results.
//!
//! A [`Forecast`] holds the pass and fail messages produced by checks. One
//! forecast is built per resource, and the pipeline concatenates them into a
//! single run-wide forecast in document order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    /// The check could not be executed. Counted as a failure.
    Unknown,
}

/// A line-attributed check message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckMessage {
    pub line: usize,
    pub type_name: String,
    pub logical_id: String,
    pub condition: String,
    pub outcome: Outcome,
}

impl fmt::Display for CheckMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} - {}",
            self.line, self.type_name, self.logical_id, self.condition
        )
    }
}

/// Pass and fail messages for one resource, or for a whole run.
///
/// `num_checked() == num_passed() + num_failed()` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    pub type_name: String,
    pub logical_id: String,
    pub passed: Vec<CheckMessage>,
    pub failed: Vec<CheckMessage>,
}

impl Forecast {
    pub fn new(type_name: impl Into<String>, logical_id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            logical_id: logical_id.into(),
            passed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Record a message for this forecast's resource.
    pub fn add(&mut self, outcome: Outcome, line: usize, condition: impl Into<String>) {
        let message = CheckMessage {
            line,
            type_name: self.type_name.clone(),
            logical_id: self.logical_id.clone(),
            condition: condition.into(),
            outcome,
        };
        match outcome {
            Outcome::Pass => self.passed.push(message),
            Outcome::Fail | Outcome::Unknown => self.failed.push(message),
        }
    }

    pub fn pass(&mut self, line: usize, condition: impl Into<String>) {
        self.add(Outcome::Pass, line, condition);
    }

    pub fn fail(&mut self, line: usize, condition: impl Into<String>) {
        self.add(Outcome::Fail, line, condition);
    }

    pub fn unknown(&mut self, line: usize, condition: impl Into<String>) {
        self.add(Outcome::Unknown, line, condition);
    }

    /// Record a pass or a fail depending on `passed`.
    pub fn check(&mut self, passed: bool, line: usize, condition: impl Into<String>) {
        let outcome = if passed { Outcome::Pass } else { Outcome::Fail };
        self.add(outcome, line, condition);
    }

    /// Concatenate another forecast's messages onto this one.
    pub fn append(&mut self, other: Forecast) {
        self.passed.extend(other.passed);
        self.failed.extend(other.failed);
    }

    pub fn num_checked(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn num_passed(&self) -> usize {
        self.passed.len()
    }

    pub fn num_failed(&self) -> usize {
        self.failed.len()
    }

    pub fn num_unknown(&self) -> usize {
        self.failed
            .iter()
            .filter(|m| m.outcome == Outcome::Unknown)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.num_checked() == 0
    }

    /// True when nothing failed.
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_formats_message() {
        let mut forecast = Forecast::new("AWS::S3::Bucket", "Assets");
        forecast.fail(12, "Already exists");

        assert_eq!(forecast.failed[0].to_string(), "12: AWS::S3::Bucket Assets - Already exists");
        assert_eq!(forecast.failed[0].outcome, Outcome::Fail);
    }

    #[test]
    fn test_counts_hold_invariant() {
        let mut forecast = Forecast::new("AWS::SQS::Queue", "Jobs");
        forecast.pass(1, "Does not exist");
        forecast.check(false, 2, "sqs:CreateQueue denied");
        forecast.unknown(3, "Unable to check permissions");

        assert_eq!(forecast.num_checked(), forecast.num_passed() + forecast.num_failed());
        assert_eq!(forecast.num_passed(), 1);
        assert_eq!(forecast.num_failed(), 2);
        assert_eq!(forecast.num_unknown(), 1);
        assert!(!forecast.all_passed());
    }

    #[test]
    fn test_append_keeps_order() {
        let mut total = Forecast::default();
        assert!(total.is_empty());

        let mut first = Forecast::new("AWS::S3::Bucket", "A");
        first.pass(1, "one");
        first.fail(2, "two");
        let mut second = Forecast::new("AWS::S3::Bucket", "B");
        second.pass(5, "three");
        second.fail(6, "four");

        total.append(first);
        total.append(second);

        let passed: Vec<_> = total.passed.iter().map(|m| m.condition.as_str()).collect();
        let failed: Vec<_> = total.failed.iter().map(|m| m.logical_id.as_str()).collect();
        assert_eq!(passed, vec!["one", "three"]);
        assert_eq!(failed, vec!["A", "B"]);
        assert_eq!(total.num_checked(), 4);
    }
}
