use std::collections::BTreeMap;
use std::fmt;

use crate::checks::{CheckName, IterationReport, RequestLabel, RequestTiming};

/// Round trip times of one endpoint, in microseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub failures: u64,
    pub min_rtt: u128,
    pub max_rtt: u128,
    pub total_rtt: u128,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            count: 0,
            failures: 0,
            min_rtt: u128::MAX,
            max_rtt: u128::MIN,
            total_rtt: 0,
        }
    }
}

impl LatencyStats {
    pub fn record(&mut self, timing: &RequestTiming) {
        let cur = timing.elapsed.as_micros();
        if cur < self.min_rtt {
            self.min_rtt = cur;
        }
        if cur > self.max_rtt {
            self.max_rtt = cur;
        }
        self.total_rtt += cur;
        self.count += 1;
        if timing.failed() {
            self.failures += 1;
        }
    }

    pub fn merge(&mut self, other: &LatencyStats) {
        self.min_rtt = self.min_rtt.min(other.min_rtt);
        self.max_rtt = self.max_rtt.max(other.max_rtt);
        self.total_rtt += other.total_rtt;
        self.count += other.count;
        self.failures += other.failures;
    }

    #[must_use]
    pub fn mean_rtt(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.total_rtt as f64 / self.count as f64
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CheckTally {
    pub passed: u64,
    pub total: u64,
}

impl CheckTally {
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64
    }
}

/// Totals across every iteration of a run. Each virtual user keeps its own
/// and the driver merges them once the users are done.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub iterations: u64,
    pub completed_iterations: u64,
    pub requests: BTreeMap<RequestLabel, LatencyStats>,
    pub checks: BTreeMap<CheckName, CheckTally>,
}

impl RunSummary {
    pub fn record(&mut self, report: &IterationReport) {
        self.iterations += 1;
        if report.completed {
            self.completed_iterations += 1;
        }
        for timing in &report.timings {
            self.requests.entry(timing.label).or_default().record(timing);
        }
        for check in &report.checks {
            let tally = self.checks.entry(check.name).or_default();
            tally.total += 1;
            if check.passed {
                tally.passed += 1;
            }
        }
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.iterations += other.iterations;
        self.completed_iterations += other.completed_iterations;
        for (label, stats) in &other.requests {
            self.requests.entry(*label).or_default().merge(stats);
        }
        for (name, tally) in &other.checks {
            let mine = self.checks.entry(*name).or_default();
            mine.passed += tally.passed;
            mine.total += tally.total;
        }
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.requests.values().map(|s| s.count).sum()
    }

    /// Share of requests that failed at the transport layer or returned an unexpected status.
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        let failed: u64 = self.requests.values().map(|s| s.failures).sum();
        failed as f64 / total as f64
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results:")?;
        writeln!(
            f,
            "    iterations = {} (completed {})",
            self.iterations, self.completed_iterations
        )?;
        for (label, stats) in &self.requests {
            writeln!(
                f,
                "    {:<16} my s [min, mean, max] = [{}, {:.2}, {}] requests = {} failed = {}",
                label.as_str(),
                stats.min_rtt,
                stats.mean_rtt(),
                stats.max_rtt,
                stats.count,
                stats.failures
            )?;
        }
        writeln!(
            f,
            "    http_req_failed = {:.2}%",
            self.failure_rate() * 100.0
        )?;
        for (name, tally) in &self.checks {
            writeln!(
                f,
                "    check {:<32} {}/{} ({:.2}%)",
                name.as_str(),
                tally.passed,
                tally.total,
                tally.pass_rate() * 100.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckOutcome;
    use hyper::StatusCode;
    use std::time::Duration;

    fn timing(label: RequestLabel, micros: u64, status: Option<u16>) -> RequestTiming {
        RequestTiming {
            label,
            elapsed: Duration::from_micros(micros),
            status: status.map(|s| StatusCode::from_u16(s).unwrap()),
        }
    }

    #[test]
    fn records_min_mean_max_and_failures() {
        let report = IterationReport {
            username: None,
            checks: vec![
                CheckOutcome { name: CheckName::Login, passed: false },
                CheckOutcome { name: CheckName::Login, passed: true },
            ],
            timings: vec![
                timing(RequestLabel::Login, 100, Some(422)),
                timing(RequestLabel::Login, 300, Some(200)),
                timing(RequestLabel::Profile, 50, None),
            ],
            completed: false,
        };
        let mut summary = RunSummary::default();
        summary.record(&report);

        let login = summary.requests[&RequestLabel::Login];
        assert_eq!(login.min_rtt, 100);
        assert_eq!(login.max_rtt, 300);
        assert!((login.mean_rtt() - 200.0).abs() < f64::EPSILON);
        assert_eq!(login.failures, 1);
        assert_eq!(summary.requests[&RequestLabel::Profile].failures, 1);
        assert_eq!(summary.checks[&CheckName::Login], CheckTally { passed: 1, total: 2 });
        assert!((summary.failure_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.completed_iterations, 0);
    }

    #[test]
    fn expected_error_statuses_are_not_request_failures() {
        let mut summary = RunSummary::default();
        summary.record(&IterationReport {
            timings: vec![
                timing(RequestLabel::Login, 10, Some(401)),
                timing(RequestLabel::Login, 10, Some(200)),
                timing(RequestLabel::Activities, 10, Some(404)),
                timing(RequestLabel::Profile, 10, Some(500)),
            ],
            ..IterationReport::default()
        });
        assert_eq!(summary.failure_rate(), 0.0);

        summary.record(&IterationReport {
            timings: vec![
                timing(RequestLabel::Login, 10, Some(422)),
                timing(RequestLabel::Courses, 10, Some(502)),
            ],
            ..IterationReport::default()
        });
        assert!((summary.failure_rate() - 2.0 / 6.0).abs() < 1e-9);
        assert_eq!(summary.requests[&RequestLabel::Login].failures, 1);
    }

    #[test]
    fn merge_combines_per_user_summaries() {
        let mut a = RunSummary::default();
        a.record(&IterationReport {
            timings: vec![timing(RequestLabel::Courses, 10, Some(200))],
            completed: true,
            ..IterationReport::default()
        });
        let mut b = RunSummary::default();
        b.record(&IterationReport {
            timings: vec![timing(RequestLabel::Courses, 40, Some(502))],
            ..IterationReport::default()
        });
        a.merge(&b);

        assert_eq!(a.iterations, 2);
        assert_eq!(a.completed_iterations, 1);
        let courses = a.requests[&RequestLabel::Courses];
        assert_eq!((courses.min_rtt, courses.max_rtt, courses.count), (10, 40, 2));
        assert_eq!(courses.failures, 1);
        assert!(a.to_string().contains("courses"));
    }
}
