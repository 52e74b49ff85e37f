use std::fmt;
use std::time::Duration;

use hyper::StatusCode;

/// Named pass/fail assertions recorded during an iteration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckName {
    Login,
    UserInfo,
    Courses,
    Activities,
    ActivityDetails,
    CreateCourse,
}

impl CheckName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login successful",
            Self::UserInfo => "get user info successful",
            Self::Courses => "get subjects successful",
            Self::Activities => "get activities successful",
            Self::ActivityDetails => "get activity details successful",
            Self::CreateCourse => "create subject successful",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: CheckName,
    pub passed: bool,
}

/// Which endpoint a timed request went to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestLabel {
    Login,
    Register,
    Profile,
    Courses,
    Activities,
    ActivityDetail,
    CreateCourse,
}

impl RequestLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Profile => "me",
            Self::Courses => "courses",
            Self::Activities => "activities",
            Self::ActivityDetail => "activity_detail",
            Self::CreateCourse => "create_course",
        }
    }
}

impl fmt::Display for RequestLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses the target API answers with in normal operation. They can still
/// fail a check but don't count as failed requests.
pub const EXPECTED_STATUSES: [StatusCode; 9] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
    StatusCode::NOT_FOUND,
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::INTERNAL_SERVER_ERROR,
];

#[derive(Debug, Copy, Clone)]
pub struct RequestTiming {
    pub label: RequestLabel,
    pub elapsed: Duration,
    /// `None` when the request never produced a response.
    pub status: Option<StatusCode>,
}

impl RequestTiming {
    /// Transport failures and statuses outside [`EXPECTED_STATUSES`] count as failed requests.
    #[inline]
    #[must_use]
    pub fn failed(&self) -> bool {
        self.status.map_or(true, |s| !EXPECTED_STATUSES.contains(&s))
    }
}

/// Everything one simulated session produced.
#[derive(Debug, Clone, Default)]
pub struct IterationReport {
    pub username: Option<String>,
    pub checks: Vec<CheckOutcome>,
    pub timings: Vec<RequestTiming>,
    /// Reached the final think time instead of bailing out early.
    pub completed: bool,
}

impl IterationReport {
    #[must_use]
    pub fn check(&self, name: CheckName) -> Option<bool> {
        self.checks.iter().find(|c| c.name == name).map(|c| c.passed)
    }

    #[must_use]
    pub fn requests_to(&self, label: RequestLabel) -> usize {
        self.timings.iter().filter(|t| t.label == label).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_names_are_stable() {
        let names: Vec<&str> = [
            CheckName::Login,
            CheckName::UserInfo,
            CheckName::Courses,
            CheckName::Activities,
            CheckName::ActivityDetails,
            CheckName::CreateCourse,
        ]
        .into_iter()
        .map(CheckName::as_str)
        .collect();
        assert_eq!(
            names,
            [
                "login successful",
                "get user info successful",
                "get subjects successful",
                "get activities successful",
                "get activity details successful",
                "create subject successful",
            ]
        );
    }

    #[test]
    fn only_unexpected_statuses_and_transport_errors_fail() {
        let timing = |status: Option<u16>| RequestTiming {
            label: RequestLabel::Login,
            elapsed: Duration::ZERO,
            status: status.map(|s| StatusCode::from_u16(s).unwrap()),
        };
        for ok in [200, 201, 202, 204, 400, 401, 403, 404, 500] {
            assert!(!timing(Some(ok)).failed(), "{ok} should be expected");
        }
        for bad in [422, 502, 503, 301] {
            assert!(timing(Some(bad)).failed(), "{bad} should fail");
        }
        assert!(timing(None).failed());
    }
}
