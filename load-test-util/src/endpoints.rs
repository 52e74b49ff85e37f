use crate::{AccountType, ResourceId};

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/registro";
pub const PROFILE_PATH: &str = "/me";
pub const INSTRUCTOR_COURSES_PATH: &str = "/inscripciones/mis-asignaturas-impartidas/";
pub const LEARNER_COURSES_PATH: &str = "/inscripciones/mis-asignaturas";
pub const COURSE_ACTIVITIES_PATH: &str = "/actividades/asignatura";
pub const ACTIVITIES_PATH: &str = "/actividades";
pub const CREATE_COURSE_PATH: &str = "/asignaturas/";

/// Absolute URIs of every endpoint a virtual user touches, rooted at the
/// versioned API base (e.g. `https://host/api/v1`).
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    base: String,
}

impl ApiEndpoints {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    #[must_use]
    pub fn login(&self) -> String {
        format!("{}{LOGIN_PATH}", self.base)
    }

    #[must_use]
    pub fn register(&self) -> String {
        format!("{}{REGISTER_PATH}", self.base)
    }

    #[must_use]
    pub fn profile(&self) -> String {
        format!("{}{PROFILE_PATH}", self.base)
    }

    /// Instructors list the courses they teach, learners the ones they're enrolled in.
    #[must_use]
    pub fn course_list(&self, account: AccountType) -> String {
        let path = match account {
            AccountType::Instructor => INSTRUCTOR_COURSES_PATH,
            AccountType::Learner => LEARNER_COURSES_PATH,
        };
        format!("{}{path}", self.base)
    }

    #[must_use]
    pub fn course_activities(&self, course: &ResourceId) -> String {
        format!("{}{COURSE_ACTIVITIES_PATH}/{course}", self.base)
    }

    #[must_use]
    pub fn activity(&self, activity: &ResourceId) -> String {
        format!("{}{ACTIVITIES_PATH}/{activity}", self.base)
    }

    #[must_use]
    pub fn create_course(&self) -> String {
        format!("{}{CREATE_COURSE_PATH}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_paths_under_base() {
        let endpoints = ApiEndpoints::new("https://localhost:8000/api/v1/");
        assert_eq!(endpoints.login(), "https://localhost:8000/api/v1/login");
        assert_eq!(endpoints.register(), "https://localhost:8000/api/v1/registro");
        assert_eq!(endpoints.profile(), "https://localhost:8000/api/v1/me");
        assert_eq!(
            endpoints.course_activities(&ResourceId::Int(4)),
            "https://localhost:8000/api/v1/actividades/asignatura/4"
        );
        assert_eq!(
            endpoints.activity(&ResourceId::Int(9)),
            "https://localhost:8000/api/v1/actividades/9"
        );
        assert_eq!(
            endpoints.create_course(),
            "https://localhost:8000/api/v1/asignaturas/"
        );
    }

    #[test]
    fn course_list_depends_only_on_account_type() {
        let endpoints = ApiEndpoints::new("http://api/api/v1");
        assert_eq!(
            endpoints.course_list(AccountType::Instructor),
            "http://api/api/v1/inscripciones/mis-asignaturas-impartidas/"
        );
        assert_eq!(
            endpoints.course_list(AccountType::Learner),
            "http://api/api/v1/inscripciones/mis-asignaturas"
        );
    }
}
