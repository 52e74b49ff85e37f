pub mod drain;
pub mod endpoints;
pub mod users;

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use http_body_util::Full;
use rand::Rng;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[inline]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[inline]
pub fn byte_body<B: Into<Bytes>>(bytes: B) -> Full<Bytes> {
    Full::new(bytes.into())
}

#[inline]
pub fn json_body<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<Full<Bytes>> {
    serde_json::to_vec(value).map(byte_body)
}

#[inline]
pub fn form_body(pairs: &[(&str, &str)]) -> Full<Bytes> {
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    byte_body(encoded)
}

/// Role of an account as reported by the API's `tipo_usuario` field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AccountType {
    Instructor,
    Learner,
}

impl AccountType {
    pub const INSTRUCTOR_LABEL: &'static str = "Profesor";
    pub const LEARNER_LABEL: &'static str = "Alumno";

    /// Anything that isn't the instructor label is treated as a learner.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == Self::INSTRUCTOR_LABEL {
            Self::Instructor
        } else {
            Self::Learner
        }
    }

    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Instructor => Self::INSTRUCTOR_LABEL,
            Self::Learner => Self::LEARNER_LABEL,
        }
    }
}

impl serde::Serialize for AccountType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> serde::Deserialize<'de> for AccountType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn form_body(&self) -> Full<Bytes> {
        form_body(&[
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ])
    }
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// The bearer token, if the response carried a non-empty one.
    #[must_use]
    pub fn into_token(self) -> Option<String> {
        self.access_token.filter(|t| !t.is_empty())
    }
}

/// Identifier of a course or activity. The API hands out integers, but
/// strings are accepted so a differently keyed deployment still parses.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Any listed resource; only the id is needed to drill further down.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResourceRef {
    pub id: ResourceId,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProfileResponse {
    pub id: ResourceId,
    pub tipo_usuario: AccountType,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub apellidos: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewCourseRequest {
    pub nombre: String,
    pub descripcion: String,
    pub codigo_acceso: String,
}

impl NewCourseRequest {
    #[must_use]
    pub fn generate<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> Self {
        let name_suffix: u32 = rng.random_range(0..10_000);
        let code_suffix: u32 = rng.random_range(0..10_000);
        Self {
            nombre: format!("Asignatura de prueba {name_suffix}"),
            descripcion: format!(
                "Descripción de prueba generada para pruebas de carga {}",
                now.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            codigo_acceso: format!("codigo{code_suffix}"),
        }
    }
}
