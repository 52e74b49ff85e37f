use std::sync::Arc;

use rand::Rng;

use crate::{AccountType, LoginCredentials};

/// Accounts known to exist on the target deployment.
pub const KNOWN_USERS: [(&str, &str); 2] = [
    ("profee@profee.com", "profee@profee.com"),
    ("manu@manu.com", "manu@manu.com"),
];

pub const DEFAULT_SYNTHETIC_USERS: usize = 30;
pub const DEFAULT_REAL_USER_PROBABILITY: f64 = 0.7;

/// Body of a `POST /registro` request.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegistrationData {
    pub email: String,
    pub password: String,
    pub nombre: String,
    pub apellidos: String,
    pub tipo_usuario: AccountType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    pub username: String,
    pub password: String,
    pub registration: Option<RegistrationData>,
}

impl CredentialRecord {
    #[must_use]
    pub fn known(username: &str, password: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
            registration: None,
        }
    }

    /// Every fifth synthetic user is an instructor.
    #[must_use]
    pub fn synthetic(index: usize) -> Self {
        let email = format!("usuario_test{index}@educode.ai");
        let password = format!("password{index}");
        let tipo_usuario = if index % 5 == 0 {
            AccountType::Instructor
        } else {
            AccountType::Learner
        };
        Self {
            username: email.clone(),
            password: password.clone(),
            registration: Some(RegistrationData {
                email,
                password,
                nombre: format!("Usuario Test {index}"),
                apellidos: format!("Apellido Test {index}"),
                tipo_usuario,
            }),
        }
    }

    /// Whether the account registers as an instructor. Unknown (`None`) for
    /// the known accounts until their profile has been fetched.
    #[must_use]
    pub fn is_instructor(&self) -> Option<bool> {
        self.registration
            .as_ref()
            .map(|r| r.tipo_usuario == AccountType::Instructor)
    }

    #[must_use]
    pub fn login_credentials(&self) -> LoginCredentials {
        LoginCredentials::new(self.username.as_str(), self.password.as_str())
    }
}

/// Read-only pool shared by every virtual user.
#[derive(Debug, Clone)]
pub struct UserPool {
    users: Arc<[CredentialRecord]>,
}

impl UserPool {
    #[must_use]
    pub fn new(synthetic_count: usize) -> Self {
        let users: Vec<CredentialRecord> = KNOWN_USERS
            .iter()
            .map(|(username, password)| CredentialRecord::known(username, password))
            .chain((1..=synthetic_count).map(CredentialRecord::synthetic))
            .collect();
        Self::from_records(users)
    }

    #[must_use]
    pub fn from_records(users: Vec<CredentialRecord>) -> Self {
        Self {
            users: users.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn records(&self) -> &[CredentialRecord] {
        &self.users
    }

    /// Picks one of the known accounts with probability `real_user_probability`,
    /// otherwise any account in the pool. `None` only for an empty pool.
    ///
    /// `real_user_probability` must lie in `[0, 1]`.
    pub fn select<R: Rng>(
        &self,
        rng: &mut R,
        real_user_probability: f64,
    ) -> Option<&CredentialRecord> {
        if self.users.is_empty() {
            return None;
        }
        let prefer_known = rng.random_bool(real_user_probability);
        let upper = if prefer_known && self.users.len() >= KNOWN_USERS.len() {
            KNOWN_USERS.len()
        } else {
            self.users.len()
        };
        self.users.get(rng.random_range(0..upper))
    }
}

impl Default for UserPool {
    fn default() -> Self {
        Self::new(DEFAULT_SYNTHETIC_USERS)
    }
}
