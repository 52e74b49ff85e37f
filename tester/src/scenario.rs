use std::future::Future;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;
use http_body_util::Full;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Request, StatusCode};
use load_test_util::endpoints::ApiEndpoints;
use load_test_util::users::{CredentialRecord, RegistrationData, UserPool};
use load_test_util::{
    empty_body, json_body, AccountType, NewCourseRequest, ProfileResponse, ResourceRef,
    TokenResponse, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::checks::{CheckName, CheckOutcome, IterationReport, RequestLabel, RequestTiming};
use crate::client::{ApiResponse, ApiTransport, TransportError};

/// Human pacing between steps and at the end of an iteration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub step_pause: Duration,
    pub think_min: Duration,
    pub think_max: Duration,
}

impl Pacing {
    pub const NONE: Pacing = Pacing {
        step_pause: Duration::ZERO,
        think_min: Duration::ZERO,
        think_max: Duration::ZERO,
    };

    async fn pause(&self) {
        sleep_nonzero(self.step_pause).await;
    }

    /// Uniform in `[think_min, think_max)`.
    #[must_use]
    pub fn think_time<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.think_max <= self.think_min {
            return self.think_min;
        }
        let spread = self.think_max - self.think_min;
        self.think_min + spread.mul_f64(rng.random::<f64>())
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            step_pause: Duration::from_secs(1),
            think_min: Duration::from_secs(1),
            think_max: Duration::from_secs(3),
        }
    }
}

async fn sleep_nonzero(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub endpoints: ApiEndpoints,
    pub pacing: Pacing,
    pub real_user_probability: f64,
}

/// Runs one simulated session for a user drawn from `pool`.
pub async fn run_iteration<T, R>(
    api: &T,
    pool: &UserPool,
    rng: &mut R,
    config: &ScenarioConfig,
) -> IterationReport
where
    T: ApiTransport + ?Sized,
    R: Rng + Send,
{
    let Some(user) = pool.select(rng, config.real_user_probability) else {
        warn!("user pool is empty, skipping iteration");
        return IterationReport::default();
    };
    run_iteration_for(api, user, rng, config).await
}

/// Runs one simulated session as `user`. Never fails: every problem is
/// logged and surfaces as a failed check or a shortened report.
pub async fn run_iteration_for<T, R>(
    api: &T,
    user: &CredentialRecord,
    rng: &mut R,
    config: &ScenarioConfig,
) -> IterationReport
where
    T: ApiTransport + ?Sized,
    R: Rng + Send,
{
    let mut session = Session::new(api, &config.endpoints, user);

    let login = session.login().await;
    let logged_in = login.as_ref().is_some_and(|r| r.is_status(StatusCode::OK));
    session.check(CheckName::Login, logged_in);

    let token = match (&login, &user.registration) {
        (Some(resp), _) if logged_in => extract_token(resp),
        (_, Some(registration)) => session.register_and_login(registration).await,
        _ => None,
    };
    let Some(token) = token else {
        debug!(user = %user.username, "no token, ending iteration");
        return session.finish(false);
    };

    config.pacing.pause().await;

    let me = session
        .send(RequestLabel::Profile, authed_get(&config.endpoints.profile(), &token))
        .await;
    let me_ok = me.as_ref().is_some_and(|r| r.is_status(StatusCode::OK));
    session.check(CheckName::UserInfo, me_ok);
    let Some(profile) = me
        .filter(|_| me_ok)
        .and_then(|r| parse_body::<ProfileResponse>(&r, "profile"))
    else {
        return session.finish(false);
    };
    let account = profile.tipo_usuario;
    debug!(user = %user.username, id = %profile.id, ?account, "fetched profile");
    if user
        .is_instructor()
        .is_some_and(|registered| registered != (account == AccountType::Instructor))
    {
        warn!(user = %user.username, ?account, "account type differs from the registered one");
    }

    config.pacing.pause().await;

    let courses = session
        .send(
            RequestLabel::Courses,
            authed_get(&config.endpoints.course_list(account), &token),
        )
        .await;
    let courses_ok = courses.as_ref().is_some_and(|r| r.is_status(StatusCode::OK));
    session.check(CheckName::Courses, courses_ok);

    config.pacing.pause().await;

    let course_ids = courses
        .filter(|_| courses_ok)
        .and_then(|r| parse_body::<Vec<ResourceRef>>(&r, "course list"))
        .unwrap_or_default();

    if !course_ids.is_empty() {
        let course = &course_ids[rng.random_range(0..course_ids.len())].id;
        let activities = session
            .send(
                RequestLabel::Activities,
                authed_get(&config.endpoints.course_activities(course), &token),
            )
            .await;
        let activities_ok = activities
            .as_ref()
            .is_some_and(|r| r.is_status(StatusCode::OK));
        session.check(CheckName::Activities, activities_ok);

        config.pacing.pause().await;

        let activity_ids = activities
            .filter(|_| activities_ok)
            .and_then(|r| parse_body::<Vec<ResourceRef>>(&r, "activity list"))
            .unwrap_or_default();
        if !activity_ids.is_empty() {
            let activity = &activity_ids[rng.random_range(0..activity_ids.len())].id;
            let detail = session
                .send(
                    RequestLabel::ActivityDetail,
                    authed_get(&config.endpoints.activity(activity), &token),
                )
                .await;
            session.check(
                CheckName::ActivityDetails,
                detail.is_some_and(|r| r.is_status(StatusCode::OK)),
            );
        }
    } else if account == AccountType::Instructor {
        let course = NewCourseRequest::generate(rng, Utc::now());
        debug!(user = %user.username, name = %course.nombre, "creating course");
        let created = session
            .send(
                RequestLabel::CreateCourse,
                authed_json_post(&config.endpoints.create_course(), &token, &course),
            )
            .await;
        session.check(
            CheckName::CreateCourse,
            created.is_some_and(|r| {
                matches!(r.status, StatusCode::OK | StatusCode::CREATED)
            }),
        );
    }

    sleep_nonzero(config.pacing.think_time(rng)).await;
    session.finish(true)
}

struct Session<'a, T: ?Sized> {
    api: &'a T,
    endpoints: &'a ApiEndpoints,
    user: &'a CredentialRecord,
    report: IterationReport,
}

impl<'a, T> Session<'a, T>
where
    T: ApiTransport + ?Sized,
{
    fn new(api: &'a T, endpoints: &'a ApiEndpoints, user: &'a CredentialRecord) -> Self {
        Self {
            api,
            endpoints,
            user,
            report: IterationReport {
                username: Some(user.username.clone()),
                ..IterationReport::default()
            },
        }
    }

    fn check(&mut self, name: CheckName, passed: bool) {
        if !passed {
            debug!(user = %self.user.username, check = %name, "check failed");
        }
        self.report.checks.push(CheckOutcome { name, passed });
    }

    fn finish(mut self, completed: bool) -> IterationReport {
        self.report.completed = completed;
        self.report
    }

    /// Sends a request and records its timing. Transport failures are logged
    /// and reported as `None`.
    async fn send(
        &mut self,
        label: RequestLabel,
        request: Result<Request<Full<Bytes>>, TransportError>,
    ) -> Option<ApiResponse> {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                warn!(%label, error = ?e, "could not build request");
                return None;
            }
        };
        let (elapsed, res) = run_timed(self.api.send(request)).await;
        match res {
            Ok(resp) => {
                self.report.timings.push(RequestTiming {
                    label,
                    elapsed,
                    status: Some(resp.status),
                });
                Some(resp)
            }
            Err(e) => {
                warn!(%label, user = %self.user.username, error = ?e, "request failed");
                self.report.timings.push(RequestTiming {
                    label,
                    elapsed,
                    status: None,
                });
                None
            }
        }
    }

    /// Form-encoded login first, JSON body if that didn't return 200.
    async fn login(&mut self) -> Option<ApiResponse> {
        let credentials = self.user.login_credentials();
        let uri = self.endpoints.login();
        let form = Request::post(&uri)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(credentials.form_body())
            .map_err(TransportError::from);
        let form = self.send(RequestLabel::Login, form).await;
        if form.as_ref().is_some_and(|r| r.is_status(StatusCode::OK)) {
            return form;
        }
        debug!(user = %self.user.username, "form login rejected, retrying with a json body");
        let json = json_post(&uri, &credentials);
        self.send(RequestLabel::Login, json).await.or(form)
    }

    /// Registers the account, then logs in once more if the account exists afterwards.
    async fn register_and_login(&mut self, registration: &RegistrationData) -> Option<String> {
        let register = json_post(&self.endpoints.register(), registration);
        let resp = self.send(RequestLabel::Register, register).await?;
        match resp.status {
            StatusCode::OK | StatusCode::CREATED => {
                info!(email = %registration.email, "registered user");
            }
            StatusCode::BAD_REQUEST => {
                debug!(email = %registration.email, "user already registered");
            }
            status => {
                debug!(email = %registration.email, %status, "registration rejected");
                return None;
            }
        }
        let retry = self.login().await?;
        if retry.is_status(StatusCode::OK) {
            extract_token(&retry)
        } else {
            None
        }
    }
}

fn extract_token(resp: &ApiResponse) -> Option<String> {
    let token = parse_body::<TokenResponse>(resp, "login")?.into_token();
    if token.is_none() {
        warn!(body = %resp.body_lossy(), "token missing from login response");
    }
    token
}

fn parse_body<D: DeserializeOwned>(resp: &ApiResponse, what: &str) -> Option<D> {
    match serde_json::from_slice(&resp.body) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(error = %e, body = %resp.body_lossy(), "failed to parse {what} response");
            None
        }
    }
}

fn json_post<S: serde::Serialize + ?Sized>(
    uri: &str,
    payload: &S,
) -> Result<Request<Full<Bytes>>, TransportError> {
    Ok(Request::post(uri)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(json_body(payload)?)?)
}

fn authed_json_post<S: serde::Serialize + ?Sized>(
    uri: &str,
    token: &str,
    payload: &S,
) -> Result<Request<Full<Bytes>>, TransportError> {
    Ok(Request::post(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(json_body(payload)?)?)
}

fn authed_get(uri: &str, token: &str) -> Result<Request<Full<Bytes>>, TransportError> {
    Ok(Request::get(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(empty_body())?)
}

#[inline]
async fn run_timed<T, F: Future<Output = T>>(fut: F) -> (Duration, T) {
    let start = Instant::now();
    let res = fut.await;
    (start.elapsed(), res)
}
