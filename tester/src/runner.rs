use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use load_test_util::users::UserPool;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;
use tracing::{debug, info, info_span, Instrument};

use crate::client::ApiTransport;
use crate::scenario::{run_iteration, ScenarioConfig};
use crate::statistics::RunSummary;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub virtual_users: usize,
    pub iterations: usize,
    /// Stop starting new iterations once this much time has passed.
    pub duration: Option<Duration>,
    pub seed: Option<u64>,
    pub scenario: ScenarioConfig,
}

/// Runs `virtual_users` concurrent sessions of `iterations` iterations each
/// and merges what they recorded.
pub async fn run<T>(config: RunConfig, transport: Arc<T>, pool: UserPool) -> anyhow::Result<RunSummary>
where
    T: ApiTransport + 'static,
{
    let config = Arc::new(config);
    let deadline = config.duration.map(|d| Instant::now() + d);
    info!(
        virtual_users = config.virtual_users,
        iterations = config.iterations,
        duration = ?config.duration,
        users = pool.len(),
        "starting run"
    );
    let mut tasks = Vec::with_capacity(config.virtual_users);
    for vu in 0..config.virtual_users {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(vu as u64)),
            None => StdRng::from_os_rng(),
        };
        tasks.push(tokio::spawn(
            run_sequential(vu, config.clone(), transport.clone(), pool.clone(), rng, deadline)
                .instrument(info_span!("vu", vu)),
        ));
    }
    let mut summary = RunSummary::default();
    for t in tasks {
        let res = t.await.context("Failed to join virtual user")?;
        summary.merge(&res);
    }
    info!(
        iterations = summary.iterations,
        requests = summary.total_requests(),
        "run finished"
    );
    Ok(summary)
}

async fn run_sequential<T>(
    vu: usize,
    config: Arc<RunConfig>,
    transport: Arc<T>,
    pool: UserPool,
    mut rng: StdRng,
    deadline: Option<Instant>,
) -> RunSummary
where
    T: ApiTransport + 'static,
{
    let mut summary = RunSummary::default();
    for iteration in 0..config.iterations {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!(vu, iteration, "deadline reached");
            break;
        }
        let report = run_iteration(&*transport, &pool, &mut rng, &config.scenario)
            .instrument(info_span!("iteration", iteration))
            .await;
        summary.record(&report);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckName;
    use crate::scenario::Pacing;
    use crate::test_support::{ScriptedApi, BASE};
    use hyper::Method;
    use load_test_util::endpoints::ApiEndpoints;
    use serde_json::json;

    fn config(virtual_users: usize, iterations: usize) -> RunConfig {
        RunConfig {
            virtual_users,
            iterations,
            duration: None,
            seed: Some(3),
            scenario: ScenarioConfig {
                endpoints: ApiEndpoints::new(BASE),
                pacing: Pacing::NONE,
                real_user_probability: 1.0,
            },
        }
    }

    #[tokio::test]
    async fn every_virtual_user_runs_its_iterations() {
        let api = Arc::new(
            ScriptedApi::new()
                .reply(Method::POST, "/api/v1/login", 200, json!({"access_token": "t"}))
                .reply(Method::GET, "/api/v1/me", 200, json!({"id": 1, "tipo_usuario": "Alumno"}))
                .reply(Method::GET, "/api/v1/inscripciones/mis-asignaturas", 200, json!([])),
        );
        let summary = run(config(3, 4), api.clone(), UserPool::new(4)).await.unwrap();

        assert_eq!(summary.iterations, 12);
        assert_eq!(summary.completed_iterations, 12);
        assert_eq!(summary.checks[&CheckName::Login].passed, 12);
        assert_eq!(api.total(), 36);
    }

    #[tokio::test]
    async fn elapsed_deadline_stops_new_iterations() {
        let api = Arc::new(ScriptedApi::new());
        let mut cfg = config(2, 100);
        cfg.duration = Some(Duration::ZERO);
        let summary = run(cfg, api.clone(), UserPool::new(0)).await.unwrap();

        assert_eq!(summary.iterations, 0);
        assert_eq!(api.total(), 0);
    }
}
