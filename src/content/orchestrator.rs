//! Generation orchestration
//!
//! Drives a content generation end to end: load the user's stored
//! preferences, merge them with the explicit request, invoke the engine,
//! and publish the validated bundle to the cache. Each run is tracked as a
//! job so clients can fire a request and poll for completion instead of
//! holding a connection open across a long generation.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bridge::{BridgeError, ContentEngine, Difficulty, EngineRequest};
use crate::cache::{ContentBundle, ContentCache};
use crate::db::schemas::UserProfileDoc;
use crate::db::UserStore;

/// Completed and failed jobs are dropped after this long
const JOB_RETENTION_MINUTES: i64 = 60;

/// Failures surfaced by generation and retrieval
#[derive(Debug, Error)]
pub enum ContentError {
    /// The engine invocation did not produce a usable bundle
    #[error("Content generation failed: {0}")]
    GenerationFailed(BridgeError),

    /// Neither the cache nor the engine knows the requested content
    #[error("Content not found")]
    NotFound,

    /// Engine failure during a lookup
    #[error(transparent)]
    Upstream(#[from] BridgeError),
}

/// Client-supplied generation parameters; unset fields fall back to the
/// stored profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub difficulty: Option<Difficulty>,
    pub topic: Option<String>,
    pub subtopic: Option<String>,
    #[serde(default)]
    pub characters: BTreeMap<String, String>,
}

/// What a retrieval is asking for
#[derive(Debug, Clone)]
pub enum ContentSelector {
    Latest,
    Id(String),
}

/// Lifecycle of one generation run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Requested,
    LoadingContext,
    Invoking,
    Populating,
    Ready,
    Failed(String),
}

impl JobState {
    /// Legal transitions. Ready and Failed are terminal, and a job can
    /// never jump from Requested straight to Ready.
    pub fn can_transition(&self, next: &JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Requested, JobState::LoadingContext)
                | (JobState::Requested, JobState::Failed(_))
                | (JobState::LoadingContext, JobState::Invoking)
                | (JobState::LoadingContext, JobState::Failed(_))
                | (JobState::Invoking, JobState::Populating)
                | (JobState::Invoking, JobState::Failed(_))
                | (JobState::Populating, JobState::Ready)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Ready | JobState::Failed(_))
    }
}

/// Snapshot of one tracked generation run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub id: Uuid,
    #[serde(skip)]
    pub subject: String,
    pub state: JobState,
    /// Set once the bundle is published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Orchestrator {
    engine: Arc<dyn ContentEngine>,
    cache: Arc<ContentCache>,
    users: Arc<UserStore>,
    jobs: DashMap<Uuid, GenerationJob>,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn ContentEngine>,
        cache: Arc<ContentCache>,
        users: Arc<UserStore>,
    ) -> Self {
        Self {
            engine,
            cache,
            users,
            jobs: DashMap::new(),
        }
    }

    /// Run a generation to completion and return the bundle.
    pub async fn generate(
        &self,
        subject: &str,
        request: GenerationRequest,
    ) -> Result<ContentBundle, ContentError> {
        self.prune_stale_jobs();

        let job_id = self.create_job(subject);
        self.run_pipeline(job_id, subject, request).await
    }

    /// Start a generation in the background and return its job id
    /// immediately; progress is observable through `job_status`.
    pub fn start(self: &Arc<Self>, subject: String, request: GenerationRequest) -> Uuid {
        self.prune_stale_jobs();

        let job_id = self.create_job(&subject);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            // Outcome lands in the job table either way
            let _ = this.run_pipeline(job_id, &subject, request).await;
        });
        job_id
    }

    /// Snapshot of a tracked job
    pub fn job_status(&self, job_id: &Uuid) -> Option<GenerationJob> {
        self.jobs.get(job_id).map(|j| j.clone())
    }

    /// Retrieve a bundle: cache first, then the engine's lookup surface
    /// with a cache backfill on success.
    pub async fn fetch(&self, selector: ContentSelector) -> Result<ContentBundle, ContentError> {
        match &selector {
            ContentSelector::Id(id) => {
                if let Some(bundle) = self.cache.get(id) {
                    return Ok(bundle);
                }
            }
            ContentSelector::Latest => {
                if let Some(bundle) = self.cache.latest() {
                    return Ok(bundle);
                }
            }
        }

        let upstream = match &selector {
            ContentSelector::Id(id) => self.engine.fetch(id).await?,
            ContentSelector::Latest => self.engine.fetch_latest().await?,
        };

        match upstream {
            Some(response) => {
                let bundle = ContentBundle {
                    id: response.id,
                    story: response.story,
                    quiz: response.quiz,
                    summary: response.summary,
                };
                self.cache.put(bundle.clone());
                debug!(id = %bundle.id, "Backfilled cache from engine lookup");
                Ok(bundle)
            }
            None => Err(ContentError::NotFound),
        }
    }

    async fn run_pipeline(
        &self,
        job_id: Uuid,
        subject: &str,
        request: GenerationRequest,
    ) -> Result<ContentBundle, ContentError> {
        self.set_state(job_id, JobState::LoadingContext);

        // Profile problems never block generation; defaults substitute
        let profile = match self.users.load(subject).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!(%subject, "No stored profile, using defaults");
                UserProfileDoc::new(subject.to_string())
            }
            Err(e) => {
                warn!(%subject, error = %e, "Profile load failed, using defaults");
                UserProfileDoc::new(subject.to_string())
            }
        };

        let merged = merge_request(&profile, &request);

        self.set_state(job_id, JobState::Invoking);
        match self.engine.generate(&merged).await {
            Ok(response) => {
                self.set_state(job_id, JobState::Populating);
                let bundle = ContentBundle {
                    id: response.id,
                    story: response.story,
                    quiz: response.quiz,
                    summary: response.summary,
                };
                self.cache.put(bundle.clone());
                self.complete_job(job_id, &bundle.id);
                info!(id = %bundle.id, %subject, "Content bundle published");
                Ok(bundle)
            }
            Err(e) => {
                warn!(%subject, error = %e, "Engine invocation failed");
                self.set_state(job_id, JobState::Failed(e.to_string()));
                Err(ContentError::GenerationFailed(e))
            }
        }
    }

    fn create_job(&self, subject: &str) -> Uuid {
        let job_id = Uuid::new_v4();
        let now = Utc::now();
        self.jobs.insert(
            job_id,
            GenerationJob {
                id: job_id,
                subject: subject.to_string(),
                state: JobState::Requested,
                content_id: None,
                created_at: now,
                updated_at: now,
            },
        );
        job_id
    }

    fn set_state(&self, job_id: Uuid, next: JobState) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            if job.state.can_transition(&next) {
                job.state = next;
                job.updated_at = Utc::now();
            } else {
                warn!(%job_id, from = ?job.state, to = ?next, "Illegal job transition ignored");
            }
        }
    }

    fn complete_job(&self, job_id: Uuid, content_id: &str) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            if job.state.can_transition(&JobState::Ready) {
                job.state = JobState::Ready;
                job.content_id = Some(content_id.to_string());
                job.updated_at = Utc::now();
            }
        }
    }

    fn prune_stale_jobs(&self) {
        let cutoff = Utc::now() - ChronoDuration::minutes(JOB_RETENTION_MINUTES);
        self.jobs
            .retain(|_, job| !(job.state.is_terminal() && job.updated_at < cutoff));
    }
}

/// Merge the explicit request with the stored profile; explicit fields win.
fn merge_request(profile: &UserProfileDoc, request: &GenerationRequest) -> EngineRequest {
    let difficulty = request.difficulty.unwrap_or_else(|| {
        profile
            .preferences
            .difficulty
            .parse::<Difficulty>()
            .unwrap_or_default()
    });

    let topic = request
        .topic
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| profile.preferences.interests.keys().next().cloned())
        .unwrap_or_else(|| "Budgeting".to_string());

    // Profile interests seed the character roster; explicit entries win
    let mut characters = profile.preferences.interests.clone();
    for (role, name) in &request.characters {
        characters.insert(role.clone(), name.clone());
    }

    EngineRequest {
        difficulty,
        topic,
        subtopic: request.subtopic.clone(),
        characters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::EngineResponse;
    use crate::cache::CacheConfig;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Engine double with scripted generate outcomes and a fixed lookup
    /// table; records the last merged request it saw.
    struct StubEngine {
        generations: Mutex<VecDeque<Result<EngineResponse, BridgeError>>>,
        lookup: Mutex<Option<EngineResponse>>,
        last_request: Mutex<Option<EngineRequest>>,
    }

    impl StubEngine {
        fn new() -> Self {
            Self {
                generations: Mutex::new(VecDeque::new()),
                lookup: Mutex::new(None),
                last_request: Mutex::new(None),
            }
        }

        fn push_generation(&self, outcome: Result<EngineResponse, BridgeError>) {
            self.generations.lock().unwrap().push_back(outcome);
        }

        fn set_lookup(&self, response: Option<EngineResponse>) {
            *self.lookup.lock().unwrap() = response;
        }

        fn last_request(&self) -> Option<EngineRequest> {
            self.last_request.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentEngine for StubEngine {
        async fn generate(&self, request: &EngineRequest) -> Result<EngineResponse, BridgeError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.generations
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BridgeError::Unavailable("no scripted outcome".into())))
        }

        async fn fetch(&self, id: &str) -> Result<Option<EngineResponse>, BridgeError> {
            Ok(self
                .lookup
                .lock()
                .unwrap()
                .clone()
                .filter(|r| r.id == id))
        }

        async fn fetch_latest(&self) -> Result<Option<EngineResponse>, BridgeError> {
            Ok(self.lookup.lock().unwrap().clone())
        }
    }

    fn response(id: &str) -> EngineResponse {
        EngineResponse {
            id: id.to_string(),
            story: json!({"title": id}),
            quiz: json!({"questions": []}),
            summary: json!({"points": []}),
        }
    }

    fn harness() -> (Arc<StubEngine>, Arc<ContentCache>, Arc<UserStore>, Arc<Orchestrator>) {
        let engine = Arc::new(StubEngine::new());
        let cache = Arc::new(ContentCache::new(CacheConfig::default()));
        let users = Arc::new(UserStore::memory_only());
        let orchestrator = Arc::new(Orchestrator::new(
            engine.clone() as Arc<dyn ContentEngine>,
            cache.clone(),
            users.clone(),
        ));
        (engine, cache, users, orchestrator)
    }

    #[tokio::test]
    async fn test_generate_publishes_bundle_to_cache() {
        let (engine, cache, _, orchestrator) = harness();
        engine.push_generation(Ok(response("s1")));

        let bundle = orchestrator
            .generate("u1", GenerationRequest::default())
            .await
            .unwrap();
        assert_eq!(bundle.id, "s1");

        assert_eq!(cache.get("s1").unwrap().id, "s1");
        assert_eq!(cache.latest().unwrap().id, "s1");
    }

    #[tokio::test]
    async fn test_two_generations_retrievable_independently() {
        let (engine, _, _, orchestrator) = harness();
        engine.push_generation(Ok(response("s1")));
        engine.push_generation(Ok(response("s2")));

        orchestrator
            .generate("u1", GenerationRequest::default())
            .await
            .unwrap();
        orchestrator
            .generate("u1", GenerationRequest::default())
            .await
            .unwrap();

        let first = orchestrator
            .fetch(ContentSelector::Id("s1".to_string()))
            .await
            .unwrap();
        let second = orchestrator
            .fetch(ContentSelector::Id("s2".to_string()))
            .await
            .unwrap();
        assert_eq!(first.id, "s1");
        assert_eq!(second.id, "s2");
        assert_eq!(
            orchestrator.fetch(ContentSelector::Latest).await.unwrap().id,
            "s2"
        );
    }

    #[tokio::test]
    async fn test_engine_timeout_leaves_cache_empty() {
        let (engine, cache, _, orchestrator) = harness();
        engine.push_generation(Err(BridgeError::Unavailable("timed out".into())));

        let err = orchestrator
            .generate("u1", GenerationRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ContentError::GenerationFailed(BridgeError::Unavailable(_))
        ));
        assert!(cache.is_empty());

        // Nothing was ever generated, so latest is a clean not-found
        let err = orchestrator.fetch(ContentSelector::Latest).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound));
    }

    #[tokio::test]
    async fn test_explicit_request_fields_override_profile() {
        let (engine, _, users, orchestrator) = harness();

        let mut profile = UserProfileDoc::new("u1".to_string());
        profile.preferences.difficulty = "advanced".to_string();
        profile
            .preferences
            .interests
            .insert("Saving".to_string(), "Maya".to_string());
        users.put(profile).await.unwrap();

        engine.push_generation(Ok(response("s1")));
        let request = GenerationRequest {
            difficulty: Some(Difficulty::Beginner),
            topic: Some("Credit".to_string()),
            ..Default::default()
        };
        orchestrator.generate("u1", request).await.unwrap();

        let sent = engine.last_request().unwrap();
        assert_eq!(sent.difficulty, Difficulty::Beginner);
        assert_eq!(sent.topic, "Credit");
        // Profile interests still seed the characters
        assert_eq!(sent.characters.get("Saving").map(String::as_str), Some("Maya"));
    }

    #[tokio::test]
    async fn test_profile_defaults_fill_unset_fields() {
        let (engine, _, users, orchestrator) = harness();

        let mut profile = UserProfileDoc::new("u1".to_string());
        profile.preferences.difficulty = "intermediate".to_string();
        profile
            .preferences
            .interests
            .insert("Investing".to_string(), "Leo".to_string());
        users.put(profile).await.unwrap();

        engine.push_generation(Ok(response("s1")));
        orchestrator
            .generate("u1", GenerationRequest::default())
            .await
            .unwrap();

        let sent = engine.last_request().unwrap();
        assert_eq!(sent.difficulty, Difficulty::Intermediate);
        assert_eq!(sent.topic, "Investing");
    }

    #[tokio::test]
    async fn test_background_job_reaches_ready() {
        let (engine, _, _, orchestrator) = harness();
        engine.push_generation(Ok(response("s1")));

        let job_id = orchestrator.start("u1".to_string(), GenerationRequest::default());

        // Requested immediately; terminal shortly after
        assert!(orchestrator.job_status(&job_id).is_some());
        for _ in 0..50 {
            if let Some(job) = orchestrator.job_status(&job_id) {
                if job.state.is_terminal() {
                    assert_eq!(job.state, JobState::Ready);
                    assert_eq!(job.content_id.as_deref(), Some("s1"));
                    return;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("job never reached a terminal state");
    }

    #[tokio::test]
    async fn test_failed_job_records_reason() {
        let (engine, _, _, orchestrator) = harness();
        engine.push_generation(Err(BridgeError::Crashed {
            code: Some(1),
            diagnostic: "traceback".into(),
        }));

        let job_id = orchestrator.start("u1".to_string(), GenerationRequest::default());
        for _ in 0..50 {
            if let Some(job) = orchestrator.job_status(&job_id) {
                if let JobState::Failed(reason) = &job.state {
                    assert!(reason.contains("traceback"));
                    return;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("job never failed");
    }

    #[tokio::test]
    async fn test_fetch_backfills_cache_from_engine() {
        let (engine, cache, _, orchestrator) = harness();
        engine.set_lookup(Some(response("s9")));

        assert!(cache.get("s9").is_none());
        let bundle = orchestrator
            .fetch(ContentSelector::Id("s9".to_string()))
            .await
            .unwrap();
        assert_eq!(bundle.id, "s9");
        assert!(cache.get("s9").is_some());
    }

    #[tokio::test]
    async fn test_terminal_jobs_pruned_after_retention() {
        let (engine, _, _, orchestrator) = harness();
        engine.push_generation(Ok(response("s1")));
        engine.push_generation(Ok(response("s2")));

        orchestrator
            .generate("u1", GenerationRequest::default())
            .await
            .unwrap();

        // Age the finished job past the retention window
        let old_id = *orchestrator.jobs.iter().next().unwrap().key();
        orchestrator.jobs.get_mut(&old_id).unwrap().updated_at =
            Utc::now() - ChronoDuration::minutes(JOB_RETENTION_MINUTES + 1);

        orchestrator
            .generate("u1", GenerationRequest::default())
            .await
            .unwrap();

        assert!(orchestrator.job_status(&old_id).is_none());
        assert_eq!(orchestrator.jobs.len(), 1);
    }

    #[test]
    fn test_job_state_machine_legality() {
        use JobState::*;

        assert!(Requested.can_transition(&LoadingContext));
        assert!(LoadingContext.can_transition(&Invoking));
        assert!(Invoking.can_transition(&Populating));
        assert!(Populating.can_transition(&Ready));
        assert!(Invoking.can_transition(&Failed("x".into())));

        // No shortcut and no leaving terminal states
        assert!(!Requested.can_transition(&Ready));
        assert!(!Ready.can_transition(&Invoking));
        assert!(!Failed("x".into()).can_transition(&LoadingContext));
        assert!(!Populating.can_transition(&Failed("x".into())));
    }
}
