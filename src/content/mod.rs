//! Generation orchestration and content retrieval

mod orchestrator;

pub use orchestrator::{
    ContentError, ContentSelector, GenerationJob, GenerationRequest, JobState, Orchestrator,
};
