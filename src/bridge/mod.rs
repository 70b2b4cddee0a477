//! Bridge to the out-of-process content generation engine
//!
//! The engine is reached either by spawning the generator script per call
//! (subprocess mode) or over HTTP when it runs as its own service. Both
//! adapters validate payload shape only; semantic handling is the
//! orchestrator's job.

mod engine;
mod http;
mod payload;
mod subprocess;

pub use engine::{BridgeError, ContentEngine, Difficulty, EngineRequest, EngineResponse};
pub use http::HttpBridge;
pub use payload::extract_json_object;
pub use subprocess::SubprocessBridge;
