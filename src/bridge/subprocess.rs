//! Subprocess adapter for the generation engine
//!
//! Runs the generator script per call with a single JSON argument and reads
//! the result from stdout. The script logs progress on the same stream, so
//! the payload is recovered with the balanced-object scanner. Each call is
//! bounded by the configured timeout; a child that overruns it is killed.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::bridge::engine::{BridgeError, ContentEngine, EngineRequest, EngineResponse};
use crate::bridge::payload::extract_json_object;

pub struct SubprocessBridge {
    interpreter: String,
    script: String,
    call_timeout: Duration,
}

impl SubprocessBridge {
    pub fn new(interpreter: String, script: String, call_timeout: Duration) -> Self {
        Self {
            interpreter,
            script,
            call_timeout,
        }
    }

    /// Spawn the script with one JSON argv and return its parsed payload.
    async fn invoke(&self, payload: &Value) -> Result<Value, BridgeError> {
        let argv = payload.to_string();
        debug!(script = %self.script, "Invoking generation engine subprocess");

        let child = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(&argv)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future on timeout must reap the child
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BridgeError::Unavailable(format!("failed to spawn {}: {}", self.script, e))
            })?;

        let output = match timeout(self.call_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(BridgeError::Unavailable(format!(
                    "engine process error: {e}"
                )))
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Generation engine timed out, child killed"
                );
                return Err(BridgeError::Unavailable(format!(
                    "engine timed out after {}ms",
                    self.call_timeout.as_millis()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BridgeError::Crashed {
                code: output.status.code(),
                diagnostic: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        extract_json_object(&stdout).ok_or_else(|| {
            BridgeError::Malformed("no JSON object found in engine output".to_string())
        })
    }
}

#[async_trait]
impl ContentEngine for SubprocessBridge {
    async fn generate(&self, request: &EngineRequest) -> Result<EngineResponse, BridgeError> {
        let mut payload = serde_json::to_value(request)
            .map_err(|e| BridgeError::Malformed(format!("request encode failed: {e}")))?;
        payload["action"] = json!("generate");

        let value = self.invoke(&payload).await?;

        // A zero exit with success=false is the script reporting its own
        // generation failure, not a transport problem
        if value.get("success").and_then(Value::as_bool) == Some(false) {
            let diagnostic = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("engine reported failure without detail")
                .to_string();
            return Err(BridgeError::Crashed {
                code: None,
                diagnostic,
            });
        }

        let fallback = Uuid::new_v4().to_string();
        EngineResponse::from_value(&value, Some(&fallback))
    }

    async fn fetch(&self, id: &str) -> Result<Option<EngineResponse>, BridgeError> {
        let payload = json!({ "action": "get_story", "story_id": id });
        let value = self.invoke(&payload).await?;

        // Lookup miss is signaled as success=false on a zero exit
        if value.get("success").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }

        EngineResponse::from_value(&value, Some(id)).map(Some)
    }

    async fn fetch_latest(&self) -> Result<Option<EngineResponse>, BridgeError> {
        let payload = json!({ "action": "latest_story" });
        let value = self.invoke(&payload).await?;

        if value.get("success").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }

        EngineResponse::from_value(&value, None).map(Some)
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use crate::bridge::engine::Difficulty;

    fn write_script(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cq-bridge-{}-{}.sh", name, Uuid::new_v4()));
        std::fs::write(&path, body).unwrap();
        path
    }

    fn bridge_for(script: &PathBuf, timeout_ms: u64) -> SubprocessBridge {
        SubprocessBridge::new(
            "sh".to_string(),
            script.to_string_lossy().to_string(),
            Duration::from_millis(timeout_ms),
        )
    }

    fn request() -> EngineRequest {
        EngineRequest {
            difficulty: Difficulty::Beginner,
            topic: "Budgeting".to_string(),
            subtopic: None,
            characters: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_generate_parses_payload_from_noisy_stdout() {
        let script = write_script(
            "ok",
            "echo 'loading model weights'\n\
             echo '{\"success\": true, \"id\": \"s1\", \"story\": {\"t\": 1}, \"quiz\": {}, \"summary\": {}}'\n\
             echo 'done'\n",
        );
        let bridge = bridge_for(&script, 5_000);

        let response = bridge.generate(&request()).await.unwrap();
        assert_eq!(response.id, "s1");
        assert_eq!(response.story["t"], 1);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_crashed_with_stderr() {
        let script = write_script("crash", "echo 'traceback: boom' >&2\nexit 3\n");
        let bridge = bridge_for(&script, 5_000);

        match bridge.generate(&request()).await {
            Err(BridgeError::Crashed { code, diagnostic }) => {
                assert_eq!(code, Some(3));
                assert!(diagnostic.contains("boom"));
            }
            other => panic!("expected Crashed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let script = write_script("slow", "sleep 5\n");
        let bridge = bridge_for(&script, 100);

        assert!(matches!(
            bridge.generate(&request()).await,
            Err(BridgeError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_miss_maps_to_none() {
        let script = write_script(
            "miss",
            "echo '{\"success\": false, \"error\": \"Story not found\"}'\n",
        );
        let bridge = bridge_for(&script, 5_000);

        assert!(bridge.fetch("nope").await.unwrap().is_none());
        assert!(bridge.fetch_latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generate_failure_report_is_crashed() {
        let script = write_script(
            "genfail",
            "echo '{\"success\": false, \"error\": \"model refused\"}'\n",
        );
        let bridge = bridge_for(&script, 5_000);

        match bridge.generate(&request()).await {
            Err(BridgeError::Crashed { code, diagnostic }) => {
                assert_eq!(code, None);
                assert!(diagnostic.contains("model refused"));
            }
            other => panic!("expected Crashed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_stdout_is_malformed() {
        let script = write_script("garbage", "echo 'no json at all'\n");
        let bridge = bridge_for(&script, 5_000);

        assert!(matches!(
            bridge.generate(&request()).await,
            Err(BridgeError::Malformed(_))
        ));
    }
}
