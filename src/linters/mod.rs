//! Backends for the external HTML, CSS and JavaScript linters.
//!
//! The linters themselves are Node packages. A [`ScriptHost`] evaluates a
//! small bridge script that calls the package and prints its report as JSON;
//! backends only build the request and decode the answer.

pub mod markup;
pub mod script;
pub mod style;

use crate::error::{GradeError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Evaluates a bridge script with a JSON request on stdin.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    async fn eval(&self, linter: &'static str, script: &str, request: &Json) -> Result<Json>;
}

/// Runs bridge scripts with a local `node` executable.
#[derive(Debug, Clone)]
pub struct NodeHost {
    program: String,
    cwd: Option<PathBuf>,
}

impl NodeHost {
    pub fn new(program: impl Into<String>) -> Self {
        NodeHost {
            program: program.into(),
            cwd: None,
        }
    }

    /// Directory `require` resolves linter packages from.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl Default for NodeHost {
    fn default() -> Self {
        NodeHost::new("node")
    }
}

#[async_trait]
impl ScriptHost for NodeHost {
    async fn eval(&self, linter: &'static str, script: &str, request: &Json) -> Result<Json> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-e")
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        log::debug!("running {} bridge via {}", linter, self.program);
        let mut child = cmd.spawn().map_err(|source| GradeError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let payload = serde_json::to_vec(request).map_err(|source| GradeError::Decode {
            linter,
            source,
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload).await {
                Ok(()) => {}
                // the bridge may exit before reading; its output decides
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    log::debug!("{} bridge closed stdin early", linter);
                }
                Err(source) => {
                    return Err(GradeError::Spawn {
                        program: self.program.clone(),
                        source,
                    })
                }
            }
            // closing stdin lets the bridge start linting
            drop(stdin);
        }

        let out = child
            .wait_with_output()
            .await
            .map_err(|source| GradeError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&out.stdout);
        // linters exit non-zero when they find problems; only a missing report is fatal
        if stdout.trim().is_empty() {
            return Err(GradeError::Bridge {
                linter,
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        serde_json::from_str(stdout.trim()).map_err(|source| GradeError::Decode { linter, source })
    }
}

/// Decode a bridge answer into a backend report type.
pub(crate) fn decode<T: DeserializeOwned>(linter: &'static str, value: Json) -> Result<T> {
    serde_json::from_value(value).map_err(|source| GradeError::Decode { linter, source })
}

pub(crate) fn path_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Host that answers every request with a fixed report and records the request.
    pub struct CannedHost {
        pub answer: Json,
        pub seen: Mutex<Vec<Json>>,
    }

    impl CannedHost {
        pub fn new(answer: Json) -> Self {
            CannedHost {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn last_request(&self) -> Json {
            self.seen
                .lock()
                .unwrap()
                .last()
                .cloned()
                .unwrap_or(Json::Null)
        }
    }

    #[async_trait]
    impl ScriptHost for CannedHost {
        async fn eval(&self, _linter: &'static str, _script: &str, request: &Json) -> Result<Json> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.answer.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let host = NodeHost::new("webgrade-no-such-node-binary");
        let err = host
            .eval("markup", "process.exit(0)", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_empty_report_is_bridge_error() {
        // `true` ignores its arguments and prints nothing
        let host = NodeHost::new("true");
        let err = host.eval("style", "", &json!({})).await.unwrap_err();
        assert!(matches!(err, GradeError::Bridge { linter: "style", .. }));
    }
}
