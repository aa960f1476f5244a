//! Process-per-call sandbox
//!
//! Each evaluation starts a fresh runtime process and feeds it a small
//! wrapper on stdin. The wrapper evaluates the bundle in global scope and
//! prints its completion value, so no state leaks between renders. The
//! process is killed if it outlives the configured timeout.

use crate::build::build_error_output;
use crate::build::entry::js_string;
use crate::config::schema::SandboxRuntime;
use crate::error::{RendrError, RendrResult};
use crate::sandbox::Sandbox;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Sandbox that runs scripts in a Node or Deno child process
pub struct ProcessSandbox {
    runtime: SandboxRuntime,
    command: String,
    timeout: Duration,
}

impl ProcessSandbox {
    /// Create a sandbox for `runtime` using the given executable
    pub fn new(runtime: SandboxRuntime, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runtime,
            command: command.into(),
            timeout,
        }
    }

    async fn exec(&self, program: &str) -> RendrResult<std::process::Output> {
        let args = self.runtime.stdin_args();
        debug!("Executing: {} {:?}", self.command, args);

        let mut child = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RendrError::command_failed(self.command.clone(), e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(program.as_bytes())
                .await
                .map_err(|e| RendrError::io(format!("writing script to {}", self.command), e))?;
        }

        tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RendrError::ExecutionTimeout(self.timeout.as_millis() as u64))?
            .map_err(|e| RendrError::command_failed(self.command.clone(), e))
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn evaluate(&self, script: &str) -> RendrResult<String> {
        let output = self.exec(&wrap_script(script)).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            Ok(strip_final_newline(&stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(RendrError::Execution(build_error_output(&stdout, &stderr)))
        }
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        self.runtime.name()
    }
}

/// Program fed to the runtime: capture the real `console.log` before the
/// bundle silences it, provide `atob`, evaluate, print the result
fn wrap_script(script: &str) -> String {
    format!(
        r#"const __rendrWrite = console.log.bind(console);
if (typeof globalThis.atob !== "function") {{
  globalThis.atob = (s) => Buffer.from(s, "base64").toString("binary");
}}
const __rendrResult = (0, eval)({});
__rendrWrite(__rendrResult === undefined || __rendrResult === null ? "" : String(__rendrResult));
"#,
        js_string(script)
    )
}

fn strip_final_newline(output: &str) -> &str {
    output
        .strip_suffix("\r\n")
        .or_else(|| output.strip_suffix('\n'))
        .unwrap_or(output)
}
