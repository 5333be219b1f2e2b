//! Validation engine seam.
//!
//! The bridge only shapes submissions. Field-level validation is left to an
//! engine behind the [`Validator`] trait, usually an external program run by
//! [`ProcessValidator`].

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde_json::{Value, json};

use crate::{
    config::ValidatorConfig,
    error::{BridgeError, BridgeResult},
    plugins::CustomComponent,
    utils::Command,
};

/// A validation engine.
pub trait Validator: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &str;

    /// Validates a cleaned submission against its form.
    ///
    /// Returns the engine's view of the submission on success.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Validation`] when the submission is rejected, any
    /// other variant when the engine itself failed.
    fn validate(
        &self,
        form: &Value,
        submission: &Value,
        components: &[CustomComponent],
    ) -> BridgeResult<Value>;
}

/// Stands in when no engine is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

impl Validator for Unconfigured {
    fn name(&self) -> &str {
        "none"
    }

    fn validate(&self, _: &Value, _: &Value, _: &[CustomComponent]) -> BridgeResult<Value> {
        Err(BridgeError::NoValidator)
    }
}

/// Runs an external program per validation.
///
/// The program reads `{"form", "submission", "components"}` from stdin and
/// writes the validated submission to stdout. A non-zero exit or anything
/// on stderr is a failure; stderr holding a JSON array of messages is a
/// rejection.
pub struct ProcessValidator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    workdir: PathBuf,
    value_replace: Arc<dyn Fn(&OsStr) -> String + Send + Sync>,
}

impl ProcessValidator {
    /// Builds a validator from its configuration.
    ///
    /// Arguments go through `value_replace` before each run.
    pub fn new(
        config: &ValidatorConfig,
        workdir: &Path,
        value_replace: impl Fn(&OsStr) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            workdir: workdir.to_path_buf(),
            value_replace: Arc::new(value_replace),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self) -> Command {
        let replace = self.value_replace.clone();
        let mut cmd = Command::new(&self.program, &self.workdir, move |s| replace(s));
        cmd.args(&self.args);
        cmd
    }
}

impl Validator for ProcessValidator {
    fn name(&self) -> &str {
        &self.program
    }

    fn validate(
        &self,
        form: &Value,
        submission: &Value,
        components: &[CustomComponent],
    ) -> BridgeResult<Value> {
        let request = json!({
            "form": form,
            "submission": submission,
            "components": components,
        });
        let input = serde_json::to_vec(&request).map_err(BridgeError::malformed)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let mut cmd = self.command();
        let out = runtime.block_on(cmd.output_with_timeout(&input, self.timeout))?;

        let stderr = String::from_utf8_lossy(&out.stderr);
        let stderr = stderr.trim();
        if !out.status.success() || !stderr.is_empty() {
            if stderr.is_empty() {
                return Err(BridgeError::Engine(format!("{} exited with {}", self.program, out.status)));
            }
            return Err(failure(stderr));
        }

        let stdout = String::from_utf8_lossy(&out.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Err(BridgeError::Engine(format!("{} produced no output", self.program)));
        }
        serde_json::from_str(stdout)
            .map_err(|e| BridgeError::Engine(format!("{} produced invalid JSON: {e}", self.program)))
    }
}

/// Maps engine stderr to an error.
///
/// `["msg", ...]` and `[{"message": "msg"}, ...]` are rejections, anything
/// else is an engine failure.
fn failure(stderr: &str) -> BridgeError {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(stderr) else {
        return BridgeError::Engine(stderr.to_string());
    };

    let messages: Option<Vec<String>> = items
        .iter()
        .map(|item| match item {
            Value::String(msg) => Some(msg.clone()),
            Value::Object(map) => map.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect();

    match messages {
        Some(messages) => BridgeError::Validation(messages),
        None => BridgeError::Engine(stderr.to_string()),
    }
}
