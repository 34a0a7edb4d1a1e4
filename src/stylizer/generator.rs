//! Text generation through an external command (ollama by default).

use super::{GenerationError, LyricGenerator};
use crate::config::{GenerationSettings, Prompts};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};

const PROMPT_PLACEHOLDER: &str = "{{prompt}}";

/// Runs one external process per generation and captures its stdout.
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(program: &str, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            args,
            timeout,
        }
    }

    pub fn with_config(settings: &GenerationSettings) -> Self {
        Self::new(
            &settings.program,
            settings.args.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Argument list with the prompt substituted, or appended when no
    /// argument carries the placeholder.
    fn build_args(&self, prompt: &str) -> Vec<String> {
        let mut vars = HashMap::new();
        vars.insert("prompt".to_string(), prompt.to_string());

        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| Prompts::render(a, &vars))
            .collect();

        if !self.args.iter().any(|a| a.contains(PROMPT_PLACEHOLDER)) {
            args.push(prompt.to_string());
        }
        args
    }
}

impl Default for CommandGenerator {
    fn default() -> Self {
        Self::with_config(&GenerationSettings::default())
    }
}

#[async_trait]
impl LyricGenerator for CommandGenerator {
    #[instrument(skip(self, prompt), fields(program = %self.program))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let child = Command::new(&self.program)
            .args(self.build_args(prompt))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GenerationError::ToolNotFound(self.program.clone())
                } else {
                    GenerationError::Spawn(e.to_string())
                }
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(GenerationError::Spawn(e.to_string())),
            Err(_) => return Err(GenerationError::TimedOut(self.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::Exit {
                code: output.status.code(),
                stderr: strip_ansi(&stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("Generation produced {} bytes", stdout.len());
        Ok(strip_ansi(&stdout).trim().to_string())
    }
}

/// Remove terminal escape sequences (spinners, cursor moves) from CLI output.
fn strip_ansi(text: &str) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let re = ANSI.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("valid ANSI escape pattern")
    });
    re.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> CommandGenerator {
        // `sh -c <script> <$0> <$1>`: the prompt lands in $1.
        CommandGenerator::new(
            "sh",
            vec![
                "-c".to_string(),
                script.to_string(),
                "sh".to_string(),
                PROMPT_PLACEHOLDER.to_string(),
            ],
            timeout,
        )
    }

    #[test]
    fn test_placeholder_is_substituted() {
        let generator = CommandGenerator::default();
        let args = generator.build_args("sing this");
        assert_eq!(args, vec!["run", "mistral:latest", "sing this"]);
    }

    #[test]
    fn test_prompt_is_appended_without_placeholder() {
        let generator = CommandGenerator::new(
            "ollama",
            vec!["run".into(), "mistral:latest".into(), "--prompt".into()],
            Duration::from_secs(1),
        );
        let args = generator.build_args("sing this");
        assert_eq!(args, vec!["run", "mistral:latest", "--prompt", "sing this"]);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[?25lHello\x1b[0m world\x1b[2K"), "Hello world");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let generator =
            CommandGenerator::new("versify-no-such-model", Vec::new(), Duration::from_secs(5));
        let err = generator.generate("x").await.unwrap_err();
        assert_eq!(err, GenerationError::ToolNotFound("versify-no-such-model".into()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_captured_and_trimmed() {
        let generator = sh(r#"printf '\n  %s song  \n' "$1""#, Duration::from_secs(10));
        let out = generator.generate("Hello world").await.unwrap();
        assert_eq!(out, "Hello world song");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_an_error() {
        let generator = sh("echo 'model missing' >&2; exit 3", Duration::from_secs(10));
        let err = generator.generate("anything").await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::Exit {
                code: Some(3),
                stderr: "model missing".into(),
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_process_times_out() {
        let generator = sh("sleep 30", Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = generator.generate("anything").await.unwrap_err();
        assert_eq!(err, GenerationError::TimedOut(Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
