use std::process::Stdio;

use common::{
    bench::{Bench, BenchCmd, BenchError},
    config::CommandTemplate,
};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs each example as an external process built from a [`CommandTemplate`]
#[derive(Debug, Default, Clone)]
pub struct Cmd {
    pub template: CommandTemplate,
}

impl Cmd {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }
}

#[async_trait::async_trait]
impl Bench for Cmd {
    fn name(&self) -> &'static str {
        "cmd"
    }

    fn cmd(&self, example: &str, frames: u64) -> BenchCmd {
        BenchCmd {
            program: self.template.program.clone(),
            args: self.template.args_for(example, frames),
        }
    }

    async fn run(&self, example: &str, frames: u64) -> Result<String, BenchError> {
        let BenchCmd { program, args } = self.cmd(example, frames);
        debug!("program={} args={}", program, args.join(" "));
        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| BenchError::Launch {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or_else(|| {
                warn!("{example} terminated by signal: {}", output.status);
                1
            });
            return Err(BenchError::Exit {
                example: example.to_owned(),
                code,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sh(script: &str) -> Cmd {
        Cmd::new(CommandTemplate {
            program: "sh".to_owned(),
            args: vec!["-c".to_owned(), script.to_owned()],
        })
    }

    #[test]
    fn cmd_substitutes_placeholders() {
        let cmd = Cmd::default().cmd("cube", 300);
        assert_eq!(
            cmd.to_string(),
            "cargo run --release --features spirv --quiet --example cube -- 300"
        );
    }

    #[tokio::test]
    async fn captures_stdout() {
        let out = sh("echo {example}; echo; echo {frames}")
            .run("cube", 42)
            .await
            .unwrap();
        assert_eq!(out, "cube\n\n42\n");
    }

    #[tokio::test]
    async fn non_zero_exit_reports_code() {
        let err = sh("echo 1; exit 3").run("cube", 1).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "cube returned code 3");
    }

    #[tokio::test]
    async fn missing_program_fails_to_launch() {
        let cmd = Cmd::new(CommandTemplate {
            program: "/nonexistent/frame-bench-test".to_owned(),
            args: vec![],
        });
        let err = cmd.run("cube", 1).await.unwrap_err();
        assert!(matches!(err, BenchError::Launch { .. }));
    }
}
