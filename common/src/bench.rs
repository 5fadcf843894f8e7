use std::fmt::{self, Debug};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Could not launch {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{example} returned code {code}")]
    Exit { example: String, code: i32 },
}

impl BenchError {
    /// Exit code the whole run should end with
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Launch { .. } => 1,
            Self::Exit { code, .. } => *code,
        }
    }
}

/// A fully substituted command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchCmd {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for BenchCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
pub trait Bench: Debug + Send + Sync {
    /// Name of the bench, for identification
    fn name(&self) -> &'static str;
    /// The command that runs `example` for `frames` frames
    fn cmd(&self, example: &str, frames: u64) -> BenchCmd;
    /// Runs one example to completion and returns its stdout
    ///
    /// Arguments:
    /// * `example` - The benchmark name, as listed in the examples file
    /// * `frames` - Frame count passed to the benchmark
    async fn run(&self, example: &str, frames: u64) -> Result<String, BenchError>;
}
