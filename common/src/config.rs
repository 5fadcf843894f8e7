use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs::read_to_string;

pub const EXAMPLE_PLACEHOLDER: &str = "{example}";
pub const FRAMES_PLACEHOLDER: &str = "{frames}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub examples_file: PathBuf,
    pub results_dir: PathBuf,
    pub command: CommandTemplate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            examples_file: PathBuf::from("examples.txt"),
            results_dir: PathBuf::from("results"),
            command: CommandTemplate::default(),
        }
    }
}

impl Config {
    /// Reads `config_file` if given, otherwise the built in defaults
    pub async fn load(config_file: Option<&Path>) -> Result<Self> {
        match config_file {
            Some(path) => {
                let text = read_to_string(path)
                    .await
                    .wrap_err_with(|| format!("Read config file {}", path.display()))?;
                Self::from_yaml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yml::from_str(text).wrap_err("Parse config")
    }
}

/// Program and arguments of the benchmark command. `{example}` and `{frames}` are substituted
/// in every argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandTemplate {
    fn default() -> Self {
        Self {
            program: "cargo".to_owned(),
            args: [
                "run",
                "--release",
                "--features",
                "spirv",
                "--quiet",
                "--example",
                EXAMPLE_PLACEHOLDER,
                "--",
                FRAMES_PLACEHOLDER,
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}

impl CommandTemplate {
    pub fn args_for(&self, example: &str, frames: u64) -> Vec<String> {
        let frames = frames.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(EXAMPLE_PLACEHOLDER, example)
                    .replace(FRAMES_PLACEHOLDER, &frames)
            })
            .collect()
    }
}

/// Benchmark names from the list file, one per line, blank lines skipped
pub async fn read_examples(path: &Path) -> Result<Vec<String>> {
    let text = read_to_string(path)
        .await
        .wrap_err_with(|| format!("Read examples file {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}
