use std::{num::ParseIntError, path::Path};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    fs::{File, read_to_string},
    io::AsyncWriteExt,
};
use tracing::debug;

/// One measurement, usually nanoseconds per frame
pub type Sample = i64;
/// The samples printed by a single benchmark invocation
pub type Replicate = Vec<Sample>;

const HEADER_MARKER: &str = "---";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: invalid sample {content:?}")]
    InvalidSample {
        line: usize,
        content: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub replicates: Vec<Replicate>,
}

impl Group {
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.replicates.iter().flatten().copied()
    }
}

/// Groups in order of first appearance in a results file
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    groups: Vec<Group>,
}

impl ResultSet {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Appends `replicate` to the group called `name`, creating it if needed.
    /// Empty replicates are dropped.
    pub fn add(&mut self, name: &str, replicate: Replicate) {
        if replicate.is_empty() {
            debug!("Dropping empty section {name}");
            return;
        }
        match self.groups.iter_mut().find(|group| group.name == name) {
            Some(group) => group.replicates.push(replicate),
            None => self.groups.push(Group {
                name: name.to_owned(),
                replicates: vec![replicate],
            }),
        }
    }

    /// Serializes back into the results file format, one section per replicate
    pub fn to_result_string(&self) -> String {
        let mut out = String::new();
        for group in &self.groups {
            for replicate in &group.replicates {
                out.push_str(&section_header(&group.name));
                out.push('\n');
                for sample in replicate {
                    out.push_str(&sample.to_string());
                    out.push('\n');
                }
            }
        }
        out
    }
}

fn section_header(name: &str) -> String {
    format!("{HEADER_MARKER}{name}{HEADER_MARKER}")
}

fn header_name(line: &str) -> Option<&str> {
    line.strip_prefix(HEADER_MARKER)?.strip_suffix(HEADER_MARKER)
}

pub fn parse_results(text: &str) -> Result<ResultSet, ParseError> {
    let mut results = ResultSet::default();
    let mut current: Option<&str> = None;
    let mut samples = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = header_name(line) {
            if let Some(prev) = current.filter(|prev| !prev.is_empty()) {
                results.add(prev, std::mem::take(&mut samples));
            }
            samples.clear();
            current = Some(name);
            continue;
        }

        let sample = line
            .parse::<Sample>()
            .map_err(|source| ParseError::InvalidSample {
                line: idx + 1,
                content: line.to_owned(),
                source,
            })?;
        samples.push(sample);
    }

    if let Some(prev) = current.filter(|prev| !prev.is_empty()) {
        results.add(prev, samples);
    }
    Ok(results)
}

pub async fn read_results(path: &Path) -> Result<ResultSet> {
    let text = read_to_string(path)
        .await
        .wrap_err_with(|| format!("Open results file {}", path.display()))?;
    let results =
        parse_results(&text).wrap_err_with(|| format!("Parse results file {}", path.display()))?;
    debug!("Parsed {} groups from {}", results.len(), path.display());
    Ok(results)
}

/// Incremental writer for a results file, opened once per run
pub struct ResultWriter {
    file: File,
}

impl ResultWriter {
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .wrap_err_with(|| format!("Create results file {}", path.display()))?;
        Ok(Self { file })
    }

    /// Writes one section with the non-blank lines of `output` and flushes it
    pub async fn write_section(&mut self, name: &str, output: &str) -> Result<()> {
        let mut section = section_header(name);
        section.push('\n');
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            section.push_str(line);
            section.push('\n');
        }
        self.file.write_all(section.as_bytes()).await?;
        self.file.flush().await?;
        Ok(())
    }
}
