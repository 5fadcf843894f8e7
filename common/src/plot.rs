use std::{fmt, str::FromStr};

use eyre::{Result, bail, eyre};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    result::{Group, ResultSet, Sample},
    stats::{Bin, bin_bounds, coefficient_of_variation, flatten, histogram, mean},
};

/// Bin width for the per-replicate means histogram
pub const MEANS_BIN_WIDTH: f64 = 1e4;
/// Bin width for the raw samples histogram of one group
pub const SAMPLES_BIN_WIDTH: f64 = 5e6;
pub const SAMPLE_UNIT: &str = "nSPF";

pub const CHART_KIND_HINT: &str = "For the 2nd argument, select box, scatter, line, or hist";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Box,
    Scatter,
    #[default]
    Histogram,
    Line,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Scatter => "scatter",
            Self::Histogram => "histogram",
            Self::Line => "line",
        }
    }
}

impl FromStr for ChartKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "box" => Ok(Self::Box),
            "scatter" => Ok(Self::Scatter),
            "hist" | "histogram" => Ok(Self::Histogram),
            "line" => Ok(Self::Line),
            _ => Err(eyre!("Unsupported chart kind {s}")),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which groups a chart is drawn from
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GroupSelection {
    #[default]
    All,
    Index(usize),
}

impl GroupSelection {
    pub const AGGREGATE_SENTINEL: i64 = -1;

    pub fn from_index(index: i64) -> Result<Self> {
        match index {
            Self::AGGREGATE_SENTINEL => Ok(Self::All),
            i if i >= 0 => Ok(Self::Index(i as usize)),
            i => bail!("Invalid group index {i}, use -1 for all groups"),
        }
    }

    fn group<'a>(&self, results: &'a ResultSet) -> Result<Option<&'a Group>> {
        match *self {
            Self::All => Ok(None),
            Self::Index(i) => results.get(i).map(Some).ok_or_else(|| {
                eyre!(
                    "Group index {i} out of range, results contain {} groups",
                    results.len()
                )
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramPanel {
    pub label: String,
    pub bins: Vec<Bin>,
}

/// Everything a renderer needs to draw one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Box {
        labels: Vec<String>,
        series: Vec<Vec<Sample>>,
        y_desc: String,
    },
    Scatter {
        categories: Vec<String>,
        /// (category index, value)
        points: Vec<(usize, f64)>,
        x_desc: Option<String>,
        y_desc: String,
    },
    Histogram {
        panels: Vec<HistogramPanel>,
        bin_width: f64,
        x_desc: String,
    },
    Line {
        label: String,
        samples: Vec<Sample>,
        y_desc: String,
    },
}

impl ChartData {
    pub fn prepare(results: &ResultSet, kind: ChartKind, selection: GroupSelection) -> Result<Self> {
        if results.is_empty() {
            bail!("No samples found in results file");
        }
        let group = selection.group(results)?;
        debug!("Preparing {kind} chart for {selection:?}");
        Ok(match (kind, group) {
            (ChartKind::Box, None) => box_total(results.groups()),
            (ChartKind::Box, Some(group)) => box_replicates(group),
            (ChartKind::Scatter, None) => scatter_cv(results.groups()),
            (ChartKind::Scatter, Some(group)) => scatter_replicates(group),
            (ChartKind::Histogram, None) => histogram_means(results.groups())?,
            (ChartKind::Histogram, Some(group)) => histogram_samples(group)?,
            (ChartKind::Line, None) => {
                bail!("Line charts need a group index, aggregate mode is undefined for them")
            }
            (ChartKind::Line, Some(group)) => line_first_replicate(group),
        })
    }
}

fn box_total(groups: &[Group]) -> ChartData {
    ChartData::Box {
        labels: groups.iter().map(|g| g.name.clone()).collect(),
        series: groups.par_iter().map(flatten).collect(),
        y_desc: SAMPLE_UNIT.to_owned(),
    }
}

fn box_replicates(group: &Group) -> ChartData {
    ChartData::Box {
        labels: (0..group.replicates.len()).map(|i| i.to_string()).collect(),
        series: group.replicates.clone(),
        y_desc: SAMPLE_UNIT.to_owned(),
    }
}

fn scatter_cv(groups: &[Group]) -> ChartData {
    let cvs = groups
        .par_iter()
        .map(|g| {
            g.replicates
                .iter()
                .map(|r| coefficient_of_variation(r))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    ChartData::Scatter {
        categories: groups.iter().map(|g| g.name.clone()).collect(),
        points: cvs
            .into_iter()
            .enumerate()
            .flat_map(|(i, cvs)| cvs.into_iter().map(move |cv| (i, cv)))
            .collect(),
        x_desc: None,
        y_desc: "Coefficient of Variation".to_owned(),
    }
}

fn scatter_replicates(group: &Group) -> ChartData {
    ChartData::Scatter {
        categories: (0..group.replicates.len()).map(|i| i.to_string()).collect(),
        points: group
            .replicates
            .iter()
            .enumerate()
            .flat_map(|(i, r)| r.iter().map(move |&x| (i, x as f64)))
            .collect(),
        x_desc: Some(format!("replicate of {}", group.name)),
        y_desc: SAMPLE_UNIT.to_owned(),
    }
}

fn histogram_means(groups: &[Group]) -> Result<ChartData> {
    let means = groups
        .par_iter()
        .map(|g| g.replicates.iter().map(|r| mean(r)).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let all = means.iter().flatten().copied().collect::<Vec<_>>();
    // Shared bounds so every panel lines up on the same x axis
    let (lower, upper) = bin_bounds(&all).unwrap_or_default();
    let panels = groups
        .iter()
        .zip(&means)
        .map(|(g, means)| {
            Ok(HistogramPanel {
                label: g.name.clone(),
                bins: histogram(means, lower, upper, MEANS_BIN_WIDTH)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ChartData::Histogram {
        panels,
        bin_width: MEANS_BIN_WIDTH,
        x_desc: SAMPLE_UNIT.to_owned(),
    })
}

fn histogram_samples(group: &Group) -> Result<ChartData> {
    let values = group.samples().map(|x| x as f64).collect::<Vec<_>>();
    let (lower, upper) = bin_bounds(&values).unwrap_or_default();
    Ok(ChartData::Histogram {
        panels: vec![HistogramPanel {
            label: group.name.clone(),
            bins: histogram(&values, lower, upper, SAMPLES_BIN_WIDTH)?,
        }],
        bin_width: SAMPLES_BIN_WIDTH,
        x_desc: SAMPLE_UNIT.to_owned(),
    })
}

fn line_first_replicate(group: &Group) -> ChartData {
    ChartData::Line {
        label: group.name.clone(),
        samples: group.replicates.first().cloned().unwrap_or_default(),
        y_desc: SAMPLE_UNIT.to_owned(),
    }
}
