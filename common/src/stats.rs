use eyre::{Result, bail};
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use crate::result::{Group, Sample};

pub fn mean(data: &[Sample]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().map(|&x| x as f64).sum::<f64>() / data.len() as f64
}

/// Population standard deviation
pub fn std_dev(data: &[Sample]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let mean = mean(data);
    let variance = data
        .iter()
        .map(|&x| {
            let diff = x as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    variance.sqrt()
}

pub fn coefficient_of_variation(data: &[Sample]) -> f64 {
    std_dev(data) / mean(data)
}

/// Average of already computed values, NaN when there are none
fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn flatten(group: &Group) -> Vec<Sample> {
    group.samples().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: u32,
}

/// Upper limit on the bins of one histogram
pub const MAX_BINS: usize = 10_000;

/// Fixed width bins on the edges `lower, lower + width, ..` up to the last edge not past
/// `floor(upper)`. Every bin is `[start, end)` except the last one, which is `[start, end]`.
/// Values outside the edges are not counted.
pub fn histogram(values: &[f64], lower: f64, upper: f64, width: f64) -> Result<Vec<Bin>> {
    if values.is_empty() || width <= 0.0 {
        return Ok(Vec::new());
    }
    let edges = ((upper.floor() + width - lower) / width).ceil();
    let needed = edges - 1.0;
    if !needed.is_finite() || needed > MAX_BINS as f64 {
        bail!(
            "Histogram from {lower} to {upper} needs {needed} bins of width {width}, \
             at most {MAX_BINS} are supported"
        );
    }
    // A single edge still gets one bin
    let num_bins = (edges as usize).saturating_sub(1).max(1);
    let mut bins = (0..num_bins)
        .map(|i| {
            let start = lower + i as f64 * width;
            Bin {
                start,
                end: start + width,
                count: 0,
            }
        })
        .collect::<Vec<_>>();
    let last_end = lower + num_bins as f64 * width;
    for &value in values {
        if value < lower || value > last_end {
            continue;
        }
        let idx = (((value - lower) / width).floor() as usize).min(num_bins - 1);
        bins[idx].count += 1;
    }
    Ok(bins)
}

/// Lower bin edge and maximum of `values`, as the histograms use them
pub fn bin_bounds(values: &[f64]) -> Option<(f64, f64)> {
    match values.iter().copied().minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(x) => Some((x.floor(), x)),
        MinMaxResult::MinMax(min, max) => Some((min.floor(), max)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub name: String,
    pub replicates: usize,
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub mean_cv: f64,
    pub min: Sample,
    pub max: Sample,
}

impl Summary {
    pub fn of(group: &Group) -> Self {
        let samples = flatten(group);
        // Parsed groups always hold a replicate, hand built ones may not
        let cvs = group
            .replicates
            .iter()
            .map(|r| coefficient_of_variation(r))
            .collect::<Vec<_>>();
        let (min, max) = match samples.iter().minmax() {
            MinMaxResult::NoElements => (0, 0),
            MinMaxResult::OneElement(&x) => (x, x),
            MinMaxResult::MinMax(&min, &max) => (min, max),
        };
        Self {
            name: group.name.clone(),
            replicates: group.replicates.len(),
            samples: samples.len(),
            mean: mean(&samples),
            std_dev: std_dev(&samples),
            mean_cv: average(&cvs),
            min,
            max,
        }
    }
}
