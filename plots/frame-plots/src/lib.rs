use std::{fs, ops::Range, path::Path};

use common::{
    plot::{ChartData, HistogramPanel},
    result::Sample,
};
use eyre::{Result, bail};
use itertools::{Itertools, MinMaxResult};
use plotters::{coord::Shift, prelude::*};
use tracing::debug;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const SIZE: (u32, u32) = (1024, 768);

/// Renders `chart` as an SVG file at `path`, creating parent directories as needed
pub fn render(chart: &ChartData, title: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    match chart {
        ChartData::Box {
            labels,
            series,
            y_desc,
        } => draw_box(&root, title, labels, series, y_desc)?,
        ChartData::Scatter {
            categories,
            points,
            x_desc,
            y_desc,
        } => draw_scatter(&root, title, categories, points, x_desc.as_deref(), y_desc)?,
        ChartData::Histogram { panels, x_desc, .. } => {
            draw_histograms(&root, title, panels, x_desc)?
        }
        ChartData::Line {
            label,
            samples,
            y_desc,
        } => draw_line(&root, &format!("{title} ({label})"), samples, y_desc)?,
    }
    root.present()?;
    debug!("Rendered {}", path.display());
    Ok(())
}

fn draw_box(
    root: &Area<'_>,
    title: &str,
    labels: &[String],
    series: &[Vec<Sample>],
    y_desc: &str,
) -> Result<()> {
    if series.iter().any(|s| s.is_empty()) {
        bail!("Cannot draw a box for an empty sample list");
    }
    let quartiles = series
        .iter()
        .map(|s| Quartiles::new(&s.iter().map(|&x| x as f64).collect::<Vec<_>>()))
        .collect::<Vec<_>>();
    let y = padded_range(
        quartiles
            .iter()
            .flat_map(|q| q.values())
            .map(f64::from),
    );

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (0..labels.len()).into_segmented(),
            y.start as f32..y.end as f32,
        )?;

    let formatter = |v: &SegmentValue<usize>| segment_label(labels, v);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&formatter)
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(
        quartiles
            .iter()
            .enumerate()
            .map(|(i, q)| Boxplot::new_vertical(SegmentValue::CenterOf(i), q)),
    )?;
    Ok(())
}

fn draw_scatter(
    root: &Area<'_>,
    title: &str,
    categories: &[String],
    points: &[(usize, f64)],
    x_desc: Option<&str>,
    y_desc: &str,
) -> Result<()> {
    let y = padded_range(points.iter().map(|p| p.1));
    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0..categories.len()).into_segmented(), y)?;

    let formatter = |v: &SegmentValue<usize>| segment_label(categories, v);
    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .x_labels(categories.len())
            .x_label_formatter(&formatter)
            .y_desc(y_desc);
        if let Some(x_desc) = x_desc {
            mesh.x_desc(x_desc);
        }
        mesh.draw()?;
    }

    chart.draw_series(
        points
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|&(i, v)| Circle::new((SegmentValue::CenterOf(i), v), 3, BLUE.filled())),
    )?;
    Ok(())
}

fn draw_histograms(
    root: &Area<'_>,
    title: &str,
    panels: &[HistogramPanel],
    x_desc: &str,
) -> Result<()> {
    if panels.is_empty() {
        bail!("No histogram panels to draw");
    }
    let x = match panels
        .iter()
        .flat_map(|p| p.bins.iter())
        .flat_map(|b| [b.start, b.end])
        .minmax_by(f64::total_cmp)
    {
        MinMaxResult::MinMax(lo, hi) => lo..hi,
        _ => 0.0..1.0,
    };

    let areas = root.split_evenly((panels.len(), 1));
    for (idx, (area, panel)) in areas.iter().zip(panels).enumerate() {
        let last = idx + 1 == panels.len();
        let max_count = panel.bins.iter().map(|b| b.count).max().unwrap_or(0);

        let mut builder = ChartBuilder::on(area);
        builder
            .margin(5)
            .x_label_area_size(if last { 35 } else { 0 })
            .y_label_area_size(80);
        if idx == 0 {
            builder.caption(title, ("sans-serif", 24));
        }
        let mut chart = builder.build_cartesian_2d(x.clone(), 0u32..max_count + 1)?;

        {
            let mut mesh = chart.configure_mesh();
            mesh.disable_x_mesh().y_desc(panel.label.as_str());
            if last {
                mesh.x_desc(x_desc);
            }
            mesh.draw()?;
        }

        let style = Palette99::pick(idx).mix(0.8).filled();
        chart.draw_series(
            panel
                .bins
                .iter()
                .filter(|b| b.count > 0)
                .map(|b| Rectangle::new([(b.start, 0u32), (b.end, b.count)], style)),
        )?;
    }
    Ok(())
}

fn draw_line(root: &Area<'_>, title: &str, samples: &[Sample], y_desc: &str) -> Result<()> {
    let y = padded_range(samples.iter().map(|&s| s as f64));
    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(0..samples.len().max(1), y)?;

    chart.configure_mesh().y_desc(y_desc).draw()?;
    chart.draw_series(LineSeries::new(
        samples.iter().enumerate().map(|(i, &s)| (i, s as f64)),
        &RED,
    ))?;
    Ok(())
}

fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Range around the finite `values` with 5% headroom on both ends
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    match values.filter(|v| v.is_finite()).minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => 0.0..1.0,
        MinMaxResult::OneElement(x) => {
            let pad = (x.abs() * 0.05).max(1.0);
            x - pad..x + pad
        }
        MinMaxResult::MinMax(lo, hi) => {
            let pad = ((hi - lo) * 0.05).max(1.0);
            lo - pad..hi + pad
        }
    }
}
