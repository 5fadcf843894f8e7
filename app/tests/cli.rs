use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RESULTS: &str = "---cube---\n16000000\n16500000\n\n17000000\n\
                       ---shadow---\n33000000\n34000000\n\
                       ---cube---\n16100000\n16200000\n";

fn frame_bench(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("frame-bench").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn workspace(results: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("run.result"), results).unwrap();
    dir
}

/// Config running `sh -c <script>` with an examples list
fn bench_workspace(examples: &str, script: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("examples.txt"), examples).unwrap();
    fs::write(
        dir.path().join("bench.yaml"),
        format!("command:\n  program: sh\n  args: [\"-c\", {script:?}]\n"),
    )
    .unwrap();
    dir
}

fn single_result_file(dir: &Path) -> String {
    let mut entries = fs::read_dir(dir.join("results"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect::<Vec<_>>();
    assert_eq!(entries.len(), 1);
    let path = entries.pop().unwrap();
    assert_eq!(path.extension().unwrap(), "result");
    fs::read_to_string(path).unwrap()
}

#[test]
fn plot_default_is_histogram_of_all_groups() {
    let dir = workspace(RESULTS);
    frame_bench(dir.path())
        .args(["plot", "run.result"])
        .assert()
        .success()
        .stdout(predicate::str::contains("run-histogram.svg"));

    assert!(dir.path().join("plots/run-histogram.svg").exists());
    let data = fs::read_to_string(dir.path().join("plots/plot_data/run-histogram.json")).unwrap();
    assert!(data.contains("\"kind\":\"histogram\""));
}

#[test]
fn plot_single_group_box() {
    let dir = workspace(RESULTS);
    frame_bench(dir.path())
        .args(["plot", "run.result", "box", "0", "-o", "out/cube.svg"])
        .assert()
        .success();

    assert!(dir.path().join("out/cube.svg").exists());
    let data = fs::read_to_string(dir.path().join("out/plot_data/cube.json")).unwrap();
    assert!(data.contains("[16000000,16500000,17000000]"));
}

#[test]
fn plot_aggregate_sentinel() {
    let dir = workspace(RESULTS);
    frame_bench(dir.path())
        .args(["plot", "run.result", "scatter", "-1"])
        .assert()
        .success();
    assert!(dir.path().join("plots/run-scatter.svg").exists());
}

#[test]
fn invalid_chart_kind_prints_hint() {
    let dir = workspace(RESULTS);
    frame_bench(dir.path())
        .args(["plot", "run.result", "pie"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "For the 2nd argument, select box, scatter, line, or hist",
        ));
    assert!(!dir.path().join("plots").exists());
}

#[test]
fn missing_arguments_print_usage() {
    let dir = tempfile::tempdir().unwrap();
    frame_bench(dir.path())
        .arg("plot")
        .assert()
        .success()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn non_integer_sample_is_fatal() {
    let dir = workspace("---cube---\n1\nabc\n");
    frame_bench(dir.path())
        .args(["plot", "run.result", "box"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3: invalid sample \"abc\""));
}

#[test]
fn missing_results_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    frame_bench(dir.path())
        .args(["plot", "nope.result"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Open results file"));
}

#[test]
fn line_needs_group_index() {
    let dir = workspace(RESULTS);
    frame_bench(dir.path())
        .args(["plot", "run.result", "line"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Line charts need a group index"));
}

#[test]
fn summary_lists_groups() {
    let dir = workspace(RESULTS);
    frame_bench(dir.path())
        .args(["summary", "run.result"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cube").and(predicate::str::contains("shadow")));

    let output = frame_bench(dir.path())
        .args(["summary", "run.result", "--json"])
        .output()
        .unwrap();
    let summaries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summaries[0]["name"], "cube");
    assert_eq!(summaries[0]["replicates"], 2);
    assert_eq!(summaries[1]["samples"], 2);
}

#[test]
fn bench_appends_sections() {
    let dir = bench_workspace("cube\n\nshadow\n", "echo {example}-{frames} >&2; echo; echo {frames}; echo 7");
    frame_bench(dir.path())
        .args(["bench", "2", "30", "-c", "bench.yaml", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing shadow (30 frames)"));

    assert_eq!(
        single_result_file(dir.path()),
        "---cube---\n30\n7\n---shadow---\n30\n7\n---cube---\n30\n7\n---shadow---\n30\n7\n"
    );
}

#[test]
fn bench_propagates_exit_code() {
    let dir = bench_workspace("cube\nshadow\n", "test {example} = cube && echo 1 || exit 3");
    frame_bench(dir.path())
        .args(["bench", "1", "10", "-c", "bench.yaml", "--no-progress"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("shadow returned code 3"));

    assert_eq!(single_result_file(dir.path()), "---cube---\n1\n");
}

#[test]
fn bench_rejects_negative_counts() {
    let dir = bench_workspace("cube\n", "echo 1");
    frame_bench(dir.path())
        .args(["bench", "-1", "10", "-c", "bench.yaml"])
        .assert()
        .success();
    assert!(!dir.path().join("results").exists());
}

#[test]
fn print_shows_commands() {
    let dir = bench_workspace("cube\nshadow\n", "run {example}");
    frame_bench(dir.path())
        .args(["print", "5", "-c", "bench.yaml"])
        .assert()
        .success()
        .stdout("sh -c run cube\nsh -c run shadow\n");
}

#[test]
fn ls_lists_result_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("results")).unwrap();
    fs::write(dir.path().join("results/2024-03-09-14-07.result"), RESULTS).unwrap();
    fs::write(dir.path().join("results/scratch.txt"), "").unwrap();
    frame_bench(dir.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-09-14-07.result -> 2 groups"))
        .stdout(predicate::str::contains("scratch").not());
}
