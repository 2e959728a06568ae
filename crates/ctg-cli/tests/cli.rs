use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const HEADER: &str =
    ",Contingency Events,Resulting Issue,Limit,Contingency Value (MVA),Percent Loading";

fn write_sheet(dir: &Path, name: &str, blocks: &[(&str, &[&str])]) {
    let mut text = String::from("\n");
    for (title, rows) in blocks {
        text.push_str(&format!(",{title}\n{HEADER}\n"));
        for row in *rows {
            text.push_str(row);
            text.push('\n');
        }
        text.push('\n');
    }
    fs::write(dir.join(format!("{name}.csv")), text).unwrap();
}

/// A CSV-directory workbook with two scenario sheets and one unrelated sheet.
fn workbook() -> (TempDir, PathBuf) {
    let tmp = tempdir().unwrap();
    let book = tmp.path().join("study");
    fs::create_dir(&book).unwrap();
    write_sheet(
        &book,
        "Base",
        &[
            (
                "ACCA LongTerm",
                &[",Line A-B,Xfmr 7,400,340,85", ",Line C-D,Bus 2,200,150,75"],
            ),
            ("DCwAC", &[",Line J-K,Line 3,250,240,96"]),
        ],
    );
    write_sheet(
        &book,
        "Future",
        &[(
            "ACCA LongTerm",
            &[
                ",Line A-B,Xfmr 7,400,370,92.5",
                ",Line G-H,Xfmr 7,400,360,90",
                ",Line C-D,Bus 2,200,170,85",
            ],
        )],
    );
    fs::write(book.join("Notes.csv"), "meeting notes\n").unwrap();
    (tmp, book)
}

fn ctg(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ctg").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn run_manifests(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("run-")
        })
        .collect()
}

#[test]
fn sheets_lists_scenario_sheets_only() {
    let (tmp, book) = workbook();
    ctg(tmp.path())
        .args(["sheets", book.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Base"))
        .stdout(predicate::str::contains("Future"))
        .stdout(predicate::str::contains("Notes").not());
}

#[test]
fn compare_prints_grouped_report() {
    let (tmp, book) = workbook();
    ctg(tmp.path())
        .args([
            "compare",
            book.to_str().unwrap(),
            "--left",
            "Base",
            "--right",
            "Future",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("== ACCA LongTerm =="))
        .stdout(predicate::str::contains("7.50"))
        .stdout(predicate::str::contains("Only in right"))
        .stdout(predicate::str::contains("== DCwAC =="));
}

#[test]
fn compare_json_output_keeps_outline_and_records_run() {
    let (tmp, book) = workbook();
    let out = tmp.path().join("reports").join("pair.json");
    ctg(tmp.path())
        .args([
            "compare",
            book.to_str().unwrap(),
            "--left",
            "Base",
            "--right",
            "Future",
            "--case-type",
            "acca-longterm",
            "--format",
            "json",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let sheet = &report["sheets"][0];
    assert_eq!(sheet["name"], "Base vs Future");
    let rows = sheet["rows"].as_array().unwrap();
    assert!(rows.iter().any(|row| row["collapsible"] == true));
    assert!(rows.iter().any(|row| row["hidden"] == true));
    assert!(!rows
        .iter()
        .any(|row| row["cells"][0] == "Line J-K"));

    let manifests = run_manifests(&tmp.path().join("reports"));
    assert_eq!(manifests.len(), 1);
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifests[0]).unwrap()).unwrap();
    assert_eq!(manifest["command"], "compare");
    assert_eq!(manifest["status"], "success");
}

#[test]
fn compare_unknown_sheet_fails() {
    let (tmp, book) = workbook();
    ctg(tmp.path())
        .args([
            "compare",
            book.to_str().unwrap(),
            "--left",
            "Base",
            "--right",
            "Past",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Past' not found"));
}

#[test]
fn config_threshold_applies_and_flag_wins() {
    let (tmp, book) = workbook();
    fs::write(tmp.path().join("ctg.toml"), "[compare]\nthreshold = 95\n").unwrap();
    let args = [
        "compare",
        book.to_str().unwrap(),
        "--left",
        "Base",
        "--right",
        "Future",
    ];
    ctg(tmp.path())
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("Line J-K"))
        .stdout(predicate::str::contains("Line A-B").not());
    ctg(tmp.path())
        .args(args)
        .args(["--threshold", "80"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Line A-B"));
}

#[test]
fn straight_uses_every_scenario_sheet() {
    let (tmp, book) = workbook();
    let out = tmp.path().join("straight.csv");
    ctg(tmp.path())
        .args([
            "straight",
            book.to_str().unwrap(),
            "--flat",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("Contingency Events,Resulting Issue,Limit,Base,Future"));
    assert!(text.contains("Line G-H,Xfmr 7,400,,90"));
}

#[test]
fn trends_json_follows_issue_peaks() {
    let (tmp, book) = workbook();
    let assert = ctg(tmp.path())
        .args([
            "trends",
            book.to_str().unwrap(),
            "--case-type",
            "acca-longterm",
            "--min-percent",
            "80",
            "--json",
        ])
        .assert()
        .success();
    let report: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let issues = report["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0]["issue_key"], "XFMR 7");
    assert_eq!(issues[0]["per_sheet"][1]["percent"], 92.5);
}

#[test]
fn filter_writes_filtered_copy() {
    let tmp = tempdir().unwrap();
    let raw = tmp.path().join("case_ViolationCTG.csv");
    fs::write(
        &raw,
        "ViolationCTG\nCTGLabel,LimViolCat,LimViolID,LimViolPct,BusNum:1\nLine A-B,Branch MVA,I1,95,10\nLine A-B,Bus Low Volts,B3,91,11\nLine C-D,Branch MVA,I1,97,12\n",
    )
    .unwrap();
    ctg(tmp.path())
        .args(["filter", raw.to_str().unwrap(), "--dedup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 -> 1 rows"));

    let filtered = fs::read_to_string(tmp.path().join("case_ViolationCTG_Filtered.csv")).unwrap();
    assert_eq!(
        filtered,
        "CTGLabel,LimViolCat,LimViolID,LimViolPct\nLine C-D,Branch MVA,I1,97\n"
    );
    assert_eq!(run_manifests(tmp.path()).len(), 1);
}

#[test]
fn process_reports_missing_exports() {
    let tmp = tempdir().unwrap();
    let cases = tmp.path().join("cases");
    fs::create_dir(&cases).unwrap();
    fs::write(cases.join("S_ACCA_LongTerm.pwb"), "").unwrap();
    fs::write(
        cases.join("S_ACCA_LongTerm_ViolationCTG.csv"),
        "ViolationCTG\nCTGLabel,LimViolCat,LimViolID,LimViolPct\nLine A-B,Branch MVA,I1,95\n",
    )
    .unwrap();
    fs::write(cases.join("S_DCwACver_P1-7.pwb"), "").unwrap();

    ctg(tmp.path())
        .args(["process", cases.to_str().unwrap(), "--threads", "2"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ACCA_LongTerm"))
        .stderr(predicate::str::contains("1 of 2 cases failed"));
    assert!(cases.join("S_ACCA_LongTerm_ViolationCTG_Filtered.csv").exists());
}

#[test]
fn batch_runs_plan() {
    let (tmp, book) = workbook();
    let plan = tmp.path().join("plan.yaml");
    fs::write(
        &plan,
        "workbook: study\npairs:\n  - { left: Base, right: Future }\nstraight:\n  enabled: true\n",
    )
    .unwrap();
    let out = tmp.path().join("batch-out");
    ctg(tmp.path())
        .args([
            "batch",
            "--plan",
            plan.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--threads",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch 2 -> 2/0 ok/fail"));
    assert!(book.is_dir());
    assert!(out.join("batch_manifest.json").exists());
    assert!(out.join("Base vs Future.csv").exists());
    assert!(out.join("Straight Comparison.csv").exists());
    assert_eq!(run_manifests(&out).len(), 1);
}

#[test]
fn batch_rejects_unknown_sheets() {
    let (tmp, book) = workbook();
    let plan = tmp.path().join("plan.json");
    fs::write(&plan, r#"{"pairs": [{"left": "Base", "right": "Past"}]}"#).unwrap();
    ctg(tmp.path())
        .args([
            "batch",
            "--plan",
            plan.to_str().unwrap(),
            "--workbook",
            book.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Past' not found"));
}

#[test]
fn completions_are_generated() {
    let tmp = tempdir().unwrap();
    ctg(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ctg"));
}
