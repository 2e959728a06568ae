//! Parse → compare → present over realistic scenario sheets.

use ctg_algo::{
    build_trends, compare, compare_all, compare_pair, present, RawTable, RowFilterPipeline,
    FilterConfig, RowRole, ScenarioParser, ONLY_IN_LEFT, ONLY_IN_RIGHT,
};
use ctg_core::{CaseType, ScenarioTable, SheetGrid};

const HEADER: [&str; 6] = [
    "",
    "Contingency Events",
    "Resulting Issue",
    "Limit",
    "Contingency Value (MVA)",
    "Percent Loading",
];

fn sheet(blocks: &[(&str, &[[&str; 5]])]) -> SheetGrid {
    let mut rows: Vec<Vec<String>> = vec![Vec::new()];
    for (title, data) in blocks {
        rows.push(vec![String::new(), title.to_string()]);
        rows.push(HEADER.iter().map(|s| s.to_string()).collect());
        for row in *data {
            let mut cells = vec![String::new()];
            cells.extend(row.iter().map(|s| s.to_string()));
            rows.push(cells);
        }
        rows.push(Vec::new());
    }
    SheetGrid::from_text_rows(rows)
}

fn base_case() -> ScenarioTable {
    ScenarioParser::default().parse(
        "Base Case",
        &sheet(&[
            (
                "ACCA LongTerm",
                &[
                    ["Line A-B", "Xfmr 7", "400", "340", "85"],
                    ["Line C-D", "", "", "330", "82.5%"],
                    ["Line E-F", "Bus 12", "200", "150", "75"],
                ],
            ),
            ("ACCA", &[["Line A-B", "Line 9", "100", "91", "91"]]),
        ]),
    )
}

fn future_case() -> ScenarioTable {
    ScenarioParser::default().parse(
        "Future",
        &sheet(&[
            (
                "ACCA LongTerm",
                &[
                    ["Line A-B", "Xfmr 7", "400", "370", "92.5"],
                    ["Line G-H", "Xfmr 7", "400", "360", "90"],
                ],
            ),
            ("DCwAC", &[["Line J-K", "Line 3", "250", "260", "104"]]),
        ]),
    )
}

#[test]
fn pair_comparison_end_to_end() {
    let base = base_case();
    let future = future_case();
    let records = compare(&base, &future, CaseType::AccaLongTerm, 80.0);

    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.contingency.as_str(), r.delta_display.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Line A-B", "7.50"),
            ("Line G-H", ONLY_IN_RIGHT),
            ("Line C-D", ONLY_IN_LEFT),
        ]
    );
    assert_eq!(records[2].issue_id, "Xfmr 7");
    assert_eq!(records[2].limit, "400");
    assert!(compare(&base, &future, CaseType::AccaLongTerm, 95.0).is_empty());
}

#[test]
fn grouped_rows_put_summary_on_top() {
    let records = compare(&base_case(), &future_case(), CaseType::AccaLongTerm, 80.0);
    let rows = present(&records, CaseType::AccaLongTerm);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].role, RowRole::Summary);
    assert_eq!(rows[0].record.contingency, "Line A-B");
    assert!(rows[0].collapsible);
    assert!(rows[1..].iter().all(|r| r.role == RowRole::Detail && !r.visible));
}

#[test]
fn pair_covers_all_case_types() {
    let records = compare_pair(&base_case(), &future_case(), 80.0);
    let case_types: Vec<_> = records.iter().map(|r| r.case_type).collect();
    assert_eq!(
        case_types,
        vec![
            CaseType::AccaLongTerm,
            CaseType::AccaLongTerm,
            CaseType::AccaLongTerm,
            CaseType::Acca,
            CaseType::DcWac,
        ]
    );
}

#[test]
fn straight_comparison_includes_every_scenario() {
    let base = base_case();
    let future = future_case();
    let empty = ScenarioTable::empty("Retired");
    let records = compare_all(
        &[("Base Case", &base), ("Retired", &empty), ("Future", &future)],
        CaseType::AccaLongTerm,
        80.0,
    );
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.percents.len(), 3);
        assert_eq!(record.percents[1].percent, None);
    }
    assert_eq!(records[0].percent_for("Base Case"), Some(85.0));
    assert_eq!(records[0].percent_for("Future"), Some(92.5));
}

#[test]
fn trends_follow_issue_peaks() {
    let base = base_case();
    let future = future_case();
    let report = build_trends(&[&base, &future], CaseType::AccaLongTerm, 80.0);
    assert_eq!(report.issues.len(), 1);
    let peaks: Vec<_> = report.issues[0].per_sheet.iter().map(|p| p.percent).collect();
    assert_eq!(peaks, vec![Some(85.0), Some(92.5)]);
}

#[test]
fn filtered_export_feeds_comparison() {
    let raw = RawTable::from_export_rows(vec![
        vec!["ViolationCTG".to_string()],
        ["CTGLabel", "LimViolCat", "LimViolID", "LimViolLimit", "LimViolValue", "LimViolPct"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ["Line A-B", "Branch MVA", "I2", "400", "280", "70"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ["Line C-D", "Branch MVA", "I2", "400", "380", "95"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    ])
    .expect("header row present");
    let pipeline = RowFilterPipeline::new(FilterConfig {
        dedup_by_issue: true,
        ..FilterConfig::default()
    });
    let (filtered, report) = pipeline.apply(&raw);
    assert_eq!(report.rows_removed_by_dedup, 1);

    let table = filtered.to_scenario_table("Case", CaseType::Acca);
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0].percent, Some(95.0));
    assert_eq!(table.records()[0].value, Some(380.0));
}
