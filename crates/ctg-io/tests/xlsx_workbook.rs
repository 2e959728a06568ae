//! Read a real .xlsx workbook end to end.

use std::path::Path;

use ctg_algo::{compare, ScenarioParser};
use ctg_core::CaseType;
use ctg_io::{load_scenarios, open_workbook, scenario_sheet_names};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

fn write_fixture(path: &Path) {
    let mut workbook = Workbook::new();

    for (name, pct) in [("Base Case", 85.0), ("Future", 92.5)] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).unwrap();
        sheet.write_string(1, 1, "ACCA LongTerm").unwrap();
        let headers = [
            "Contingency Events",
            "Resulting Issue",
            "Limit",
            "Contingency Value (MVA)",
            "Percent Loading",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(2, col as u16 + 1, *header).unwrap();
        }
        sheet.write_string(3, 1, "Line A-B").unwrap();
        sheet.write_string(3, 2, "Xfmr 7").unwrap();
        sheet.write_number(3, 3, 400.0).unwrap();
        sheet.write_number(3, 4, pct * 4.0).unwrap();
        sheet.write_number(3, 5, pct).unwrap();
        // same issue, second contingency
        sheet.write_string(4, 1, "Line C-D").unwrap();
        sheet.write_number(4, 5, 81.0).unwrap();
    }

    let notes = workbook.add_worksheet();
    notes.set_name("Notes").unwrap();
    notes.write_string(0, 0, "Study assumptions").unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn xlsx_sheets_parse_and_compare() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("study.xlsx");
    write_fixture(&path);

    let parser = ScenarioParser::default();
    let mut source = open_workbook(&path).unwrap();
    assert_eq!(source.sheet_names(), vec!["Base Case", "Future", "Notes"]);
    assert_eq!(
        scenario_sheet_names(source.as_mut(), &parser).unwrap(),
        vec!["Base Case", "Future"]
    );

    let tables = load_scenarios(source.as_mut(), &parser, &[]).unwrap();
    assert_eq!(tables.len(), 2);
    let base = &tables[0];
    assert_eq!(base.len(), 2);
    assert_eq!(base.records()[1].issue_id, "Xfmr 7");
    assert_eq!(base.records()[1].percent, Some(81.0));

    let records = compare(&tables[0], &tables[1], CaseType::AccaLongTerm, 80.0);
    assert_eq!(records[0].delta_display, "7.50");
    assert_eq!(records[0].limit, "400");
}

#[test]
fn csv_directory_behaves_like_a_workbook() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("Base Case.csv"),
        ",DCwAC\n,Contingency Events,Resulting Issue,Contingency Value (MVA),Percent Loading\n,Line A-B,I1,120,85\n",
    )
    .unwrap();
    let parser = ScenarioParser::default();
    let mut source = open_workbook(dir.path()).unwrap();
    let tables = load_scenarios(source.as_mut(), &parser, &["Base Case".to_string()]).unwrap();
    assert_eq!(tables[0].for_case_type(CaseType::DcWac).count(), 1);
    assert!(load_scenarios(source.as_mut(), &parser, &["Missing".to_string()]).is_err());
}
