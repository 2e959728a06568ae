//! Raw violation export CSVs: reading, writing the filtered copy, and the
//! file naming conventions around them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use ctg_algo::RawTable;
use ctg_core::CtgError;

/// Suffix the export tool appends to a case file stem.
pub const EXPORT_SUFFIX: &str = "_ViolationCTG";
pub const FILTERED_SUFFIX: &str = "_Filtered";

/// All rows of a CSV file as strings; ragged rows are kept as-is.
pub fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.with_context(|| format!("parsing CSV row in {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Read an export: one descriptive row, the header on row 2, data after it.
pub fn read_raw_export(path: &Path) -> Result<RawTable> {
    let rows = read_csv_rows(path)?;
    let table = RawTable::from_export_rows(rows).ok_or_else(|| {
        CtgError::Parse(format!(
            "{} has no header row (expected a descriptive first row and headers on row 2)",
            path.display()
        ))
    })?;
    Ok(table)
}

/// Write a table with its header as the first row.
pub fn write_raw_table(path: &Path, table: &RawTable) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// `<dir>/<stem>_Filtered<.ext>` next to the export; `.csv` when it has no extension.
pub fn filtered_path(export: &Path) -> PathBuf {
    let stem = export
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = export
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    export.with_file_name(format!("{stem}{FILTERED_SUFFIX}.{ext}"))
}

/// Where the export tool writes the violation CSV for a case file.
pub fn export_path_for_case(case_file: &Path) -> PathBuf {
    let stem = case_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    case_file.with_file_name(format!("{stem}{EXPORT_SUFFIX}.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn filtered_path_keeps_extension() {
        assert_eq!(
            filtered_path(Path::new("/cases/Base_ViolationCTG.csv")),
            PathBuf::from("/cases/Base_ViolationCTG_Filtered.csv")
        );
        assert_eq!(
            filtered_path(Path::new("export")),
            PathBuf::from("export_Filtered.csv")
        );
    }

    #[test]
    fn export_path_sits_beside_case() {
        assert_eq!(
            export_path_for_case(Path::new("/cases/2030 ACCA_LongTerm.pwb")),
            PathBuf::from("/cases/2030 ACCA_LongTerm_ViolationCTG.csv")
        );
    }

    #[test]
    fn raw_export_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("case_ViolationCTG.csv");
        fs::write(
            &path,
            "ViolationCTG\nCTGLabel,LimViolID,LimViolPct\n\"Line A-B, ckt 1\",I1,95 %\n",
        )
        .unwrap();

        let table = read_raw_export(&path).unwrap();
        assert_eq!(table.headers, vec!["CTGLabel", "LimViolID", "LimViolPct"]);
        assert_eq!(table.rows[0][0], "Line A-B, ckt 1");

        let out = filtered_path(&path);
        write_raw_table(&out, &table).unwrap();
        let written = read_csv_rows(&out).unwrap();
        assert_eq!(written[0], table.headers);
        assert_eq!(written[1], table.rows[0]);
    }

    #[test]
    fn export_without_header_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "ViolationCTG\n").unwrap();
        assert!(read_raw_export(&path).is_err());
    }
}
