// src/export.rs
// =============================================================================
// Writes the output artifact once the scan is over.
//
// The files are created up front, before the first probe, so a bad output
// path aborts the run immediately instead of after hours of scanning.
//
// Formats:
// - csv:  header `id,title,url`, one row per discovered page
// - json: a pretty-printed array of {id, title, url}
//
// The optional failure log is a one-column csv (`id`) of the ids whose probe
// ended in a transport error.
// =============================================================================

use crate::aggregate::ScanReport;
use crate::config::OutputFormat;
use crate::error::ExportError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const RESULT_HEADER: [&str; 3] = ["id", "title", "url"];

#[derive(Debug)]
pub struct Exporter {
    output: Target,
    format: OutputFormat,
    failures: Option<Target>,
}

#[derive(Debug)]
struct Target {
    path: PathBuf,
    file: File,
}

impl Target {
    fn create(path: &Path) -> Result<Self, ExportError> {
        let file = File::create(path).map_err(|source| ExportError::Create {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl Exporter {
    pub fn create(
        output: &Path,
        format: OutputFormat,
        failures: Option<&Path>,
    ) -> Result<Self, ExportError> {
        Ok(Self {
            output: Target::create(output)?,
            format,
            failures: failures.map(Target::create).transpose()?,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output.path
    }

    pub fn write(self, report: &ScanReport) -> Result<(), ExportError> {
        let writer = BufWriter::new(self.output.file);
        match self.format {
            OutputFormat::Csv => write_csv(writer, report)?,
            OutputFormat::Json => write_json(writer, report)?,
        }

        if let Some(failures) = self.failures {
            write_failures(BufWriter::new(failures.file), &report.failed_ids)?;
        }
        Ok(())
    }
}

fn write_csv<W: Write>(writer: W, report: &ScanReport) -> Result<(), ExportError> {
    // Header written by hand so an empty result set still gets one
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(RESULT_HEADER)?;
    for result in &report.results {
        csv.serialize(result)?;
    }
    csv.flush()?;
    Ok(())
}

fn write_json<W: Write>(mut writer: W, report: &ScanReport) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, &report.results)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn write_failures<W: Write>(writer: W, ids: &[u64]) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["id"])?;
    for id in ids {
        csv.write_record([id.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeResult;

    fn report() -> ScanReport {
        ScanReport {
            checked: 4,
            found: 2,
            failed: 1,
            results: vec![
                ProbeResult {
                    id: 1,
                    title: "Valid Page".into(),
                    url: "https://pages.test/search/file/1".into(),
                },
                ProbeResult {
                    id: 4,
                    title: "广州市人民政府, 门户网站".into(),
                    url: "https://pages.test/search/file/4".into(),
                },
            ],
            failed_ids: vec![3],
        }
    }

    #[test]
    fn test_csv_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        Exporter::create(&path, OutputFormat::Csv, None)
            .unwrap()
            .write(&report())
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "id,title,url\n\
             1,Valid Page,https://pages.test/search/file/1\n\
             4,\"广州市人民政府, 门户网站\",https://pages.test/search/file/4\n"
        );
    }

    #[test]
    fn test_empty_csv_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let empty = ScanReport {
            checked: 10,
            found: 0,
            failed: 0,
            results: vec![],
            failed_ids: vec![],
        };
        Exporter::create(&path, OutputFormat::Csv, None)
            .unwrap()
            .write(&empty)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id,title,url\n");
    }

    #[test]
    fn test_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        Exporter::create(&path, OutputFormat::Json, None)
            .unwrap()
            .write(&report())
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<ProbeResult> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows, report().results);
    }

    #[test]
    fn test_failure_log() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        let failed = dir.path().join("failed.csv");
        Exporter::create(&out, OutputFormat::Csv, Some(&failed))
            .unwrap()
            .write(&report())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&failed).unwrap(), "id\n3\n");
    }

    #[test]
    fn test_unwritable_path_fails_at_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = Exporter::create(&path, OutputFormat::Csv, None).unwrap_err();
        assert!(matches!(err, ExportError::Create { .. }));
    }
}
