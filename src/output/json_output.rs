//! JSON file sink: live JSONL stream plus final assembled document

use crate::output::traits::{CollectionResult, OutputResult, RecordSink};
use crate::record::BusinessRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Streams accepted records to `{category}_in_{area}.jsonl` as they arrive
/// and writes `{category}_in_{area}.json` at finalization.
///
/// The JSONL file opens in append mode so a resumed run continues the
/// stream instead of truncating it.
pub struct JsonOutput {
    jsonl: Mutex<BufWriter<File>>,
    jsonl_path: PathBuf,
    json_path: PathBuf,
}

impl JsonOutput {
    pub fn create(dir: &Path, area: &str, category: &str) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let stem = format!("{}_in_{}", safe_name(category), safe_name(area));
        let jsonl_path = dir.join(format!("{stem}.jsonl"));
        let json_path = dir.join(format!("{stem}.json"));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&jsonl_path)?;

        Ok(Self {
            jsonl: Mutex::new(BufWriter::new(file)),
            jsonl_path,
            json_path,
        })
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    pub fn jsonl_path(&self) -> &Path {
        &self.jsonl_path
    }
}

impl RecordSink for JsonOutput {
    fn record(&self, record: &BusinessRecord) -> OutputResult<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.jsonl.lock().unwrap();
        writeln!(writer, "{line}")?;
        // Flush per record: the stream exists to survive a crash
        writer.flush()?;
        Ok(())
    }

    fn finish(&self, result: &CollectionResult) -> OutputResult<()> {
        let payload = serde_json::to_vec_pretty(result)?;
        std::fs::write(&self.json_path, payload)?;
        tracing::info!("Result written to {}", self.json_path.display());
        Ok(())
    }
}

/// Lowercased, underscore-joined form of an area or category name; area
/// names keep only their first comma segment ("Springfield, USA" →
/// "springfield")
fn safe_name(name: &str) -> String {
    name.split(',')
        .next()
        .unwrap_or(name)
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{BoundaryBox, PartitionMode};
    use crate::output::stats::CollectionStatistics;
    use crate::output::traits::{EnrichmentMeta, RunMetadata};
    use tempfile::tempdir;

    fn sample_record(name: &str) -> BusinessRecord {
        BusinessRecord {
            name: name.to_string(),
            place_id: Some(format!("pid-{name}")),
            found_in: "area".to_string(),
            ..Default::default()
        }
    }

    fn sample_result(records: Vec<BusinessRecord>) -> CollectionResult {
        CollectionResult {
            metadata: RunMetadata {
                area: "Testville, USA".to_string(),
                category: "tax lawyers".to_string(),
                boundary: BoundaryBox::new("Testville", 1.0, 0.0, 1.0, 0.0),
                search_mode: PartitionMode::Grid,
                enrichment: EnrichmentMeta {
                    details_fetched: false,
                    reviews_fetched: false,
                    reviews_limit: 0,
                },
            },
            statistics: CollectionStatistics::default(),
            businesses: records,
        }
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("Springfield, USA"), "springfield");
        assert_eq!(safe_name("tax lawyers"), "tax_lawyers");
        assert_eq!(safe_name("  New York , USA"), "new_york");
    }

    #[test]
    fn test_streams_records_as_jsonl() {
        let dir = tempdir().unwrap();
        let output = JsonOutput::create(dir.path(), "Testville, USA", "tax lawyers").unwrap();

        output.record(&sample_record("A")).unwrap();
        output.record(&sample_record("B")).unwrap();

        let content = std::fs::read_to_string(output.jsonl_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"A\""));
        assert!(lines[1].contains("\"B\""));
    }

    #[test]
    fn test_append_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let output = JsonOutput::create(dir.path(), "a", "c").unwrap();
            output.record(&sample_record("first")).unwrap();
        }
        {
            let output = JsonOutput::create(dir.path(), "a", "c").unwrap();
            output.record(&sample_record("second")).unwrap();
        }

        let output = JsonOutput::create(dir.path(), "a", "c").unwrap();
        let content = std::fs::read_to_string(output.jsonl_path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_finish_writes_final_document() {
        let dir = tempdir().unwrap();
        let output = JsonOutput::create(dir.path(), "Testville, USA", "tax lawyers").unwrap();

        output
            .finish(&sample_result(vec![sample_record("A")]))
            .unwrap();

        let content = std::fs::read_to_string(output.json_path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["metadata"]["category"], "tax lawyers");
        assert_eq!(parsed["businesses"][0]["name"], "A");
        assert_eq!(parsed["metadata"]["search_mode"], "grid");
    }
}
