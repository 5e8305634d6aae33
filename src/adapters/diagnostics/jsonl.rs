//! JSON-lines diagnostics writer
//!
//! One `ZScoreObservation` per line, for plotting the z-score series and
//! thresholds outside the engine.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ports::diagnostics::{DiagnosticsError, DiagnosticsPort, ZScoreObservation};

pub struct JsonlDiagnostics<W: Write + Send> {
    writer: W,
    written: usize,
}

impl JsonlDiagnostics<BufWriter<File>> {
    /// Create (or truncate) a file, creating parent directories as needed
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, DiagnosticsError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonlDiagnostics<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> DiagnosticsPort for JsonlDiagnostics<W> {
    fn record(&mut self, observation: &ZScoreObservation) -> Result<(), DiagnosticsError> {
        serde_json::to_writer(&mut self.writer, observation)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DiagnosticsError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Decision;
    use chrono::{TimeZone, Utc};

    fn observation(z: f64) -> ZScoreObservation {
        ZScoreObservation {
            timestamp: Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap(),
            pair: "KO/PEP".to_string(),
            z_score: z,
            mean: 0.01,
            std_dev: 0.02,
            entry: 1.0,
            exit_low: -1.0,
            decision: Decision::ShortALongB { z_score: z },
            confidence: Decision::ShortALongB { z_score: z }.confidence(),
        }
    }

    #[test]
    fn test_writes_one_line_per_observation() {
        let mut sink = JsonlDiagnostics::new(Vec::new());
        sink.record(&observation(1.5)).unwrap();
        sink.record(&observation(-0.5)).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.written(), 2);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["pair"], "KO/PEP");
        assert_eq!(first["z_score"], 1.5);
        assert_eq!(first["decision"]["kind"], "short_a_long_b");
        assert_eq!(first["timestamp"], "2022-01-03T00:00:00Z");
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("zscores.jsonl");

        let mut sink = JsonlDiagnostics::create(&path).unwrap();
        sink.record(&observation(2.0)).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
