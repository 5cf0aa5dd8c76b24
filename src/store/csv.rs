use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::Result;
use crate::domain::ReviewRecord;
use crate::store::ReviewSink;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes reviews as `name,rating,date,text` rows.
///
/// Each write goes to a hidden sibling file that is then renamed over the
/// target, so readers never see a half-written file.
pub struct CsvSink {
    path: PathBuf,
    bom: bool,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, bom: bool) -> Self {
        Self {
            path: path.into(),
            bom,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "reviews.csv".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

impl ReviewSink for CsvSink {
    fn write(&self, records: &[ReviewRecord]) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        {
            let mut file = File::create(&temp)?;
            if self.bom {
                file.write_all(UTF8_BOM)?;
            }

            let mut writer = ::csv::Writer::from_writer(file);
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        fs::rename(&temp, &self.path)?;
        Ok(self.path.clone())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
