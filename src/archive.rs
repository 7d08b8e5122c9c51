//! Delivered bundle of one analysis run.
//!
//! A deflated zip holding every sink the run wrote plus one plain-text
//! report per bucket.

use crate::constants::sinks;
use crate::error::Result;
use crate::summary::Summary;

use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Zip the run's sinks and bucket reports into memory
pub fn build_archive(summary: &Summary) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for path in summary.written_sinks() {
            let Some(name) = path.file_name() else {
                continue;
            };
            zip.start_file(name.to_string_lossy(), options)?;
            let mut file = File::open(path)?;
            std::io::copy(&mut file, &mut zip)?;
            debug!("Archived {}", path.display());
        }

        for report in summary.buckets() {
            zip.start_file(report.file_name, options)?;
            zip.write_all(report.render().as_bytes())?;
        }

        zip.finish()?;
    }

    Ok(buffer.into_inner())
}

/// `analisis_<YYYYmmdd_HHMMSS>.zip`
pub fn archive_file_name(timestamp: DateTime<Local>) -> String {
    format!(
        "analisis_{}.zip",
        timestamp.format(sinks::ARCHIVE_TIMESTAMP_FORMAT)
    )
}

/// Build the bundle and write it under `output_dir`
pub fn write_archive(summary: &Summary, output_dir: &Path) -> Result<PathBuf> {
    let bytes = build_archive(summary)?;
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join(archive_file_name(Local::now()));
    std::fs::write(&path, &bytes)?;
    info!("Wrote archive {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
