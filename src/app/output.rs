//! Live streams definition output
//!
//! Renders the validated stations as a `SiiNunit` unit holding one
//! `live_stream_def` block, and writes it atomically so a failed run never
//! leaves a truncated file behind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::models::ValidatedStation;
use crate::constants::{bitrate, output};
use crate::errors::{OutputError, OutputResult};

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the definition file is written
    pub path: PathBuf,
    /// Country code written into every entry
    pub country: String,
    /// Trailing flag field of every entry
    pub flag: String,
    /// Bitrate for stations whose bitrate could not be determined
    pub default_bitrate: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(output::DEFAULT_OUTPUT_FILE),
            country: output::COUNTRY_CODE.to_string(),
            flag: output::STREAM_FLAG.to_string(),
            default_bitrate: bitrate::DEFAULT_KBPS,
        }
    }
}

impl OutputConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("Output path cannot be empty".to_string());
        }
        if self.default_bitrate == 0 {
            return Err("Default bitrate cannot be zero".to_string());
        }
        if self.country.contains(['|', '"']) || self.flag.contains(['|', '"']) {
            return Err("Country and flag cannot contain '|' or '\"'".to_string());
        }
        Ok(())
    }
}

/// Render the definition file for `stations`, in the order given
pub fn render_live_streams(stations: &[ValidatedStation], options: &OutputConfig) -> String {
    let mut content = String::from("SiiNunit\n{\nlive_stream_def : .live_streams {\n");
    content.push_str(&format!(" stream_data: {}\n", stations.len()));

    for (index, station) in stations.iter().enumerate() {
        content.push_str(&format!(
            " stream_data[{}]: \"{}|{}|{}|{}|{}|{}\"\n",
            index,
            field(&station.stream_url),
            field(&station.display_name),
            field(&station.genre),
            options.country,
            station.bitrate_or(options.default_bitrate),
            options.flag
        ));
    }

    content.push_str("}\n\n}\n");
    content
}

/// Keep a value from breaking out of its quoted, pipe-delimited slot
fn field(value: &str) -> String {
    value.replace('"', "'").replace('|', "/")
}

/// Write `content` to `path` atomically
///
/// The content goes to a `.tmp` sibling first, which is then renamed over
/// the destination.
///
/// # Errors
///
/// Returns `OutputError` if the temporary file cannot be written or renamed
pub async fn write_live_streams(path: &Path, content: &str) -> OutputResult<()> {
    write_atomic(path, content.as_bytes()).await?;
    info!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Dump the stations as pretty JSON, atomically
///
/// # Errors
///
/// Returns `OutputError` on serialisation or I/O failure
pub async fn write_json(path: &Path, stations: &[ValidatedStation]) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(stations)?;
    write_atomic(path, json.as_bytes()).await?;
    info!("Wrote {} stations as JSON to {}", stations.len(), path.display());
    Ok(())
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| OutputError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(output::TEMP_FILE_SUFFIX);
    let temp_path = PathBuf::from(temp_name);

    tokio::fs::write(&temp_path, bytes)
        .await
        .map_err(|source| OutputError::Write {
            path: temp_path.clone(),
            source,
        })?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        tracing::warn!("Rename of {} failed: {}", temp_path.display(), e);
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(OutputError::AtomicOperationFailed {
            temp_path,
            final_path: path.to_path_buf(),
        });
    }
    Ok(())
}
