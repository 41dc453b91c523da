//! JSON-lines results and screenshot files

use crate::model::{ProcessingResult, ScrapeTarget};
use crate::output::OutputResult;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One line of the results file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord<'a> {
    pub target_id: &'a str,
    pub target_name: &'a str,
    #[serde(flatten)]
    pub result: &'a ProcessingResult,
}

/// Writes one JSON object per line, in input order
///
/// # Arguments
///
/// * `outcomes` - Targets paired with their terminal results
/// * `output_path` - File to create or truncate
pub fn write_results(
    outcomes: &[(ScrapeTarget, ProcessingResult)],
    output_path: &Path,
) -> OutputResult<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(output_path)?);
    for (target, result) in outcomes {
        let record = ResultRecord {
            target_id: &target.id,
            target_name: &target.name,
            result,
        };
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Ok(())
}

/// File name for a target's screenshot: the id with unsafe characters replaced
pub fn screenshot_file_name(target_id: &str) -> String {
    let safe: String = target_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.png", safe)
}

/// Saves every captured screenshot into `dir`
///
/// # Returns
///
/// Paths of the files written
pub fn write_screenshots(
    outcomes: &[(ScrapeTarget, ProcessingResult)],
    dir: &Path,
) -> OutputResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    for (target, result) in outcomes {
        let Some(png) = &result.screenshot else {
            continue;
        };
        if written.is_empty() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(screenshot_file_name(&target.id));
        fs::write(&path, png)?;
        written.push(path);
    }

    Ok(written)
}
