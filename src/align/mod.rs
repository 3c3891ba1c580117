//! Forced-alignment fragment source.
//!
//! The aligner itself is an external tool with a narrow contract: it takes
//! an audio file, a plain-text transcript, and a language code, and returns
//! an ordered fragment list as JSON. This module owns invoking it and
//! parsing its output into [`Fragment`]s; everything downstream is
//! alignment-tool agnostic.

use crate::types::{Fragment, TimeInterval};
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Produces time-stamped transcript fragments for one audio file.
pub trait Aligner {
    fn align(&self, audio: &Path, transcript: &Path, language: &str) -> Result<Vec<Fragment>>;
}

/// Invokes `aeneas` as a subprocess, one task per file.
pub struct AeneasAligner {
    /// Interpreter used to launch the tool (usually `python` or `python3`).
    pub python: String,
}

impl Default for AeneasAligner {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
        }
    }
}

impl Aligner for AeneasAligner {
    fn align(&self, audio: &Path, transcript: &Path, language: &str) -> Result<Vec<Fragment>> {
        let output_json = std::env::temp_dir().join(format!(
            "aeneas_{}_{}.json",
            std::process::id(),
            audio
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "task".to_string())
        ));

        let task = format!(
            "task_language={}|is_text_type=plain|os_task_file_format=json",
            language
        );
        let status = Command::new(&self.python)
            .arg("-m")
            .arg("aeneas.tools.execute_task")
            .arg(audio)
            .arg(transcript)
            .arg(&task)
            .arg(&output_json)
            .status()
            .with_context(|| format!("Failed to launch {} for alignment", self.python))?;

        let result = if status.success() {
            std::fs::read_to_string(&output_json)
                .with_context(|| {
                    format!("Alignment produced no output at {}", output_json.display())
                })
                .and_then(|raw| parse_fragments(&raw))
        } else {
            Err(anyhow::anyhow!(
                "alignment tool exited with {} for {}",
                status,
                audio.display()
            ))
        };

        // Temp JSON is removed on success and failure alike
        let _ = std::fs::remove_file(&output_json);
        result
    }
}

/// Reads alignment JSON that already exists on disk, one `<stem>.json` per
/// audio file. Lets a corpus be re-chunked without re-running the tool.
pub struct PrecomputedAligner {
    pub dir: PathBuf,
}

impl Aligner for PrecomputedAligner {
    fn align(&self, audio: &Path, _transcript: &Path, _language: &str) -> Result<Vec<Fragment>> {
        let stem = audio
            .file_stem()
            .context("audio path has no file stem")?
            .to_string_lossy();
        let path = self.dir.join(format!("{}.json", stem));
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read alignment JSON {}", path.display()))?;
        parse_fragments(&raw)
    }
}

#[derive(Deserialize)]
struct AlignmentDoc {
    fragments: Vec<RawFragment>,
}

#[derive(Deserialize)]
struct RawFragment {
    begin: Seconds,
    end: Seconds,
    #[serde(default)]
    lines: Vec<String>,
}

/// aeneas emits timestamps as decimal strings; accept plain numbers too.
#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Text(String),
    Number(f64),
}

impl Seconds {
    fn to_ms(&self) -> Result<u64> {
        let secs = match self {
            Seconds::Number(value) => *value,
            Seconds::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("invalid timestamp '{}'", raw))?,
        };
        ensure!(secs.is_finite() && secs >= 0.0, "timestamp out of range");
        Ok((secs * 1000.0).round() as u64)
    }
}

/// Parse the tool's JSON output into ordered fragments. The first line of
/// each fragment is its text.
pub fn parse_fragments(raw: &str) -> Result<Vec<Fragment>> {
    let doc: AlignmentDoc =
        serde_json::from_str(raw).context("Failed to parse alignment JSON")?;

    doc.fragments
        .iter()
        .map(|fragment| {
            let begin = fragment.begin.to_ms()?;
            let end = fragment.end.to_ms()?;
            ensure!(
                end >= begin,
                "fragment interval ends before it starts ({} > {})",
                begin,
                end
            );
            let text = fragment
                .lines
                .first()
                .map(|line| line.trim().to_string())
                .unwrap_or_default();
            Ok(Fragment::new(TimeInterval::new(begin, end), text))
        })
        .collect()
}
