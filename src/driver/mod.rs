//! Batch driver: walks a corpus, runs one chunking pipeline per file, and
//! keeps one file's failure from touching the rest of the batch.
//!
//! Per-file state is fully independent, so workers share nothing but the
//! task queue. Output paths are partitioned by file (and split/language),
//! so concurrent writers never contend on a path.

use crate::align::Aligner;
use crate::audio::decoder::decode_audio;
use crate::audio::encoder::export_wav;
use crate::audio::silence::{strip_silence, SilenceConfig};
use crate::audio::slicer::slice_interval;
use crate::chunking::dataset::{assign_splits, plan_windows};
use crate::chunking::{chunk_fragments, ChunkPolicy};
use crate::types::{AudioData, Chunk, CorpusItem};
use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "flac", "ogg", "m4a"];

/// What happened to one corpus item.
#[derive(Debug)]
pub enum ItemOutcome {
    Completed { prefix: String, chunks_written: usize },
    Skipped { prefix: String, reason: String },
    Failed { prefix: String, error: String },
}

/// Aggregate of one batch run, in discovery order.
#[derive(Debug)]
pub struct BatchSummary {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Completed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    pub fn chunks_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                ItemOutcome::Completed { chunks_written, .. } => *chunks_written,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

/// Worker count when the caller does not pin one.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Run `work` over `items` on a bounded worker pool. Results come back in
/// input order; a panicking worker poisons only its own item.
pub fn run_pool<T, F>(items: Vec<T>, jobs: usize, work: F) -> Vec<ItemOutcome>
where
    T: Send,
    F: Fn(&T) -> ItemOutcome + Sync,
{
    let jobs = jobs.max(1).min(items.len().max(1));
    let (task_tx, task_rx) = unbounded::<(usize, T)>();
    let (result_tx, result_rx) = unbounded::<(usize, ItemOutcome)>();

    let total = items.len();
    for indexed in items.into_iter().enumerate() {
        task_tx.send(indexed).expect("task queue open");
    }
    drop(task_tx);

    std::thread::scope(|scope| {
        for _ in 0..jobs {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let work = &work;
            scope.spawn(move || {
                while let Ok((index, item)) = task_rx.recv() {
                    let outcome = work(&item);
                    if result_tx.send((index, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut collected: Vec<(usize, ItemOutcome)> = result_rx.iter().collect();
    collected.sort_by_key(|(index, _)| *index);
    debug_assert_eq!(collected.len(), total);
    collected.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Find the audio files under `audio_dir` and pair each with its transcript
/// when a transcript tree is given. Discovery is recomputed every run.
pub fn discover_corpus(
    audio_dir: &Path,
    transcript_dir: Option<&Path>,
    language: &str,
) -> Result<Vec<CorpusItem>> {
    let mut items = Vec::new();
    let entries = fs::read_dir(audio_dir)
        .with_context(|| format!("Failed to read audio directory {}", audio_dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if !is_audio_file(&path) {
            continue;
        }
        let transcript_path = transcript_dir.and_then(|dir| {
            let stem = path.file_stem()?;
            let candidate = dir.join(stem).with_extension("txt");
            candidate.exists().then_some(candidate)
        });
        items.push(CorpusItem {
            audio_path: path,
            transcript_path,
            language: language.to_string(),
        });
    }

    items.sort_by(|a, b| a.audio_path.cmp(&b.audio_path));
    Ok(items)
}

fn is_audio_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                AUDIO_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
}

/// Write one chunk as a `<prefix>_chunk_NNN` WAV/text pair in the two
/// mirrored output trees.
pub fn write_chunk_pair(
    audio: &AudioData,
    chunk: &Chunk,
    prefix: &str,
    audio_out: &Path,
    text_out: &Path,
) -> Result<()> {
    let name = format!("{}_chunk_{:03}", prefix, chunk.index);
    let clip = slice_interval(audio, chunk.interval);
    export_wav(&clip, audio_out.join(format!("{}.wav", name)))?;
    fs::write(text_out.join(format!("{}.txt", name)), &chunk.text)
        .with_context(|| format!("Failed to write chunk text {}", name))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Transcript-synchronized chunking (forced alignment)
// ---------------------------------------------------------------------------

/// Configuration for one `align` batch run.
pub struct AlignJob {
    pub audio_dir: PathBuf,
    pub transcript_dir: PathBuf,
    pub audio_out: PathBuf,
    pub text_out: PathBuf,
    pub language: String,
    pub policy: ChunkPolicy,
    /// When set, audio is silence-stripped before alignment and chunking.
    pub clean_silence: Option<SilenceConfig>,
    pub jobs: usize,
}

pub fn run_align<A: Aligner + Sync>(job: &AlignJob, aligner: &A) -> Result<BatchSummary> {
    fs::create_dir_all(&job.audio_out)?;
    fs::create_dir_all(&job.text_out)?;

    let items = discover_corpus(&job.audio_dir, Some(&job.transcript_dir), &job.language)?;
    info!(files = items.len(), "discovered corpus");

    let outcomes = run_pool(items, job.jobs, |item| align_one(job, aligner, item));
    Ok(BatchSummary { outcomes })
}

fn align_one<A: Aligner>(job: &AlignJob, aligner: &A, item: &CorpusItem) -> ItemOutcome {
    let prefix = item.prefix();

    if item.transcript_path.is_none() {
        warn!(file = %prefix, "transcript not found; skipping");
        return ItemOutcome::Skipped {
            prefix,
            reason: "transcript not found".to_string(),
        };
    }
    if let Some(reason) = resume_reason(&job.text_out, &prefix) {
        return ItemOutcome::Skipped { prefix, reason };
    }

    match chunk_aligned_file(job, aligner, item) {
        Ok(chunks_written) => ItemOutcome::Completed {
            prefix,
            chunks_written,
        },
        Err(error) => {
            warn!(file = %prefix, error = %format!("{error:#}"), "file failed; continuing batch");
            ItemOutcome::Failed {
                prefix,
                error: format!("{error:#}"),
            }
        }
    }
}

fn chunk_aligned_file<A: Aligner>(job: &AlignJob, aligner: &A, item: &CorpusItem) -> Result<usize> {
    let prefix = item.prefix();
    let transcript = item
        .transcript_path
        .as_deref()
        .context("transcript path missing")?;

    let decoded = decode_audio(&item.audio_path)?;

    // Silence stripping changes the timeline, so the aligner must see the
    // cleaned waveform, not the original file
    let (audio, cleaned_path) = match &job.clean_silence {
        Some(config) => {
            let cleaned = strip_silence(&decoded, config)
                .with_context(|| format!("Silence cleaning failed for {}", prefix))?;
            let path = std::env::temp_dir().join(format!(
                "corpuscut_clean_{}_{}.wav",
                std::process::id(),
                prefix
            ));
            export_wav(&cleaned, &path)?;
            (cleaned, Some(path))
        }
        None => (decoded, None),
    };

    let align_input = cleaned_path.as_deref().unwrap_or(&item.audio_path);
    let aligned = aligner.align(align_input, transcript, &item.language);
    if let Some(path) = &cleaned_path {
        let _ = fs::remove_file(path);
    }
    let fragments = aligned?;

    let chunks = chunk_fragments(job.policy, &fragments, Some(audio.duration_ms()));
    if chunks.is_empty() {
        warn!(file = %prefix, "alignment produced no chunks");
        return Ok(0);
    }

    for chunk in &chunks {
        write_chunk_pair(&audio, chunk, &prefix, &job.audio_out, &job.text_out)?;
    }
    Ok(chunks.len())
}

/// Resume marker: the first text file a run would write. Present means the
/// file was chunked by an earlier run and is skipped untouched.
fn resume_reason(text_out: &Path, prefix: &str) -> Option<String> {
    let marker = text_out.join(format!("{}_chunk_001.txt", prefix));
    marker
        .exists()
        .then(|| "already chunked".to_string())
}

// ---------------------------------------------------------------------------
// Fixed-window dataset chunking (no transcript)
// ---------------------------------------------------------------------------

/// Configuration for one `dataset` batch run.
pub struct DatasetJob {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Must be `ChunkPolicy::FixedDuration`; dataset mode has no transcript
    /// to drive any other policy.
    pub policy: ChunkPolicy,
    pub train_ratio: f64,
    /// Process a single language folder; `None` walks them all.
    pub language_folder: Option<String>,
    pub jobs: usize,
}

pub fn run_dataset(job: &DatasetJob) -> Result<BatchSummary> {
    let items = discover_dataset_corpus(job)?;
    info!(files = items.len(), "discovered corpus");

    let outcomes = run_pool(items, job.jobs, |item| dataset_one(job, item));
    Ok(BatchSummary { outcomes })
}

fn discover_dataset_corpus(job: &DatasetJob) -> Result<Vec<CorpusItem>> {
    let mut items = Vec::new();

    let folders: Vec<PathBuf> = match &job.language_folder {
        Some(folder) => vec![job.input_root.join(folder)],
        None => {
            let mut dirs = Vec::new();
            for entry in fs::read_dir(&job.input_root).with_context(|| {
                format!("Failed to read input root {}", job.input_root.display())
            })? {
                let path = entry?.path();
                if path.is_dir() {
                    dirs.push(path);
                }
            }
            dirs.sort();
            dirs
        }
    };

    for folder in folders {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(code) = crate::config::language_code(&name) else {
            warn!(folder = %name, "unknown language folder; skipping");
            continue;
        };
        let mut in_folder = discover_corpus(&folder, None, code)?;
        items.append(&mut in_folder);
    }

    Ok(items)
}

fn dataset_one(job: &DatasetJob, item: &CorpusItem) -> ItemOutcome {
    let prefix = item.prefix();
    match window_file(job, item) {
        Ok(chunks_written) => ItemOutcome::Completed {
            prefix,
            chunks_written,
        },
        Err(error) => {
            warn!(file = %prefix, error = %format!("{error:#}"), "file failed; continuing batch");
            ItemOutcome::Failed {
                prefix,
                error: format!("{error:#}"),
            }
        }
    }
}

fn window_file(job: &DatasetJob, item: &CorpusItem) -> Result<usize> {
    let ChunkPolicy::FixedDuration { window_ms } = job.policy else {
        anyhow::bail!("dataset mode requires the fixed-duration policy");
    };
    let audio = decode_audio(&item.audio_path)?;
    let mut rng = rand::thread_rng();

    let mut windows = plan_windows(audio.duration_ms(), window_ms, &mut rng);
    if windows.is_empty() {
        warn!(file = %item.prefix(), "audio shorter than one sample; nothing to write");
        return Ok(0);
    }
    assign_splits(&mut windows, job.train_ratio, &mut rng);

    for window in &windows {
        let dir = job
            .output_root
            .join(window.split.dir_name())
            .join(&item.language);
        fs::create_dir_all(&dir)?;
        let clip = slice_interval(&audio, window.interval);
        export_wav(&clip, dir.join(window.file_name("wav")))?;
    }
    Ok(windows.len())
}

// ---------------------------------------------------------------------------
// Recognition-driven modes (require the whisper feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "whisper")]
pub use recognition::{run_recognize, run_transcribe, RecognizeJob, RecognizePolicy, TranscribeJob};

#[cfg(feature = "whisper")]
mod recognition {
    use super::*;
    use crate::chunking::segments::{chunk_per_segment, rebucket_transcript_words};
    use crate::recognize::{transcript_text, Recognizer};
    use crate::storage::{FsStore, ObjectStore};

    /// How recognizer output becomes chunks.
    #[derive(Debug, Clone, Copy)]
    pub enum RecognizePolicy {
        /// One chunk per recognizer segment.
        PerSegment,
        /// Bucket the reference transcript's words and time buckets from
        /// segment boundaries.
        Rebucket { words_per_chunk: usize },
    }

    /// Configuration for one `recognize` batch run.
    pub struct RecognizeJob {
        pub audio_dir: PathBuf,
        /// Required by the rebucket policy, ignored by per-segment.
        pub transcript_dir: Option<PathBuf>,
        pub audio_out: PathBuf,
        pub text_out: PathBuf,
        pub policy: RecognizePolicy,
    }

    /// Runs sequentially: the recognizer holds a single model context.
    pub fn run_recognize<R: Recognizer>(job: &RecognizeJob, recognizer: &R) -> Result<BatchSummary> {
        fs::create_dir_all(&job.audio_out)?;
        fs::create_dir_all(&job.text_out)?;

        let items = discover_corpus(&job.audio_dir, job.transcript_dir.as_deref(), "")?;
        info!(files = items.len(), "discovered corpus");

        let outcomes = items
            .iter()
            .map(|item| recognize_one(job, recognizer, item))
            .collect();
        Ok(BatchSummary { outcomes })
    }

    fn recognize_one<R: Recognizer>(
        job: &RecognizeJob,
        recognizer: &R,
        item: &CorpusItem,
    ) -> ItemOutcome {
        let prefix = item.prefix();

        if matches!(job.policy, RecognizePolicy::Rebucket { .. }) && item.transcript_path.is_none()
        {
            warn!(file = %prefix, "transcript not found; skipping");
            return ItemOutcome::Skipped {
                prefix,
                reason: "transcript not found".to_string(),
            };
        }
        if let Some(reason) = resume_reason(&job.text_out, &prefix) {
            return ItemOutcome::Skipped { prefix, reason };
        }

        match chunk_recognized_file(job, recognizer, item) {
            Ok(chunks_written) => ItemOutcome::Completed {
                prefix,
                chunks_written,
            },
            Err(error) => {
                warn!(file = %prefix, error = %format!("{error:#}"), "file failed; continuing batch");
                ItemOutcome::Failed {
                    prefix,
                    error: format!("{error:#}"),
                }
            }
        }
    }

    fn chunk_recognized_file<R: Recognizer>(
        job: &RecognizeJob,
        recognizer: &R,
        item: &CorpusItem,
    ) -> Result<usize> {
        let prefix = item.prefix();
        let audio = decode_audio(&item.audio_path)?;
        let segments = recognizer.recognize(&audio)?;

        let chunks = match job.policy {
            RecognizePolicy::PerSegment => chunk_per_segment(&segments),
            RecognizePolicy::Rebucket { words_per_chunk } => {
                let transcript_path = item
                    .transcript_path
                    .as_deref()
                    .context("transcript path missing")?;
                let transcript = fs::read_to_string(transcript_path).with_context(|| {
                    format!("Failed to read transcript {}", transcript_path.display())
                })?;
                rebucket_transcript_words(&transcript, &segments, words_per_chunk)
            }
        };

        if chunks.is_empty() {
            warn!(file = %prefix, "recognition produced no chunks");
            return Ok(0);
        }
        for chunk in &chunks {
            write_chunk_pair(&audio, chunk, &prefix, &job.audio_out, &job.text_out)?;
        }
        Ok(chunks.len())
    }

    /// Configuration for one `transcribe` batch run: pull audio objects from
    /// a store prefix and write one flat transcript per object.
    pub struct TranscribeJob {
        pub store_root: PathBuf,
        pub prefix: String,
        pub out_dir: PathBuf,
    }

    /// Runs sequentially, like `run_recognize`.
    pub fn run_transcribe<R: Recognizer>(
        job: &TranscribeJob,
        recognizer: &R,
    ) -> Result<BatchSummary> {
        let store = FsStore::new(&job.store_root);
        let keys: Vec<String> = store
            .list(&job.prefix)?
            .into_iter()
            .filter(|key| has_audio_extension(key))
            .collect();
        info!(objects = keys.len(), "listed store prefix");

        let outcomes = keys
            .iter()
            .map(|key| transcribe_one(job, &store, recognizer, key))
            .collect();
        Ok(BatchSummary { outcomes })
    }

    fn has_audio_extension(key: &str) -> bool {
        Path::new(key)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                AUDIO_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }

    fn transcribe_one<R: Recognizer>(
        job: &TranscribeJob,
        store: &FsStore,
        recognizer: &R,
        key: &str,
    ) -> ItemOutcome {
        let prefix = key.to_string();

        let relative = Path::new(key).with_extension("txt");
        let out_path = job.out_dir.join(&relative);
        if out_path.exists() {
            return ItemOutcome::Skipped {
                prefix,
                reason: "transcript already exists".to_string(),
            };
        }

        match fetch_and_transcribe(store, recognizer, key, &out_path) {
            Ok(()) => ItemOutcome::Completed {
                prefix,
                chunks_written: 1,
            },
            Err(error) => {
                warn!(object = %key, error = %format!("{error:#}"), "object failed; continuing batch");
                ItemOutcome::Failed {
                    prefix,
                    error: format!("{error:#}"),
                }
            }
        }
    }

    fn fetch_and_transcribe<R: Recognizer>(
        store: &FsStore,
        recognizer: &R,
        key: &str,
        out_path: &Path,
    ) -> Result<()> {
        let file_name = Path::new(key)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "object".to_string());
        let local = std::env::temp_dir().join(format!(
            "corpuscut_fetch_{}_{}",
            std::process::id(),
            file_name
        ));

        let result: Result<()> = (|| {
            store.download(key, &local)?;
            let audio = decode_audio(&local)?;
            let segments = recognizer.recognize(&audio)?;
            let transcript = transcript_text(&segments);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(out_path, transcript)
                .with_context(|| format!("Failed to write transcript {}", out_path.display()))?;
            Ok(())
        })();

        // Partial temp artifacts never outlive the item
        let _ = fs::remove_file(&local);
        result
    }
}
