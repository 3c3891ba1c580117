use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use corpuscut::align::{AeneasAligner, PrecomputedAligner};
use corpuscut::audio::silence::SilenceConfig;
use corpuscut::chunking::ChunkPolicy;
use corpuscut::config::{DEFAULT_TRAIN_RATIO, DEFAULT_WINDOW_SECS, DEFAULT_WORDS_PER_CHUNK};
use corpuscut::driver::{self, AlignJob, BatchSummary, DatasetJob, ItemOutcome};

/// corpuscut - speech corpus chunking tool
///
/// Splits long recordings and their transcripts into short, time-aligned
/// audio/text chunk pairs ready for speech-model training.
#[derive(Parser, Debug)]
#[command(name = "corpuscut")]
#[command(version = "0.1.0")]
#[command(about = "Speech corpus chunking tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk audio by forced-aligned transcript fragments
    Align(AlignArgs),
    /// Chunk audio by speech-recognition segments
    #[cfg(feature = "whisper")]
    Recognize(RecognizeArgs),
    /// Split audio into fixed windows with a train/dev split
    Dataset(DatasetArgs),
    /// Pull audio from an object store and write flat transcripts
    #[cfg(feature = "whisper")]
    Transcribe(TranscribeArgs),
}

#[derive(Args, Debug)]
struct AlignArgs {
    /// Directory of source audio files
    #[arg(long, value_name = "DIR")]
    audio_dir: PathBuf,

    /// Directory of plain-text transcripts, one <stem>.txt per audio file
    #[arg(long, value_name = "DIR")]
    transcript_dir: PathBuf,

    /// Output directory for audio chunks
    #[arg(long, value_name = "DIR", default_value = "output/audio_chunks")]
    audio_out: PathBuf,

    /// Output directory for transcript chunks
    #[arg(long, value_name = "DIR", default_value = "output/transcript_chunks")]
    text_out: PathBuf,

    /// Alignment language code (e.g. hin, eng)
    #[arg(long, value_name = "CODE")]
    language: String,

    /// Words per chunk
    #[arg(long, default_value_t = DEFAULT_WORDS_PER_CHUNK)]
    words_per_chunk: usize,

    /// Trust fragment contiguity and never emit silence chunks
    #[arg(long, conflicts_with = "per_fragment")]
    contiguous: bool,

    /// One chunk per alignment fragment instead of word grouping
    #[arg(long)]
    per_fragment: bool,

    /// Strip long silences before aligning
    #[arg(long)]
    clean_silence: bool,

    /// Read precomputed alignment JSON (<stem>.json) from this directory
    /// instead of invoking the alignment tool
    #[arg(long, value_name = "DIR")]
    alignment_dir: Option<PathBuf>,

    /// Interpreter used to launch the alignment tool
    #[arg(long, default_value = "python")]
    python: String,

    /// Worker count (0 = number of CPUs)
    #[arg(long, default_value_t = 0)]
    jobs: usize,
}

impl AlignArgs {
    fn validate(&self) -> Result<()> {
        if !self.audio_dir.is_dir() {
            anyhow::bail!("Audio directory does not exist: {:?}", self.audio_dir);
        }
        if !self.transcript_dir.is_dir() {
            anyhow::bail!(
                "Transcript directory does not exist: {:?}",
                self.transcript_dir
            );
        }
        if self.words_per_chunk == 0 {
            anyhow::bail!("Words per chunk must be positive");
        }
        if let Some(dir) = &self.alignment_dir {
            if !dir.is_dir() {
                anyhow::bail!("Alignment directory does not exist: {:?}", dir);
            }
        }
        Ok(())
    }

    fn policy(&self) -> ChunkPolicy {
        if self.per_fragment {
            ChunkPolicy::RecognizerSegment
        } else if self.contiguous {
            ChunkPolicy::FixedWordCountContiguous {
                words_per_chunk: self.words_per_chunk,
            }
        } else {
            ChunkPolicy::FixedWordCountGapAware {
                words_per_chunk: self.words_per_chunk,
            }
        }
    }

    fn job(&self) -> AlignJob {
        AlignJob {
            audio_dir: self.audio_dir.clone(),
            transcript_dir: self.transcript_dir.clone(),
            audio_out: self.audio_out.clone(),
            text_out: self.text_out.clone(),
            language: self.language.clone(),
            policy: self.policy(),
            clean_silence: self.clean_silence.then(SilenceConfig::default),
            jobs: effective_jobs(self.jobs),
        }
    }
}

#[cfg(feature = "whisper")]
#[derive(Args, Debug)]
struct RecognizeArgs {
    /// Directory of source audio files
    #[arg(long, value_name = "DIR")]
    audio_dir: PathBuf,

    /// Output directory for audio chunks
    #[arg(long, value_name = "DIR", default_value = "output/audio_chunks")]
    audio_out: PathBuf,

    /// Output directory for transcript chunks
    #[arg(long, value_name = "DIR", default_value = "output/transcript_chunks")]
    text_out: PathBuf,

    /// Path to the whisper.cpp model file
    #[arg(long, value_name = "PATH")]
    model: PathBuf,

    /// Bucket reference-transcript words into groups of this size instead
    /// of one chunk per segment; requires --transcript-dir
    #[arg(long, requires = "transcript_dir")]
    words_per_chunk: Option<usize>,

    /// Directory of reference transcripts for word re-bucketing
    #[arg(long, value_name = "DIR")]
    transcript_dir: Option<PathBuf>,
}

#[cfg(feature = "whisper")]
impl RecognizeArgs {
    fn validate(&self) -> Result<()> {
        if !self.audio_dir.is_dir() {
            anyhow::bail!("Audio directory does not exist: {:?}", self.audio_dir);
        }
        if !self.model.is_file() {
            anyhow::bail!("Whisper model not found: {:?}", self.model);
        }
        if self.words_per_chunk == Some(0) {
            anyhow::bail!("Words per chunk must be positive");
        }
        if let Some(dir) = &self.transcript_dir {
            if !dir.is_dir() {
                anyhow::bail!("Transcript directory does not exist: {:?}", dir);
            }
        }
        Ok(())
    }

    fn job(&self) -> driver::RecognizeJob {
        let policy = match self.words_per_chunk {
            Some(words_per_chunk) => driver::RecognizePolicy::Rebucket { words_per_chunk },
            None => driver::RecognizePolicy::PerSegment,
        };
        driver::RecognizeJob {
            audio_dir: self.audio_dir.clone(),
            transcript_dir: self.transcript_dir.clone(),
            audio_out: self.audio_out.clone(),
            text_out: self.text_out.clone(),
            policy,
        }
    }
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Root directory containing one folder per language
    #[arg(long, value_name = "DIR")]
    input_root: PathBuf,

    /// Output root; windows land in <root>/{train,dev}/<lang>/
    #[arg(long, value_name = "DIR")]
    output_root: PathBuf,

    /// Window length in seconds
    #[arg(long, default_value_t = DEFAULT_WINDOW_SECS)]
    window_secs: u64,

    /// Fraction of windows assigned to the train split
    #[arg(long, default_value_t = DEFAULT_TRAIN_RATIO)]
    train_ratio: f64,

    /// Process only this language folder (e.g. english)
    #[arg(long, short, value_name = "FOLDER")]
    language: Option<String>,

    /// Worker count (0 = number of CPUs)
    #[arg(long, default_value_t = 0)]
    jobs: usize,
}

impl DatasetArgs {
    fn validate(&self) -> Result<()> {
        if !self.input_root.is_dir() {
            anyhow::bail!("Input root does not exist: {:?}", self.input_root);
        }
        if self.window_secs == 0 {
            anyhow::bail!("Window length must be positive");
        }
        if !(0.0..=1.0).contains(&self.train_ratio) {
            anyhow::bail!("Train ratio must be within [0, 1], got {}", self.train_ratio);
        }
        if let Some(folder) = &self.language {
            if corpuscut::config::language_code(folder).is_none() {
                anyhow::bail!("Unknown language folder: {}", folder);
            }
            if !self.input_root.join(folder).is_dir() {
                anyhow::bail!("Language folder does not exist under input root: {}", folder);
            }
        }
        Ok(())
    }

    fn job(&self) -> DatasetJob {
        DatasetJob {
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            policy: ChunkPolicy::FixedDuration {
                window_ms: self.window_secs * 1_000,
            },
            train_ratio: self.train_ratio,
            language_folder: self.language.clone(),
            jobs: effective_jobs(self.jobs),
        }
    }
}

#[cfg(feature = "whisper")]
#[derive(Args, Debug)]
struct TranscribeArgs {
    /// Root of the filesystem-backed object store
    #[arg(long, value_name = "DIR")]
    store_root: PathBuf,

    /// Key prefix to process (e.g. full_audio/english/)
    #[arg(long, default_value = "")]
    prefix: String,

    /// Directory for the transcript tree mirroring the store keys
    #[arg(long, value_name = "DIR")]
    out_dir: PathBuf,

    /// Path to the whisper.cpp model file
    #[arg(long, value_name = "PATH")]
    model: PathBuf,
}

#[cfg(feature = "whisper")]
impl TranscribeArgs {
    fn validate(&self) -> Result<()> {
        if !self.store_root.is_dir() {
            anyhow::bail!("Store root does not exist: {:?}", self.store_root);
        }
        if !self.model.is_file() {
            anyhow::bail!("Whisper model not found: {:?}", self.model);
        }
        Ok(())
    }
}

fn effective_jobs(requested: usize) -> usize {
    if requested == 0 {
        driver::default_jobs()
    } else {
        requested
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let summary = match &cli.command {
        Command::Align(args) => {
            args.validate()
                .context("Failed to validate command-line arguments")?;
            let job = args.job();
            match &args.alignment_dir {
                Some(dir) => driver::run_align(&job, &PrecomputedAligner { dir: dir.clone() })?,
                None => driver::run_align(
                    &job,
                    &AeneasAligner {
                        python: args.python.clone(),
                    },
                )?,
            }
        }
        #[cfg(feature = "whisper")]
        Command::Recognize(args) => {
            args.validate()
                .context("Failed to validate command-line arguments")?;
            let recognizer = corpuscut::recognize::WhisperRecognizer::from_model_path(&args.model)?;
            driver::run_recognize(&args.job(), &recognizer)?
        }
        Command::Dataset(args) => {
            args.validate()
                .context("Failed to validate command-line arguments")?;
            driver::run_dataset(&args.job())?
        }
        #[cfg(feature = "whisper")]
        Command::Transcribe(args) => {
            args.validate()
                .context("Failed to validate command-line arguments")?;
            let recognizer = corpuscut::recognize::WhisperRecognizer::from_model_path(&args.model)?;
            let job = driver::TranscribeJob {
                store_root: args.store_root.clone(),
                prefix: args.prefix.clone(),
                out_dir: args.out_dir.clone(),
            };
            driver::run_transcribe(&job, &recognizer)?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    for outcome in &summary.outcomes {
        match outcome {
            ItemOutcome::Completed {
                prefix,
                chunks_written,
            } => println!("   {}: {} chunks written", prefix, chunks_written),
            ItemOutcome::Skipped { prefix, reason } => {
                println!("   {}: skipped ({})", prefix, reason)
            }
            ItemOutcome::Failed { prefix, error } => {
                println!("   {}: FAILED: {}", prefix, error)
            }
        }
    }
    println!(
        "\n{} completed, {} skipped, {} failed; {} chunks written",
        summary.completed(),
        summary.skipped(),
        summary.failed(),
        summary.chunks_written()
    );
}
