//! End-to-end runs of the forced-alignment batch driver over a temp corpus,
//! using precomputed alignment JSON in place of the external tool.

use std::fs;
use std::path::Path;

use corpuscut::align::PrecomputedAligner;
use corpuscut::chunking::ChunkPolicy;
use corpuscut::driver::{run_align, AlignJob, ItemOutcome};
use tempfile::TempDir;

const RATE: u32 = 16_000;

fn write_wav(path: &Path, seconds: f64) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let samples = (seconds * RATE as f64) as usize;
    for i in 0..samples {
        let t = i as f32 / RATE as f32;
        let value = (t * 2.0 * std::f32::consts::PI * 220.0).sin() * 0.4;
        writer.write_sample((value * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

struct Corpus {
    _dir: TempDir,
    job: AlignJob,
    aligner: PrecomputedAligner,
}

/// One 6-second file "talk" with fragments [(0,2,"a b"), (5,6,"c")].
fn build_corpus(words_per_chunk: usize) -> Corpus {
    let dir = TempDir::new().unwrap();
    let audio_dir = dir.path().join("audio");
    let transcript_dir = dir.path().join("transcripts");
    let alignment_dir = dir.path().join("alignments");
    for d in [&audio_dir, &transcript_dir, &alignment_dir] {
        fs::create_dir_all(d).unwrap();
    }

    write_wav(&audio_dir.join("talk.wav"), 6.0);
    fs::write(transcript_dir.join("talk.txt"), "a b c").unwrap();
    fs::write(
        alignment_dir.join("talk.json"),
        r#"{"fragments": [
            {"begin": "0.000", "end": "2.000", "lines": ["a b"]},
            {"begin": "5.000", "end": "6.000", "lines": ["c"]}
        ]}"#,
    )
    .unwrap();

    let job = AlignJob {
        audio_dir,
        transcript_dir,
        audio_out: dir.path().join("out/audio_chunks"),
        text_out: dir.path().join("out/transcript_chunks"),
        language: "eng".to_string(),
        policy: ChunkPolicy::FixedWordCountGapAware { words_per_chunk },
        clean_silence: None,
        jobs: 2,
    };
    let aligner = PrecomputedAligner {
        dir: alignment_dir,
    };
    Corpus {
        _dir: dir,
        job,
        aligner,
    }
}

fn chunk_text(job: &AlignJob, name: &str) -> String {
    fs::read_to_string(job.text_out.join(name)).unwrap()
}

#[test]
fn gap_aware_run_writes_mirrored_chunk_trees() {
    let corpus = build_corpus(2);
    let summary = run_align(&corpus.job, &corpus.aligner).unwrap();

    assert_eq!(summary.completed(), 1);
    assert_eq!(summary.chunks_written(), 3);

    // Text tree: content, silence, content
    assert_eq!(chunk_text(&corpus.job, "talk_chunk_001.txt"), "a b");
    assert_eq!(chunk_text(&corpus.job, "talk_chunk_002.txt"), "");
    assert_eq!(chunk_text(&corpus.job, "talk_chunk_003.txt"), "c");

    // Audio tree mirrors it, 16kHz mono clips of the right length
    let silence = hound::WavReader::open(
        corpus.job.audio_out.join("talk_chunk_002.wav"),
    )
    .unwrap();
    assert_eq!(silence.spec().sample_rate, 16_000);
    assert_eq!(silence.spec().channels, 1);
    // [2s, 5s) of the source
    assert_eq!(silence.len(), 3 * 16_000);

    let tail = hound::WavReader::open(corpus.job.audio_out.join("talk_chunk_003.wav")).unwrap();
    assert_eq!(tail.len(), 16_000);
}

#[test]
fn second_run_skips_completed_files_without_rewriting() {
    let corpus = build_corpus(2);
    run_align(&corpus.job, &corpus.aligner).unwrap();

    // Tamper with an output; an idempotent rerun must not touch it
    let marker = corpus.job.text_out.join("talk_chunk_001.txt");
    fs::write(&marker, "sentinel").unwrap();

    let summary = run_align(&corpus.job, &corpus.aligner).unwrap();
    assert_eq!(summary.completed(), 0);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.chunks_written(), 0);
    assert_eq!(fs::read_to_string(&marker).unwrap(), "sentinel");
}

#[test]
fn missing_transcript_skips_that_file_only() {
    let corpus = build_corpus(2);
    // Second audio file with no transcript
    write_wav(&corpus.job.audio_dir.join("lonely.wav"), 1.0);

    let summary = run_align(&corpus.job, &corpus.aligner).unwrap();
    assert_eq!(summary.completed(), 1);
    assert_eq!(summary.skipped(), 1);

    let skipped: Vec<&str> = summary
        .outcomes
        .iter()
        .filter_map(|o| match o {
            ItemOutcome::Skipped { prefix, .. } => Some(prefix.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["lonely"]);

    // The skipped file produced no output at all
    let stray: Vec<_> = fs::read_dir(&corpus.job.text_out)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("lonely"))
        .collect();
    assert!(stray.is_empty());
}

#[test]
fn one_broken_file_does_not_abort_the_batch() {
    let corpus = build_corpus(2);
    write_wav(&corpus.job.audio_dir.join("broken.wav"), 1.0);
    fs::write(corpus.job.transcript_dir.join("broken.txt"), "words").unwrap();
    fs::write(corpus.aligner.dir.join("broken.json"), "not json at all").unwrap();

    let summary = run_align(&corpus.job, &corpus.aligner).unwrap();
    assert_eq!(summary.completed(), 1);
    assert_eq!(summary.failed(), 1);
    // The healthy file still produced its chunks
    assert_eq!(summary.chunks_written(), 3);
}

#[test]
fn contiguous_policy_emits_no_silence_chunks() {
    let mut corpus = build_corpus(2);
    corpus.job.policy = ChunkPolicy::FixedWordCountContiguous { words_per_chunk: 2 };

    let summary = run_align(&corpus.job, &corpus.aligner).unwrap();
    // "a b" and the leftover "c"; the 2s..5s gap is not materialized
    assert_eq!(summary.chunks_written(), 2);
    assert_eq!(chunk_text(&corpus.job, "talk_chunk_001.txt"), "a b");
    assert_eq!(chunk_text(&corpus.job, "talk_chunk_002.txt"), "c");
}
