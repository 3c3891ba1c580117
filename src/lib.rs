//! corpuscut - speech-corpus chunking engine
//!
//! Turns long recordings and their transcripts into short, time-aligned
//! audio/text chunk pairs for speech-model training. Chunk boundaries come
//! from forced-alignment fragments, recognizer segments, or fixed-length
//! windows; the batch driver runs whole corpora with per-file isolation
//! and idempotent resume.

pub mod align;
pub mod audio;
pub mod chunking;
pub mod config;
pub mod driver;
pub mod recognize;
pub mod storage;
pub mod types;
