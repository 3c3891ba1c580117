use crate::types::TimeInterval;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;

/// Which side of the train/dev cut a window landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Dev,
}

impl Split {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev => "dev",
        }
    }
}

/// One fixed-length window of a source file, named and split-assigned.
#[derive(Debug, Clone)]
pub struct DatasetWindow {
    pub token: String,
    pub interval: TimeInterval,
    pub split: Split,
}

impl DatasetWindow {
    /// File name convention: `<token>---SSSS.sss-EEEE.eee` (seconds,
    /// zero-padded to 4 integer digits, 3 decimals).
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "{}---{:08.3}-{:08.3}.{}",
            self.token,
            self.interval.start_secs(),
            self.interval.end_secs(),
            extension
        )
    }
}

/// Cut `[0, total_ms)` into consecutive `window_ms` windows; the final
/// window is whatever remains. Each window gets a collision-resistant
/// 6-character token so concurrent writers never contend on a name.
pub fn plan_windows<R: Rng>(total_ms: u64, window_ms: u64, rng: &mut R) -> Vec<DatasetWindow> {
    assert!(window_ms > 0, "window length must be positive");

    let mut windows = Vec::new();
    let mut start = 0;
    while start < total_ms {
        let end = (start + window_ms).min(total_ms);
        windows.push(DatasetWindow {
            token: random_token(rng),
            interval: TimeInterval::new(start, end),
            split: Split::Train,
        });
        start = end;
    }
    windows
}

/// Shuffle the windows of one file and send the first `round(N * ratio)` to
/// train, the remainder to dev.
pub fn assign_splits<R: Rng>(windows: &mut [DatasetWindow], train_ratio: f64, rng: &mut R) {
    windows.shuffle(rng);
    let train_count = ((windows.len() as f64 * train_ratio).round() as usize).min(windows.len());
    for (i, window) in windows.iter_mut().enumerate() {
        window.split = if i < train_count {
            Split::Train
        } else {
            Split::Dev
        };
    }
}

fn random_token<R: Rng>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}
