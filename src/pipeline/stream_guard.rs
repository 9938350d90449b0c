//! StreamGuard: degeneration watchdog for fragment streams.
//!
//! Greedy decoding on small models sometimes falls into a loop, repeating one
//! fragment or one short run of fragments until the length cap. The guard
//! watches each fragment as it arrives and trips early so the session can be
//! cancelled instead of burning the whole token budget.

use std::collections::VecDeque;

// ═══════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamGuardConfig {
    /// Same fragment this many times in a row → trip.
    pub max_identical_run: usize,
    /// Length (in fragments) of the window compared against its predecessor.
    pub window: usize,
    /// Window equal to the preceding window this many times in a row → trip.
    pub max_window_repeats: usize,
    /// Absolute fragment cap.
    pub max_fragments: usize,
}

impl Default for StreamGuardConfig {
    fn default() -> Self {
        Self {
            max_identical_run: 20,
            window: 10,
            max_window_repeats: 5,
            max_fragments: 4096,
        }
    }
}

/// Why the guard tripped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Degeneration {
    #[error("fragment {fragment:?} repeated {count} times")]
    IdenticalRun { fragment: String, count: usize },

    #[error("{window}-fragment sequence repeated {repeats} times")]
    SequenceLoop { window: usize, repeats: usize },

    #[error("fragment cap of {limit} reached")]
    FragmentCap { limit: usize },
}

// ═══════════════════════════════════════════════════════════
// StreamGuard
// ═══════════════════════════════════════════════════════════

/// Stateful watchdog, one per generation session.
pub struct StreamGuard {
    config: StreamGuardConfig,
    /// Last `2 * window` fragments.
    recent: VecDeque<String>,
    last: Option<String>,
    seen: usize,
    identical_run: usize,
    window_repeats: usize,
}

impl StreamGuard {
    pub fn new(config: StreamGuardConfig) -> Self {
        let capacity = config.window.saturating_mul(2);
        Self {
            config,
            recent: VecDeque::with_capacity(capacity),
            last: None,
            seen: 0,
            identical_run: 0,
            window_repeats: 0,
        }
    }

    /// Observe the next fragment. `Err` means the caller should stop the stream.
    pub fn observe(&mut self, fragment: &str) -> Result<(), Degeneration> {
        self.seen += 1;
        if self.seen > self.config.max_fragments {
            return Err(Degeneration::FragmentCap {
                limit: self.config.max_fragments,
            });
        }

        if self.last.as_deref() == Some(fragment) {
            self.identical_run += 1;
        } else {
            self.identical_run = 1;
            self.last = Some(fragment.to_string());
        }
        if self.identical_run >= self.config.max_identical_run {
            return Err(Degeneration::IdenticalRun {
                fragment: preview(fragment),
                count: self.identical_run,
            });
        }

        let k = self.config.window;
        if k == 0 {
            return Ok(());
        }
        if self.recent.len() == 2 * k {
            self.recent.pop_front();
        }
        self.recent.push_back(fragment.to_string());

        if self.recent.len() == 2 * k {
            let (older, newer) = (self.recent.range(..k), self.recent.range(k..));
            if older.eq(newer) {
                self.window_repeats += 1;
                if self.window_repeats >= self.config.max_window_repeats {
                    return Err(Degeneration::SequenceLoop {
                        window: k,
                        repeats: self.window_repeats,
                    });
                }
            } else {
                self.window_repeats = 0;
            }
        }
        Ok(())
    }

    pub fn fragments_seen(&self) -> usize {
        self.seen
    }
}

/// First 40 characters, for logs and error messages.
fn preview(fragment: &str) -> String {
    fragment.chars().take(40).collect()
}
