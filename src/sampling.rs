use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::models::TranscriptMeta;

/// Default cap on transcripts per cross-sectional group
pub const DEFAULT_MAX_SAMPLE: usize = 100;

/// Picks a bounded subset of a query's transcripts
#[derive(Debug, Clone, Copy)]
pub struct SamplingController {
    pub max_size: usize,
}

impl Default for SamplingController {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SAMPLE,
        }
    }
}

impl SamplingController {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Select at most `max_size` distinct transcripts with usable text.
    ///
    /// Small populations are used whole, minus transcripts without text.
    /// Larger ones are sampled without replacement; a sampled transcript
    /// without text is swapped for one drawn from the unsampled pool, and is
    /// dropped if the pool runs out.
    pub fn select<R: Rng + ?Sized>(
        &self,
        population: Vec<TranscriptMeta>,
        rng: &mut R,
    ) -> Vec<TranscriptMeta> {
        if population.len() <= self.max_size {
            let total = population.len();
            let usable: Vec<TranscriptMeta> = population
                .into_iter()
                .filter(TranscriptMeta::has_usable_text)
                .collect();
            debug!(
                "Using full population: {} of {} transcripts have text",
                usable.len(),
                total
            );
            return usable;
        }

        let mut pool = population;
        pool.shuffle(rng);
        // After the shuffle the tail is a uniform sample; the head is the unsampled pool
        let sampled = pool.split_off(pool.len() - self.max_size);

        let mut selected = Vec::with_capacity(self.max_size);
        let mut replaced = 0usize;
        for transcript in sampled {
            if transcript.has_usable_text() {
                selected.push(transcript);
                continue;
            }
            replaced += 1;
            if let Some(replacement) = draw_usable(&mut pool, rng) {
                selected.push(replacement);
            }
        }

        if selected.len() < self.max_size {
            warn!(
                "Sample short by {} after replacing {} transcripts without text",
                self.max_size - selected.len(),
                replaced
            );
        }

        selected
    }
}

/// Remove random transcripts from `pool` until one has usable text
fn draw_usable<R: Rng + ?Sized>(pool: &mut Vec<TranscriptMeta>, rng: &mut R) -> Option<TranscriptMeta> {
    while !pool.is_empty() {
        let index = rng.gen_range(0..pool.len());
        let candidate = pool.swap_remove(index);
        if candidate.has_usable_text() {
            return Some(candidate);
        }
    }
    None
}
