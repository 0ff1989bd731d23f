// whole-image similarity: normalized inverse L1 distance between target and
// working approximation

use rayon::prelude::*;

// pixels per rayon work unit; below this a task is not worth the dispatch
const MIN_CHUNK_BYTES: usize = 64 * 1024;

/// sum of absolute per-channel differences between two RGB buffers
pub fn sad_rgb(target: &[u8], current: &[u8]) -> u64 {
    debug_assert_eq!(target.len(), current.len());

    if target.len() < MIN_CHUNK_BYTES {
        return sad_scalar(target, current);
    }

    target
        .par_chunks(MIN_CHUNK_BYTES)
        .zip(current.par_chunks(MIN_CHUNK_BYTES))
        .map(|(t, c)| sad_scalar(t, c))
        .sum()
}

#[inline]
fn sad_scalar(target: &[u8], current: &[u8]) -> u64 {
    target
        .iter()
        .zip(current)
        .map(|(&t, &c)| (t as i32 - c as i32).unsigned_abs() as u64)
        .sum()
}

/// map a SAD value into [0, 1] where 1 is a perfect match
#[inline]
pub fn similarity(sad: u64, pixel_count: usize) -> f64 {
    1.0 - sad as f64 / (pixel_count as f64 * 3.0 * 255.0)
}
