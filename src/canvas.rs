use std::sync::Arc;

/// axis-aligned pixel box, rows/cols with exclusive upper bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min_row: u32,
    pub max_row: u32,
    pub min_col: u32,
    pub max_col: u32,
}

impl Bounds {
    #[inline]
    pub fn rows(&self) -> u32 {
        self.max_row - self.min_row
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.max_col - self.min_col
    }

    /// byte length of a patch covering this box (3 channels per pixel)
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.rows() as usize * self.cols() as usize * 3
    }
}

/// target image plus the mutable working approximation.
///
/// `target` sits behind an Arc so concurrent search workers can share it;
/// `fork()` deep-copies only the working image. `current` starts as a flat
/// field of the target's average color.
#[derive(Clone)]
pub struct Canvas {
    target: Arc<[u8]>,
    current: Vec<u8>,
    height: u32,
    width: u32,
    background: [u8; 3],
}

impl Canvas {
    /// build from a packed H×W×3 RGB buffer (row-major)
    pub fn new(rgb: Vec<u8>, height: u32, width: u32) -> Self {
        assert_eq!(
            rgb.len(),
            height as usize * width as usize * 3,
            "pixel buffer does not match {height}x{width}x3"
        );

        let px = height as u64 * width as u64;
        let mut sums = [0u64; 3];
        for chunk in rgb.chunks_exact(3) {
            sums[0] += chunk[0] as u64;
            sums[1] += chunk[1] as u64;
            sums[2] += chunk[2] as u64;
        }
        let background = [
            (sums[0] / px) as u8,
            (sums[1] / px) as u8,
            (sums[2] / px) as u8,
        ];

        let mut current = Vec::with_capacity(rgb.len());
        for _ in 0..px {
            current.extend_from_slice(&background);
        }

        Self {
            target: Arc::from(rgb),
            current,
            height,
            width,
            background,
        }
    }

    /// (height, width)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.height as usize * self.width as usize
    }

    #[inline]
    pub fn background(&self) -> [u8; 3] {
        self.background
    }

    #[inline]
    pub fn target(&self) -> &[u8] {
        &self.target
    }

    #[inline]
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    /// isolated snapshot for a concurrent search worker: shares the target,
    /// deep-copies the working image
    pub fn fork(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            current: self.current.clone(),
            height: self.height,
            width: self.width,
            background: self.background,
        }
    }

    /// overwrite `current` inside `bounds` with `patch`. the box must lie
    /// within the canvas and the patch must match its byte length; a
    /// violation is a caller bug, not a recoverable condition.
    pub fn apply_patch(&mut self, patch: &[u8], bounds: &Bounds) {
        debug_assert!(bounds.max_row <= self.height && bounds.max_col <= self.width);
        debug_assert_eq!(patch.len(), bounds.byte_len());

        let row_bytes = bounds.cols() as usize * 3;
        for (i, row) in (bounds.min_row..bounds.max_row).enumerate() {
            let dst = ((row * self.width + bounds.min_col) * 3) as usize;
            let src = i * row_bytes;
            self.current[dst..dst + row_bytes].copy_from_slice(&patch[src..src + row_bytes]);
        }
    }

    /// copy out the current contents of `bounds`, e.g. to restore after a
    /// temporary preview
    pub fn read_region(&self, bounds: &Bounds) -> Vec<u8> {
        debug_assert!(bounds.max_row <= self.height && bounds.max_col <= self.width);

        let row_bytes = bounds.cols() as usize * 3;
        let mut out = Vec::with_capacity(bounds.byte_len());
        for row in bounds.min_row..bounds.max_row {
            let src = ((row * self.width + bounds.min_col) * 3) as usize;
            out.extend_from_slice(&self.current[src..src + row_bytes]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(h: u32, w: u32) -> Vec<u8> {
        let mut rgb = Vec::new();
        for r in 0..h {
            for c in 0..w {
                let v = if (r + c) % 2 == 0 { 0 } else { 255 };
                rgb.extend_from_slice(&[v, v, v]);
            }
        }
        rgb
    }

    #[test]
    fn background_is_channel_average() {
        let canvas = Canvas::new(checker(4, 4), 4, 4);
        // 8 black + 8 white pixels -> truncating average 127
        assert_eq!(canvas.background(), [127, 127, 127]);
        assert!(canvas.current().chunks_exact(3).all(|p| p == [127, 127, 127]));
    }

    #[test]
    fn patch_roundtrip() {
        let mut canvas = Canvas::new(vec![0; 5 * 4 * 3], 5, 4);
        let bounds = Bounds { min_row: 1, max_row: 3, min_col: 1, max_col: 3 };
        let patch: Vec<u8> = (0..bounds.byte_len() as u8).collect();

        let before = canvas.read_region(&bounds);
        canvas.apply_patch(&patch, &bounds);
        assert_eq!(canvas.read_region(&bounds), patch);

        canvas.apply_patch(&before, &bounds);
        assert_eq!(canvas.read_region(&bounds), before);
    }

    #[test]
    fn fork_isolates_current_but_shares_target() {
        let mut canvas = Canvas::new(checker(4, 4), 4, 4);
        let snapshot = canvas.fork();

        let bounds = Bounds { min_row: 0, max_row: 1, min_col: 0, max_col: 1 };
        canvas.apply_patch(&[9, 9, 9], &bounds);

        assert_ne!(canvas.current()[..3], snapshot.current()[..3]);
        assert_eq!(canvas.target(), snapshot.target());
    }
}
