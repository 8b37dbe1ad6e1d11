use crate::errors::DecodeError;

/// The longest match DEFLATE can emit.
pub const MAX_MATCH: usize = 258;

/// The back-reference window mandated by RFC 1951.
pub const WINDOW_SIZE: usize = 32 * 1024;

/// Reader progress, sampled when the adaptive buffer has to grow.
///
/// `min_code_len` is the shortest code in the literal/length table currently
/// in effect; together with the unconsumed byte count it bounds how much
/// output the rest of the input can still inflate to.
pub struct GrowthHint {
    pub remaining_input: usize,
    pub consumed_input: usize,
    pub min_code_len: u32,
}

/// Destination for decoded bytes.
///
/// One implementation per buffering strategy. The block loop is generic
/// over this trait, so each mode gets its own monomorphized copy of the hot
/// literal/back-reference loop rather than a virtual call per byte.
pub trait OutputSink {
    /// Make room for `needed` more bytes. Must be called before `put_byte`
    /// and `put_backref`; afterwards `needed` bytes are guaranteed to fit.
    fn reserve(&mut self, needed: usize, hint: &GrowthHint);

    /// Append one literal byte. Space must have been reserved.
    fn put_byte(&mut self, byte: u8);

    /// Append a run of raw bytes (stored blocks). Makes its own room.
    fn put_slice(&mut self, bytes: &[u8], hint: &GrowthHint);

    /// Copy `length` bytes starting `distance` bytes back in the produced
    /// output. Space must have been reserved.
    ///
    /// The copy proceeds byte by byte so a distance smaller than the length
    /// re-reads bytes written moments earlier, which is how DEFLATE encodes
    /// runs.
    fn put_backref(&mut self, distance: usize, length: usize) -> Result<(), DecodeError>;

    /// Total bytes produced so far, across the whole stream.
    fn written(&self) -> usize;

    /// Hand back the decoded stream.
    fn finish(self, resize: bool) -> Vec<u8>;
}

/// A single contiguous output buffer that grows on demand.
///
/// The whole decoded stream stays addressable, so back-references index the
/// buffer directly and finalization is a truncate.
pub struct AdaptiveBuf {
    buf: Vec<u8>,
    /// Index of the next byte to write.
    op: usize,
    /// When set, growth multiplies the buffer by this instead of estimating.
    fix_ratio: Option<usize>,
}

impl AdaptiveBuf {
    pub fn new(block_size: usize) -> Self {
        Self {
            buf: vec![0; block_size.max(1)],
            op: 0,
            fix_ratio: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_fix_ratio(block_size: usize, ratio: usize) -> Self {
        Self {
            fix_ratio: Some(ratio.max(2)),
            ..Self::new(block_size)
        }
    }
}

impl OutputSink for AdaptiveBuf {
    fn reserve(&mut self, needed: usize, hint: &GrowthHint) {
        if self.op + needed <= self.buf.len() {
            return;
        }
        let new_len = if let Some(ratio) = self.fix_ratio {
            self.buf.len() * ratio
        } else if hint.consumed_input < hint.remaining_input {
            // Less than half the input seen; too early to extrapolate.
            self.buf.len() * 2
        } else {
            // Each remaining byte holds at most 8 / min_code_len symbols,
            // each expanding to at most one maximum-length match; halve as
            // matches of that size are the worst case, not the norm.
            let max_codes = hint.remaining_input / hint.min_code_len.max(1) as usize;
            let estimate = max_codes / 2 * MAX_MATCH;
            if estimate < self.buf.len() {
                self.buf.len() + estimate
            } else {
                self.buf.len() * 2
            }
        };
        self.buf.resize(new_len.max(self.op + needed), 0);
    }

    fn put_byte(&mut self, byte: u8) {
        self.buf[self.op] = byte;
        self.op += 1;
    }

    fn put_slice(&mut self, bytes: &[u8], hint: &GrowthHint) {
        self.reserve(bytes.len(), hint);
        self.buf[self.op..self.op + bytes.len()].copy_from_slice(bytes);
        self.op += bytes.len();
    }

    fn put_backref(&mut self, distance: usize, length: usize) -> Result<(), DecodeError> {
        if distance == 0 || distance > self.op {
            return Err(DecodeError::InvalidDistance);
        }
        for k in 0..length {
            self.buf[self.op + k] = self.buf[self.op + k - distance];
        }
        self.op += length;
        Ok(())
    }

    fn written(&self) -> usize {
        self.op
    }

    fn finish(mut self, resize: bool) -> Vec<u8> {
        self.buf.truncate(self.op);
        if resize {
            self.buf.shrink_to_fit();
        }
        self.buf
    }
}

/// A fixed-size working buffer holding the sliding window plus headroom.
///
/// The writer starts one window past the front. When the headroom fills up,
/// everything past the window is snapshotted into `chunks`, the last 32 KiB
/// slides down to the front, and the writer resets; back-references always
/// resolve inside the working buffer. Peak working memory stays near
/// `WINDOW_SIZE + block_size` no matter how large the output grows.
pub struct WindowedBuf {
    buf: Vec<u8>,
    /// Index of the next byte to write; always >= WINDOW_SIZE.
    op: usize,
    /// Completed output, in order, excluding the working tail.
    chunks: Vec<Vec<u8>>,
    /// Total bytes moved into `chunks`.
    flushed: usize,
}

impl WindowedBuf {
    pub fn new(block_size: usize) -> Self {
        Self {
            buf: vec![0; WINDOW_SIZE + block_size + MAX_MATCH],
            op: WINDOW_SIZE,
            chunks: Vec::new(),
            flushed: 0,
        }
    }

    /// Snapshot the output past the window and slide the last `WINDOW_SIZE`
    /// bytes down to the front so later back-references still resolve.
    fn flush(&mut self) {
        self.chunks.push(self.buf[WINDOW_SIZE..self.op].to_vec());
        self.flushed += self.op - WINDOW_SIZE;
        self.buf.copy_within(self.op - WINDOW_SIZE..self.op, 0);
        self.op = WINDOW_SIZE;
    }
}

impl OutputSink for WindowedBuf {
    fn reserve(&mut self, needed: usize, _hint: &GrowthHint) {
        debug_assert!(needed <= MAX_MATCH);
        if self.op + needed > self.buf.len() {
            self.flush();
        }
    }

    fn put_byte(&mut self, byte: u8) {
        self.buf[self.op] = byte;
        self.op += 1;
    }

    fn put_slice(&mut self, bytes: &[u8], _hint: &GrowthHint) {
        // Stored blocks can exceed the headroom; copy through it in pieces.
        let mut rest = bytes;
        while !rest.is_empty() {
            let headroom = self.buf.len() - self.op;
            if headroom == 0 {
                self.flush();
                continue;
            }
            let n = rest.len().min(headroom);
            self.buf[self.op..self.op + n].copy_from_slice(&rest[..n]);
            self.op += n;
            rest = &rest[n..];
        }
    }

    fn put_backref(&mut self, distance: usize, length: usize) -> Result<(), DecodeError> {
        // op never drops below WINDOW_SIZE, so any distance within the
        // window and within the bytes produced so far stays in-buffer.
        if distance == 0 || distance > self.written() {
            return Err(DecodeError::InvalidDistance);
        }
        for k in 0..length {
            self.buf[self.op + k] = self.buf[self.op + k - distance];
        }
        self.op += length;
        Ok(())
    }

    fn written(&self) -> usize {
        self.flushed + self.op - WINDOW_SIZE
    }

    fn finish(self, _resize: bool) -> Vec<u8> {
        let tail = &self.buf[WINDOW_SIZE..self.op];
        if self.chunks.is_empty() {
            return tail.to_vec();
        }
        let mut out = Vec::with_capacity(self.flushed + tail.len());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out.extend_from_slice(tail);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_HINT: GrowthHint = GrowthHint {
        remaining_input: 0,
        consumed_input: 1,
        min_code_len: 8,
    };

    fn literals(sink: &mut impl OutputSink, bytes: &[u8]) {
        for &b in bytes {
            sink.reserve(1, &NO_HINT);
            sink.put_byte(b);
        }
    }

    #[test]
    fn adaptive_literals_and_backref() {
        let mut out = AdaptiveBuf::new(2);
        literals(&mut out, &[1, 2, 3]);
        out.reserve(5, &NO_HINT);
        out.put_backref(2, 5).unwrap();
        assert_eq!(out.written(), 8);
        assert_eq!(out.finish(false), [1, 2, 3, 2, 3, 2, 3, 2]);
    }

    #[test]
    fn adaptive_self_overlap_repeats_last_byte() {
        let mut out = AdaptiveBuf::new(1);
        literals(&mut out, &[7]);
        out.reserve(10, &NO_HINT);
        out.put_backref(1, 10).unwrap();
        assert_eq!(out.finish(true), [7; 11]);
    }

    #[test]
    fn adaptive_rejects_distance_past_start() {
        let mut out = AdaptiveBuf::new(8);
        literals(&mut out, &[1, 2, 3]);
        assert_eq!(out.put_backref(4, 1), Err(DecodeError::InvalidDistance));
        assert_eq!(out.put_backref(0, 1), Err(DecodeError::InvalidDistance));
        out.put_backref(3, 1).unwrap();
        assert_eq!(out.finish(false), [1, 2, 3, 1]);
    }

    #[test]
    fn adaptive_growth_estimate_kicks_in_late() {
        // More than half consumed: growth adds the bounded estimate.
        let hint = GrowthHint {
            remaining_input: 100,
            consumed_input: 1000,
            min_code_len: 5,
        };
        let mut out = AdaptiveBuf::new(4);
        for i in 0..100u32 {
            out.reserve(1, &hint);
            out.put_byte(i as u8);
        }
        let decoded = out.finish(false);
        assert_eq!(decoded.len(), 100);
        assert_eq!(decoded[99], 99);
    }

    #[test]
    fn adaptive_fix_ratio_overrides_estimate() {
        let mut out = AdaptiveBuf::with_fix_ratio(2, 16);
        literals(&mut out, &[0; 40]);
        assert_eq!(out.finish(false).len(), 40);
    }

    #[test]
    fn windowed_matches_adaptive_across_flushes() {
        // Small headroom forces many flushes; both sinks must agree.
        let mut windowed = WindowedBuf::new(64);
        let mut adaptive = AdaptiveBuf::new(64);
        let seed: Vec<u8> = (0..=255).collect();
        for sink in [&mut windowed as &mut dyn DynSink, &mut adaptive] {
            sink.slice(&seed);
            for k in 0..200 {
                sink.backref(128 + (k % 100), 7 + k % (MAX_MATCH - 7));
            }
        }
        assert_eq!(windowed.written(), adaptive.written());
        assert_eq!(windowed.finish(false), adaptive.finish(false));
    }

    // Object-safe shim so the equivalence test can drive both sinks
    // through one loop.
    trait DynSink {
        fn slice(&mut self, bytes: &[u8]);
        fn backref(&mut self, distance: usize, length: usize);
    }

    impl<S: OutputSink> DynSink for S {
        fn slice(&mut self, bytes: &[u8]) {
            self.put_slice(bytes, &NO_HINT);
        }

        fn backref(&mut self, distance: usize, length: usize) {
            self.reserve(length, &NO_HINT);
            self.put_backref(distance, length).unwrap();
        }
    }

    #[test]
    fn windowed_written_counts_flushed_bytes() {
        // 1000 bytes through ~274 bytes of headroom: several flushes.
        let mut out = WindowedBuf::new(16);
        out.put_slice(&[9; 1000], &NO_HINT);
        assert_eq!(out.written(), 1000);
        assert_eq!(out.finish(false), [9; 1000]);
    }

    #[test]
    fn windowed_backref_reaches_into_previous_flush() {
        let mut out = WindowedBuf::new(8);
        let seed: Vec<u8> = (0..300).map(|i| (i % 251) as u8).collect();
        out.put_slice(&seed, &NO_HINT);
        // The tiny headroom has already forced a flush, but the window
        // still holds every produced byte.
        out.reserve(258, &NO_HINT);
        out.put_backref(300, 258).unwrap();
        let decoded = out.finish(false);
        assert_eq!(decoded.len(), 558);
        assert_eq!(decoded[300..], decoded[..258]);
    }

    #[test]
    fn windowed_rejects_distance_past_start() {
        let mut out = WindowedBuf::new(16);
        out.put_slice(&[1, 2], &NO_HINT);
        assert_eq!(out.put_backref(3, 1), Err(DecodeError::InvalidDistance));
    }

    #[test]
    fn empty_finish() {
        assert_eq!(AdaptiveBuf::new(8).finish(false), Vec::<u8>::new());
        assert_eq!(WindowedBuf::new(8).finish(false), Vec::<u8>::new());
    }
}
