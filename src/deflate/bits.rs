use crate::errors::DecodeError;

/// LSB-first bit reader over an in-memory byte slice.
///
/// Bytes are pulled into a 32-bit pending buffer on demand; the next bit to
/// be consumed is always bit 0. The longest single read DEFLATE needs is 16
/// bits, so the buffer never holds more than 23 pending bits.
pub struct BitReader<'a> {
    input: &'a [u8],
    /// Index of the next unread input byte.
    ip: usize,
    /// Pending bits, packed LSB-first.
    bits_buf: u32,
    /// Count of valid bits in `bits_buf`.
    bits_len: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            ip: 0,
            bits_buf: 0,
            bits_len: 0,
        }
    }

    /// Read and consume the next `n` bits, `n <= 16`.
    pub fn read_bits(&mut self, n: u32) -> Result<u32, DecodeError> {
        debug_assert!(n <= 16);
        let bits = self.peek_bits(n);
        if self.bits_len < n {
            return Err(DecodeError::TruncatedInput);
        }
        self.bits_buf >>= n;
        self.bits_len -= n;
        Ok(bits)
    }

    /// Return the next `n` bits without consuming them.
    ///
    /// If fewer than `n` bits remain in the whole input, the result is
    /// zero-padded at the top; check [`buffered`](Self::buffered) before
    /// consuming. The huffman decoder relies on the padding to resolve
    /// codes shorter than its table width near end of input.
    pub fn peek_bits(&mut self, n: u32) -> u32 {
        while self.bits_len < n && self.ip < self.input.len() {
            self.bits_buf |= (self.input[self.ip] as u32) << self.bits_len;
            self.ip += 1;
            self.bits_len += 8;
        }
        self.bits_buf & ((1 << n) - 1)
    }

    /// Consume `n` previously peeked bits.
    pub fn discard_bits(&mut self, n: u32) {
        debug_assert!(n <= self.bits_len);
        self.bits_buf >>= n;
        self.bits_len -= n;
    }

    /// Count of bits available without refilling, after a peek.
    pub fn buffered(&self) -> u32 {
        self.bits_len
    }

    /// Drop pending bits so the next read starts on a byte boundary.
    ///
    /// Whole buffered bytes are pushed back onto the input; only the
    /// partially consumed byte is discarded.
    pub fn align_to_byte(&mut self) {
        self.ip -= (self.bits_len / 8) as usize;
        self.bits_buf = 0;
        self.bits_len = 0;
    }

    /// Borrow `len` raw input bytes at the current position.
    ///
    /// Callers must be byte-aligned (see [`align_to_byte`](Self::align_to_byte)).
    pub fn take_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        debug_assert_eq!(self.bits_len, 0);
        if self.input.len() - self.ip < len {
            return Err(DecodeError::TruncatedInput);
        }
        let bytes = &self.input[self.ip..self.ip + len];
        self.ip += len;
        Ok(bytes)
    }

    /// Index of the next unread input byte.
    pub fn position(&self) -> usize {
        self.ip
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }
}
