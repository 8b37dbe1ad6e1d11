use std::io;

/// A decoding error, due to malformed or truncated zlib data.
///
/// Every error is fatal for the decode that produced it: no partial output
/// is returned, and retrying the same input yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The CMF method field is not 8 (DEFLATE).
    #[error("unsupported compression method: expected 8, got {0}")]
    UnsupportedMethod(u8),

    /// CMF and FLG together are not a multiple of 31.
    #[error("zlib header check failed")]
    InvalidHeaderCheck,

    /// The FDICT flag is set.
    #[error("preset dictionaries are not supported")]
    PresetDictionaryUnsupported,

    /// A block used the reserved BTYPE bit pattern 11.
    #[error("reserved block type")]
    InvalidBlockType,

    /// A stored block's LEN and NLEN are not ones-complements.
    #[error("stored block length check failed: LEN {len:#06x}, NLEN {nlen:#06x}")]
    InvalidStoredLength { len: u16, nlen: u16 },

    /// The input ran out of bytes mid-decode.
    #[error("unexpected end of input")]
    TruncatedInput,

    /// A bit pattern matched no code in the table in effect.
    #[error("invalid huffman code")]
    InvalidHuffmanCode,

    /// A back-reference pointed before the start of the produced output,
    /// or a reserved distance symbol was decoded.
    #[error("invalid back-reference distance")]
    InvalidDistance,

    /// The trailing Adler-32 did not match the decoded bytes.
    #[error("checksum mismatch: stream says {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl From<DecodeError> for io::Error {
    fn from(e: DecodeError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, e)
    }
}
