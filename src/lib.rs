//! A decoder for zlib-wrapped DEFLATE streams (RFC 1950 wrapping RFC 1951).
//!
//! The whole stream must be in memory; [`Decoder::inflate`] returns the
//! uncompressed bytes in one piece, optionally verifying the trailing
//! Adler-32. Compression, gzip framing, and streaming decode are out of
//! scope.

mod deflate;
mod errors;
mod flags;

pub use errors::DecodeError;
pub use flags::Flags;

use adler32::RollingAdler32;

use deflate::{inflate_blocks, AdaptiveBuf, BitReader, OutputSink, WindowedBuf};

/// How the decoder lays out output while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One contiguous buffer, grown on demand. No copying at the end, but
    /// the working allocation can overshoot the final size.
    #[default]
    Adaptive,
    /// A fixed working buffer holding the 32 KiB back-reference window;
    /// completed output is set aside in chunks and concatenated at the
    /// end. Peak working memory stays constant however large the output.
    Windowed,
}

/// Decoder construction options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Initial allocation (adaptive) or flush granularity (windowed).
    pub block_size: usize,
    /// Check the trailing Adler-32 against the decoded bytes.
    pub verify: bool,
    pub mode: Mode,
    /// Trim the final adaptive allocation to exactly the decoded length.
    pub resize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            block_size: 32 * 1024,
            verify: false,
            mode: Mode::Adaptive,
            resize: false,
        }
    }
}

/// The two-byte zlib stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Compression method; always 8 (DEFLATE) in a stream we accept.
    pub method: u8,
    /// Window size exponent: the encoder used a 2^(cinfo + 8) byte window.
    pub cinfo: u8,
    pub flags: Flags,
}

/// Decodes one complete zlib stream.
pub struct Decoder<'a> {
    input: &'a [u8],
    options: Options,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, Options::default())
    }

    pub fn with_options(input: &'a [u8], options: Options) -> Self {
        Self { input, options }
    }

    /// Parse and validate the stream header without decoding the body.
    pub fn header(&self) -> Result<Header, DecodeError> {
        read_header(&mut BitReader::new(self.input))
    }

    /// Decode the whole stream, returning the uncompressed bytes.
    pub fn inflate(self) -> Result<Vec<u8>, DecodeError> {
        let Options {
            block_size,
            verify,
            mode,
            resize,
        } = self.options;

        let mut bits = BitReader::new(self.input);
        read_header(&mut bits)?;

        let out = match mode {
            Mode::Adaptive => decode_body(&mut bits, AdaptiveBuf::new(block_size), resize)?,
            Mode::Windowed => decode_body(&mut bits, WindowedBuf::new(block_size), resize)?,
        };

        if verify {
            let expected = read_adler(&mut bits)?;
            let actual = RollingAdler32::from_buffer(&out).hash();
            if expected != actual {
                return Err(DecodeError::ChecksumMismatch { expected, actual });
            }
        }

        // Anything after the trailer is left for the caller; zlib streams
        // are routinely embedded in larger files.
        Ok(out)
    }
}

/// Decode `input` as a complete zlib stream with default options.
pub fn inflate(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    Decoder::new(input).inflate()
}

/// Reinterpret text as raw bytes, keeping the low byte of each code point.
///
/// For callers that carried binary data through a string type; not part of
/// the decode path.
pub fn from_string(s: &str) -> Vec<u8> {
    s.chars().map(|c| (c as u32 & 0xff) as u8).collect()
}

fn decode_body<S: OutputSink>(
    bits: &mut BitReader<'_>,
    mut sink: S,
    resize: bool,
) -> Result<Vec<u8>, DecodeError> {
    inflate_blocks(bits, &mut sink)?;
    Ok(sink.finish(resize))
}

fn read_header(bits: &mut BitReader<'_>) -> Result<Header, DecodeError> {
    let cmf = bits.read_bits(8)? as u8;
    let flg = bits.read_bits(8)? as u8;

    let method = cmf & 0x0f;
    if method != 8 {
        return Err(DecodeError::UnsupportedMethod(method));
    }
    if (u16::from_be_bytes([cmf, flg])) % 31 != 0 {
        return Err(DecodeError::InvalidHeaderCheck);
    }
    let flags = Flags::from_bits_retain(flg);
    if flags.contains(Flags::FDICT) {
        return Err(DecodeError::PresetDictionaryUnsupported);
    }

    Ok(Header {
        method,
        cinfo: cmf >> 4,
        flags,
    })
}

fn read_adler(bits: &mut BitReader<'_>) -> Result<u32, DecodeError> {
    bits.align_to_byte();
    let bytes = bits.take_bytes(4)?;
    Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
}
