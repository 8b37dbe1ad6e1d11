use bitflags::bitflags;

bitflags! {
    /// The zlib FLG header byte.
    ///
    /// See RFC 1950. Only FDICT is a flag proper; the low five bits are
    /// FCHECK (a header checksum, validated as part of the CMF/FLG pair)
    /// and the top two are FLEVEL, a compression-level hint. Both are
    /// retained here as raw bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        /// If set, a preset-dictionary id follows the header.
        const FDICT = 0b_0010_0000;

        const _ = !0;
    }
}

impl Flags {
    /// The FLEVEL field: 0 fastest through 3 maximum compression.
    ///
    /// Purely informational; the DEFLATE data decodes the same regardless.
    pub fn level(self) -> u8 {
        self.bits() >> 6
    }
}
