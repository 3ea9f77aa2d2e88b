//! Runtime codec registry for enabling/disabling bitstream formats.

use crate::BitstreamFormat;

/// Set of bitstream formats represented as bitflags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FormatSet(u8);

impl FormatSet {
    const EMPTY: Self = FormatSet(0);
    const ALL: Self = FormatSet(Self::LOSSY | Self::LOSSLESS);
    const LOSSY: u8 = 1 << 0;
    const LOSSLESS: u8 = 1 << 1;

    fn bit(format: BitstreamFormat) -> u8 {
        match format {
            BitstreamFormat::Lossy => Self::LOSSY,
            BitstreamFormat::Lossless => Self::LOSSLESS,
        }
    }

    fn contains(self, format: BitstreamFormat) -> bool {
        (self.0 & Self::bit(format)) != 0
    }

    fn insert(&mut self, format: BitstreamFormat) {
        self.0 |= Self::bit(format);
    }

    fn remove(&mut self, format: BitstreamFormat) {
        self.0 &= !Self::bit(format);
    }

    fn iter(self) -> impl Iterator<Item = BitstreamFormat> {
        [BitstreamFormat::Lossy, BitstreamFormat::Lossless]
            .into_iter()
            .filter(move |&f| self.contains(f))
    }
}

/// Runtime codec registry.
///
/// Controls which frame bitstreams are enabled for a given operation. A
/// server can, for example, refuse lossy input or only ever emit lossless
/// output. Requests without a registry use [`CodecRegistry::all`].
#[derive(Clone, Debug)]
pub struct CodecRegistry {
    decode_enabled: FormatSet,
    encode_enabled: FormatSet,
}

impl CodecRegistry {
    /// Both bitstreams enabled in both directions.
    pub fn all() -> Self {
        Self {
            decode_enabled: FormatSet::ALL,
            encode_enabled: FormatSet::ALL,
        }
    }

    /// Nothing enabled, caller must opt in.
    pub fn none() -> Self {
        Self {
            decode_enabled: FormatSet::EMPTY,
            encode_enabled: FormatSet::EMPTY,
        }
    }

    /// Enable or disable decoding for a format.
    pub fn with_decode(mut self, format: BitstreamFormat, enabled: bool) -> Self {
        if enabled {
            self.decode_enabled.insert(format);
        } else {
            self.decode_enabled.remove(format);
        }
        self
    }

    /// Enable or disable encoding for a format.
    pub fn with_encode(mut self, format: BitstreamFormat, enabled: bool) -> Self {
        if enabled {
            self.encode_enabled.insert(format);
        } else {
            self.encode_enabled.remove(format);
        }
        self
    }

    pub fn can_decode(&self, format: BitstreamFormat) -> bool {
        self.decode_enabled.contains(format)
    }

    pub fn can_encode(&self, format: BitstreamFormat) -> bool {
        self.encode_enabled.contains(format)
    }

    /// Formats enabled for decoding.
    pub fn decodable_formats(&self) -> impl Iterator<Item = BitstreamFormat> {
        self.decode_enabled.iter()
    }

    /// Formats enabled for encoding.
    pub fn encodable_formats(&self) -> impl Iterator<Item = BitstreamFormat> {
        self.encode_enabled.iter()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_registry() {
        let registry = CodecRegistry::all();
        assert!(registry.can_decode(BitstreamFormat::Lossy));
        assert!(registry.can_encode(BitstreamFormat::Lossless));
        assert_eq!(registry.decodable_formats().count(), 2);
    }

    #[test]
    fn none_registry() {
        let registry = CodecRegistry::none();
        assert!(!registry.can_decode(BitstreamFormat::Lossless));
        assert!(!registry.can_encode(BitstreamFormat::Lossy));
        assert_eq!(registry.encodable_formats().count(), 0);
    }

    #[test]
    fn selective_enable() {
        let registry = CodecRegistry::none()
            .with_decode(BitstreamFormat::Lossy, true)
            .with_encode(BitstreamFormat::Lossless, true);

        assert!(registry.can_decode(BitstreamFormat::Lossy));
        assert!(registry.can_encode(BitstreamFormat::Lossless));
        assert!(!registry.can_decode(BitstreamFormat::Lossless));
        assert!(!registry.can_encode(BitstreamFormat::Lossy));
    }

    #[test]
    fn toggle_format() {
        let registry = CodecRegistry::all().with_decode(BitstreamFormat::Lossy, false);
        assert!(!registry.can_decode(BitstreamFormat::Lossy));
        let decodable: alloc::vec::Vec<_> = registry.decodable_formats().collect();
        assert_eq!(decodable, [BitstreamFormat::Lossless]);
    }
}
