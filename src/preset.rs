//! Named quality presets.

use crate::encode::EncodeMode;

/// Quality presets mapped to an [`EncodeMode`].
///
/// | Preset       | Mode     | Quality |
/// |--------------|----------|---------|
/// | Lossless     | lossless | n/a     |
/// | NearLossless | lossy    | 95      |
/// | HighQuality  | lossy    | 90      |
/// | Balanced     | auto     | 80      |
/// | SmallFile    | lossy    | 60      |
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum QualityPreset {
    Lossless,
    /// Visually indistinguishable from source.
    NearLossless,
    HighQuality,
    /// Lossless for flat graphics, lossy for photos.
    Balanced,
    SmallFile,
    /// Explicit lossy quality (0-100), passed through.
    Custom(f32),
}

impl QualityPreset {
    /// Mode this preset encodes with.
    pub fn mode(self) -> EncodeMode {
        match self {
            QualityPreset::Lossless => EncodeMode::Lossless,
            QualityPreset::NearLossless => EncodeMode::Lossy { quality: 95.0 },
            QualityPreset::HighQuality => EncodeMode::Lossy { quality: 90.0 },
            QualityPreset::Balanced => EncodeMode::Auto,
            QualityPreset::SmallFile => EncodeMode::Lossy { quality: 60.0 },
            QualityPreset::Custom(quality) => EncodeMode::Lossy { quality },
        }
    }

    /// Lossy quality, also used by `Auto` when it falls back to lossy.
    pub fn quality(self) -> Option<f32> {
        match self {
            QualityPreset::Lossless => None,
            QualityPreset::Balanced => Some(80.0),
            other => match other.mode() {
                EncodeMode::Lossy { quality } => Some(quality),
                _ => None,
            },
        }
    }

    /// Parses a preset name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "lossless" => QualityPreset::Lossless,
            "near-lossless" => QualityPreset::NearLossless,
            "high" | "high-quality" => QualityPreset::HighQuality,
            "balanced" => QualityPreset::Balanced,
            "small" | "small-file" => QualityPreset::SmallFile,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_has_no_quality() {
        assert_eq!(QualityPreset::Lossless.mode(), EncodeMode::Lossless);
        assert_eq!(QualityPreset::Lossless.quality(), None);
    }

    #[test]
    fn balanced_is_auto() {
        assert_eq!(QualityPreset::Balanced.mode(), EncodeMode::Auto);
        assert_eq!(QualityPreset::Balanced.quality(), Some(80.0));
    }

    #[test]
    fn custom_passthrough() {
        assert_eq!(QualityPreset::Custom(42.0).mode(), EncodeMode::Lossy { quality: 42.0 });
        assert_eq!(QualityPreset::Custom(42.0).quality(), Some(42.0));
    }

    #[test]
    fn names() {
        assert_eq!(QualityPreset::from_name("small"), Some(QualityPreset::SmallFile));
        assert_eq!(QualityPreset::from_name("near-lossless"), Some(QualityPreset::NearLossless));
        assert_eq!(QualityPreset::from_name("potato"), None);
    }
}
