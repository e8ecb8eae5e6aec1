//! Texture compression format matcher
//!
//! Device support is derived from its GL extensions (ETC2 from the GLES
//! version); preference follows an explicit format order.

use super::{matches_by_ranking, DimensionMatcher};
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{TargetingDimension, TargetingValue, TextureCompressionFormat};

/// OpenGL ES 3.0, which mandates ETC2
const GL_ES_3_0: u32 = 0x30000;

pub struct TextureCompressionFormatMatcher {
    /// Supported formats in preference order
    ranking: Vec<TextureCompressionFormat>,
    probed: bool,
}

impl TextureCompressionFormatMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self::with_preference(device, TextureCompressionFormat::default_preference())
    }

    pub fn with_preference(device: &DeviceSpec, preference: &[TextureCompressionFormat]) -> Self {
        let supported = supported_formats(device);
        let ranking = preference
            .iter()
            .copied()
            .filter(|format| supported.contains(format))
            .collect();
        Self {
            ranking,
            probed: device.gl_extensions.is_some(),
        }
    }

    pub fn supported(&self) -> &[TextureCompressionFormat] {
        &self.ranking
    }
}

/// Formats a device can decode, in no particular order
pub fn supported_formats(device: &DeviceSpec) -> Vec<TextureCompressionFormat> {
    let extensions = device.gl_extensions.as_deref().unwrap_or_default();
    let mut formats: Vec<TextureCompressionFormat> = TextureCompressionFormat::default_preference()
        .iter()
        .copied()
        .filter(|format| {
            format
                .gl_extensions()
                .iter()
                .any(|ext| extensions.iter().any(|e| e == ext))
        })
        .collect();
    if device.gl_es_version().is_some_and(|v| v >= GL_ES_3_0) {
        formats.push(TextureCompressionFormat::Etc2);
    }
    formats
}

impl DimensionMatcher for TextureCompressionFormatMatcher {
    type Value = TextureCompressionFormat;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::TextureCompressionFormat
    }

    fn is_dimension_present(&self) -> bool {
        self.probed
    }

    fn matches(&self, targeting: &TargetingValue<TextureCompressionFormat>) -> bool {
        matches_by_ranking(&self.ranking, targeting)
    }

    fn check_compatible(
        &self,
        targeting: &TargetingValue<TextureCompressionFormat>,
    ) -> Result<(), IncompatibleDevice> {
        if targeting.is_empty()
            || targeting.values().is_empty()
            || targeting.universe().any(|f| self.ranking.contains(f))
        {
            return Ok(());
        }
        Err(self.incompatible(
            targeting,
            "The app has no textures in a compression format supported by the device",
        ))
    }

    fn device_values(&self) -> Vec<String> {
        self.ranking.iter().map(|f| f.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TextureCompressionFormat::*;

    fn device(extensions: &[&str]) -> DeviceSpec {
        DeviceSpec::new().with_gl_extensions(extensions)
    }

    #[test]
    fn test_supported_formats_from_extensions() {
        let spec = device(&["GL_KHR_texture_compression_astc_ldr", "GL_OES_compressed_ETC1_RGB8_texture"])
            .with_device_features(&["reqGlEsVersion=0x30002"]);
        let m = TextureCompressionFormatMatcher::new(&spec);
        assert_eq!(m.supported(), &[Astc, Etc2, Etc1Rgb8]);
    }

    #[test]
    fn test_preferred_supported_format_wins() {
        let m = TextureCompressionFormatMatcher::new(&device(&[
            "GL_KHR_texture_compression_astc_ldr",
            "GL_IMG_texture_compression_pvrtc",
        ]));
        let astc = TargetingValue::new([Astc], [Pvrtc, Etc1Rgb8]).unwrap();
        let pvrtc = TargetingValue::new([Pvrtc], [Astc, Etc1Rgb8]).unwrap();
        assert!(m.matches(&astc));
        assert!(!m.matches(&pvrtc));
    }

    #[test]
    fn test_custom_preference_order() {
        let spec = device(&["GL_KHR_texture_compression_astc_ldr", "GL_IMG_texture_compression_pvrtc"]);
        let m = TextureCompressionFormatMatcher::with_preference(&spec, &[Pvrtc, Astc]);
        let pvrtc = TargetingValue::new([Pvrtc], [Astc]).unwrap();
        assert!(m.matches(&pvrtc));
    }

    #[test]
    fn test_fallback_when_nothing_supported() {
        let m = TextureCompressionFormatMatcher::new(&device(&[]));
        let astc = TargetingValue::new([Astc], [Pvrtc]).unwrap();
        let fallback = TargetingValue::fallback([Astc, Pvrtc]);
        assert!(!m.matches(&astc));
        assert!(m.matches(&fallback));
        assert!(m.check_compatible(&fallback).is_ok());
        assert!(m.check_compatible(&astc).is_err());
    }

    #[test]
    fn test_presence_requires_probe() {
        assert!(!TextureCompressionFormatMatcher::new(&DeviceSpec::new()).is_dimension_present());
        assert!(TextureCompressionFormatMatcher::new(&device(&[])).is_dimension_present());
    }
}
