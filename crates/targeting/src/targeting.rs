//! Targeting Value Model
//!
//! Typed values for every targeting dimension, the `values`/`alternatives`
//! pair attached to artifacts, and the per-artifact targeting record.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetingError};

/// Targeting dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetingDimension {
    Abi,
    MultiAbi,
    ScreenDensity,
    TextureCompressionFormat,
    SdkVersion,
    DeviceTier,
    DeviceGroup,
    DeviceFeature,
    Language,
    CountrySet,
}

impl TargetingDimension {
    /// Canonical dimension order, used for every iteration over dimensions
    pub const ALL: [TargetingDimension; 10] = [
        TargetingDimension::Abi,
        TargetingDimension::MultiAbi,
        TargetingDimension::ScreenDensity,
        TargetingDimension::TextureCompressionFormat,
        TargetingDimension::SdkVersion,
        TargetingDimension::DeviceTier,
        TargetingDimension::DeviceGroup,
        TargetingDimension::DeviceFeature,
        TargetingDimension::Language,
        TargetingDimension::CountrySet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetingDimension::Abi => "ABI",
            TargetingDimension::MultiAbi => "MULTI_ABI",
            TargetingDimension::ScreenDensity => "SCREEN_DENSITY",
            TargetingDimension::TextureCompressionFormat => "TEXTURE_COMPRESSION_FORMAT",
            TargetingDimension::SdkVersion => "SDK_VERSION",
            TargetingDimension::DeviceTier => "DEVICE_TIER",
            TargetingDimension::DeviceGroup => "DEVICE_GROUP",
            TargetingDimension::DeviceFeature => "DEVICE_FEATURE",
            TargetingDimension::Language => "LANGUAGE",
            TargetingDimension::CountrySet => "COUNTRY_SET",
        }
    }

    /// Dimensions where a device installs at most one of several sibling
    /// values. Languages and groups can be co-installed.
    pub fn is_exclusive(&self) -> bool {
        !matches!(
            self,
            TargetingDimension::Language
                | TargetingDimension::DeviceGroup
                | TargetingDimension::DeviceFeature
        )
    }
}

impl fmt::Display for TargetingDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetingDimension {
    type Err = TargetingError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        TargetingDimension::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == normalized || (normalized == "SDK" && *d == TargetingDimension::SdkVersion))
            .ok_or_else(|| TargetingError::InvariantViolation(format!("unknown dimension '{}'", s)))
    }
}

// ---------------------------------------------------------------------------
// Dimension values
// ---------------------------------------------------------------------------

/// Native ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Abi {
    #[serde(rename = "armeabi")]
    Armeabi,
    #[serde(rename = "armeabi-v7a")]
    ArmeabiV7a,
    #[serde(rename = "arm64-v8a")]
    Arm64V8a,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "mips")]
    Mips,
    #[serde(rename = "mips64")]
    Mips64,
    #[serde(rename = "riscv64")]
    Riscv64,
}

impl Abi {
    pub fn as_str(&self) -> &'static str {
        match self {
            Abi::Armeabi => "armeabi",
            Abi::ArmeabiV7a => "armeabi-v7a",
            Abi::Arm64V8a => "arm64-v8a",
            Abi::X86 => "x86",
            Abi::X86_64 => "x86_64",
            Abi::Mips => "mips",
            Abi::Mips64 => "mips64",
            Abi::Riscv64 => "riscv64",
        }
    }

    pub fn all() -> &'static [Abi] {
        &[
            Abi::Armeabi,
            Abi::ArmeabiV7a,
            Abi::Arm64V8a,
            Abi::X86,
            Abi::X86_64,
            Abi::Mips,
            Abi::Mips64,
            Abi::Riscv64,
        ]
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Abi {
    type Err = TargetingError;

    fn from_str(s: &str) -> Result<Self> {
        Abi::all()
            .iter()
            .copied()
            .find(|abi| abi.as_str() == s)
            .ok_or_else(|| TargetingError::UnknownValue {
                dimension: TargetingDimension::Abi,
                value: s.to_string(),
            })
    }
}

/// A set of ABIs shipped together in one multi-ABI APK
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiAbi {
    pub abis: BTreeSet<Abi>,
}

impl MultiAbi {
    pub fn new(abis: impl IntoIterator<Item = Abi>) -> Self {
        Self {
            abis: abis.into_iter().collect(),
        }
    }
}

impl fmt::Display for MultiAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.abis.iter().map(|a| a.as_str()).collect();
        write!(f, "{}", names.join("+"))
    }
}

/// Named screen density buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityAlias {
    Ldpi,
    Mdpi,
    Tvdpi,
    Hdpi,
    Xhdpi,
    Xxhdpi,
    Xxxhdpi,
}

impl DensityAlias {
    pub fn dpi(&self) -> u32 {
        match self {
            DensityAlias::Ldpi => 120,
            DensityAlias::Mdpi => 160,
            DensityAlias::Tvdpi => 213,
            DensityAlias::Hdpi => 240,
            DensityAlias::Xhdpi => 320,
            DensityAlias::Xxhdpi => 480,
            DensityAlias::Xxxhdpi => 640,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DensityAlias::Ldpi => "ldpi",
            DensityAlias::Mdpi => "mdpi",
            DensityAlias::Tvdpi => "tvdpi",
            DensityAlias::Hdpi => "hdpi",
            DensityAlias::Xhdpi => "xhdpi",
            DensityAlias::Xxhdpi => "xxhdpi",
            DensityAlias::Xxxhdpi => "xxxhdpi",
        }
    }

    /// Buckets a density splitter generates, in generation order
    pub fn buckets() -> &'static [DensityAlias] {
        &[
            DensityAlias::Ldpi,
            DensityAlias::Mdpi,
            DensityAlias::Hdpi,
            DensityAlias::Xhdpi,
            DensityAlias::Xxhdpi,
            DensityAlias::Xxxhdpi,
            DensityAlias::Tvdpi,
        ]
    }

    pub fn from_dpi(dpi: u32) -> Option<DensityAlias> {
        Self::buckets().iter().copied().find(|a| a.dpi() == dpi)
    }
}

/// Screen density, either a bucket alias or a raw dpi value. Compared by
/// dpi, so `Alias(Hdpi)` and `Dpi(240)` are the same density.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenDensity {
    Alias(DensityAlias),
    Dpi(u32),
}

impl PartialEq for ScreenDensity {
    fn eq(&self, other: &Self) -> bool {
        self.dpi() == other.dpi()
    }
}

impl Eq for ScreenDensity {}

impl PartialOrd for ScreenDensity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScreenDensity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dpi().cmp(&other.dpi())
    }
}

impl std::hash::Hash for ScreenDensity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.dpi().hash(state);
    }
}

impl ScreenDensity {
    pub fn dpi(&self) -> u32 {
        match self {
            ScreenDensity::Alias(alias) => alias.dpi(),
            ScreenDensity::Dpi(dpi) => *dpi,
        }
    }
}

impl From<DensityAlias> for ScreenDensity {
    fn from(alias: DensityAlias) -> Self {
        ScreenDensity::Alias(alias)
    }
}

impl fmt::Display for ScreenDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenDensity::Alias(alias) => f.write_str(alias.as_str()),
            ScreenDensity::Dpi(dpi) => write!(f, "{}dpi", dpi),
        }
    }
}

/// Texture compression format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TextureCompressionFormat {
    #[serde(rename = "etc1_rgb8")]
    Etc1Rgb8,
    #[serde(rename = "paletted")]
    Paletted,
    #[serde(rename = "3dc")]
    ThreeDc,
    #[serde(rename = "atc")]
    Atc,
    #[serde(rename = "latc")]
    Latc,
    #[serde(rename = "dxt1")]
    Dxt1,
    #[serde(rename = "s3tc")]
    S3tc,
    #[serde(rename = "pvrtc")]
    Pvrtc,
    #[serde(rename = "astc")]
    Astc,
    #[serde(rename = "etc2")]
    Etc2,
}

impl TextureCompressionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureCompressionFormat::Etc1Rgb8 => "etc1_rgb8",
            TextureCompressionFormat::Paletted => "paletted",
            TextureCompressionFormat::ThreeDc => "3dc",
            TextureCompressionFormat::Atc => "atc",
            TextureCompressionFormat::Latc => "latc",
            TextureCompressionFormat::Dxt1 => "dxt1",
            TextureCompressionFormat::S3tc => "s3tc",
            TextureCompressionFormat::Pvrtc => "pvrtc",
            TextureCompressionFormat::Astc => "astc",
            TextureCompressionFormat::Etc2 => "etc2",
        }
    }

    /// Canonical preference order, most preferred first
    pub fn default_preference() -> &'static [TextureCompressionFormat] {
        &[
            TextureCompressionFormat::Astc,
            TextureCompressionFormat::Pvrtc,
            TextureCompressionFormat::S3tc,
            TextureCompressionFormat::Dxt1,
            TextureCompressionFormat::Latc,
            TextureCompressionFormat::Atc,
            TextureCompressionFormat::ThreeDc,
            TextureCompressionFormat::Etc2,
            TextureCompressionFormat::Etc1Rgb8,
            TextureCompressionFormat::Paletted,
        ]
    }

    /// GL extensions advertising support for this format
    pub fn gl_extensions(&self) -> &'static [&'static str] {
        match self {
            TextureCompressionFormat::Etc1Rgb8 => &["GL_OES_compressed_ETC1_RGB8_texture"],
            TextureCompressionFormat::Paletted => &["GL_OES_compressed_paletted_texture"],
            TextureCompressionFormat::ThreeDc => &["GL_AMD_compressed_3DC_texture"],
            TextureCompressionFormat::Atc => &[
                "GL_AMD_compressed_ATC_texture",
                "GL_ATI_texture_compression_atitc",
            ],
            TextureCompressionFormat::Latc => &[
                "GL_EXT_texture_compression_latc",
                "GL_NV_texture_compression_latc",
            ],
            TextureCompressionFormat::Dxt1 => &[
                "GL_EXT_texture_compression_dxt1",
                "GL_EXT_texture_compression_s3tc",
            ],
            TextureCompressionFormat::S3tc => &[
                "GL_EXT_texture_compression_s3tc",
                "GL_WEBGL_compressed_texture_s3tc",
            ],
            TextureCompressionFormat::Pvrtc => &["GL_IMG_texture_compression_pvrtc"],
            TextureCompressionFormat::Astc => &["GL_KHR_texture_compression_astc_ldr"],
            // Implied by OpenGL ES 3.0, never advertised as an extension.
            TextureCompressionFormat::Etc2 => &[],
        }
    }
}

impl fmt::Display for TextureCompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextureCompressionFormat {
    type Err = TargetingError;

    fn from_str(s: &str) -> Result<Self> {
        TextureCompressionFormat::default_preference()
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TargetingError::UnknownValue {
                dimension: TargetingDimension::TextureCompressionFormat,
                value: s.to_string(),
            })
    }
}

/// Lower SDK bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SdkVersion {
    pub min: u32,
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+", self.min)
    }
}

/// Required device feature; OpenGL ES is carried as a versioned feature
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceFeature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl DeviceFeature {
    pub const GL_ES_VERSION: &'static str = "reqGlEsVersion";

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn gl_es_version(version: u32) -> Self {
        Self {
            name: Self::GL_ES_VERSION.to_string(),
            version: Some(version),
        }
    }
}

impl fmt::Display for DeviceFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}=0x{:x}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// A named group of countries
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountrySet {
    pub name: String,
    pub countries: BTreeSet<String>,
}

impl CountrySet {
    pub fn new(name: impl Into<String>, countries: &[&str]) -> Self {
        Self {
            name: name.into(),
            countries: countries.iter().map(|c| c.to_ascii_uppercase()).collect(),
        }
    }

    pub fn contains(&self, country: &str) -> bool {
        self.countries.contains(&country.to_ascii_uppercase())
    }
}

impl fmt::Display for CountrySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Values / alternatives
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Ord + Deserialize<'de>"))]
struct RawTargetingValue<T> {
    #[serde(default)]
    values: BTreeSet<T>,
    #[serde(default)]
    alternatives: BTreeSet<T>,
}

/// Values claimed by an artifact and the alternatives claimed by better
/// siblings. Disjoint by construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "RawTargetingValue<T>",
    bound(
        serialize = "T: Serialize",
        deserialize = "T: Ord + std::fmt::Debug + Deserialize<'de>"
    )
)]
pub struct TargetingValue<T> {
    values: BTreeSet<T>,
    alternatives: BTreeSet<T>,
}

impl<T: Ord> Default for TargetingValue<T> {
    fn default() -> Self {
        Self {
            values: BTreeSet::new(),
            alternatives: BTreeSet::new(),
        }
    }
}

impl<T: Ord + fmt::Debug> TryFrom<RawTargetingValue<T>> for TargetingValue<T> {
    type Error = TargetingError;

    fn try_from(raw: RawTargetingValue<T>) -> Result<Self> {
        TargetingValue::new(raw.values, raw.alternatives)
    }
}

impl<T> TargetingValue<T> {
    pub fn values(&self) -> &BTreeSet<T> {
        &self.values
    }

    pub fn alternatives(&self) -> &BTreeSet<T> {
        &self.alternatives
    }

    /// No targeting in this dimension
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.alternatives.is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        self.values.is_empty() && !self.alternatives.is_empty()
    }

    /// Values and alternatives together
    pub fn universe(&self) -> impl Iterator<Item = &T> {
        self.values.iter().chain(self.alternatives.iter())
    }
}

impl<T: Ord + fmt::Debug> TargetingValue<T> {
    /// Create targeting, rejecting overlapping values and alternatives
    pub fn new(
        values: impl IntoIterator<Item = T>,
        alternatives: impl IntoIterator<Item = T>,
    ) -> Result<Self> {
        let values: BTreeSet<T> = values.into_iter().collect();
        let alternatives: BTreeSet<T> = alternatives.into_iter().collect();
        if let Some(shared) = values.intersection(&alternatives).next() {
            return Err(TargetingError::InvariantViolation(format!(
                "{:?} is both a value and an alternative",
                shared
            )));
        }
        Ok(Self {
            values,
            alternatives,
        })
    }

    /// Targeting that claims `values` with no competing siblings
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
            alternatives: BTreeSet::new(),
        }
    }

    /// Fallback targeting: claims nothing, defers to `alternatives`
    pub fn fallback(alternatives: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: BTreeSet::new(),
            alternatives: alternatives.into_iter().collect(),
        }
    }

    pub fn builder() -> TargetingValueBuilder<T> {
        TargetingValueBuilder::default()
    }

    /// True when a device can never need both artifacts: each claims a
    /// different value, or one is the fallback for what the other claims.
    pub fn excludes(&self, other: &TargetingValue<T>) -> bool {
        if self.values.is_empty() && other.values.is_empty() {
            return false;
        }
        if !self.values.is_empty() && !other.values.is_empty() {
            return self.values != other.values;
        }
        let (fallback, claimed) = if self.values.is_empty() { (self, other) } else { (other, self) };
        !fallback.alternatives.is_empty() && claimed.values.is_subset(&fallback.alternatives)
    }
}

impl<T: Ord + Clone + fmt::Debug> TargetingValue<T> {
    /// Union over many artifacts' targeting: every claimed value, plus every
    /// alternative nobody claims.
    pub fn union_of<'a>(targetings: impl IntoIterator<Item = &'a TargetingValue<T>>) -> Self
    where
        T: 'a,
    {
        let mut values = BTreeSet::new();
        let mut alternatives = BTreeSet::new();
        for targeting in targetings {
            values.extend(targeting.values.iter().cloned());
            alternatives.extend(targeting.alternatives.iter().cloned());
        }
        alternatives.retain(|v| !values.contains(v));
        Self {
            values,
            alternatives,
        }
    }
}

impl<T: fmt::Display> TargetingValue<T> {
    /// Values as display strings, for labels and messages
    pub fn value_labels(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }

    pub fn universe_labels(&self) -> Vec<String> {
        self.values
            .iter()
            .chain(self.alternatives.iter())
            .map(|v| v.to_string())
            .collect()
    }
}

/// Incremental construction of a [`TargetingValue`]
#[derive(Debug)]
pub struct TargetingValueBuilder<T> {
    values: Vec<T>,
    alternatives: Vec<T>,
}

impl<T> Default for TargetingValueBuilder<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            alternatives: Vec::new(),
        }
    }
}

impl<T: Ord + fmt::Debug> TargetingValueBuilder<T> {
    pub fn value(mut self, value: T) -> Self {
        self.values.push(value);
        self
    }

    pub fn alternative(mut self, alternative: T) -> Self {
        self.alternatives.push(alternative);
        self
    }

    pub fn alternatives(mut self, alternatives: impl IntoIterator<Item = T>) -> Self {
        self.alternatives.extend(alternatives);
        self
    }

    pub fn build(self) -> Result<TargetingValue<T>> {
        TargetingValue::new(self.values, self.alternatives)
    }
}

// ---------------------------------------------------------------------------
// Artifact targeting record
// ---------------------------------------------------------------------------

/// Per-dimension targeting of one artifact. Empty dimensions match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Targeting {
    pub abi: TargetingValue<Abi>,
    pub multi_abi: TargetingValue<MultiAbi>,
    pub screen_density: TargetingValue<ScreenDensity>,
    pub texture_compression_format: TargetingValue<TextureCompressionFormat>,
    pub sdk_version: TargetingValue<SdkVersion>,
    pub device_tier: TargetingValue<i32>,
    pub device_group: TargetingValue<String>,
    pub device_feature: TargetingValue<DeviceFeature>,
    pub language: TargetingValue<String>,
    pub country_set: TargetingValue<CountrySet>,
}

/// Setters and per-dimension dispatch over the `Targeting` fields
macro_rules! targeting_dimensions {
    ($($field:ident: $ty:ty => $dimension:ident, $setter:ident;)*) => {
        impl Targeting {
            $(
                pub fn $setter(mut self, targeting: TargetingValue<$ty>) -> Self {
                    self.$field = targeting;
                    self
                }
            )*

            /// Whether the record carries any targeting in `dimension`
            pub fn is_targeted(&self, dimension: TargetingDimension) -> bool {
                match dimension {
                    $(TargetingDimension::$dimension => !self.$field.is_empty(),)*
                }
            }

            /// Combine with targeting for other dimensions. Both sides
            /// targeting the same dimension differently is a bug in the caller.
            pub fn merged_with(&self, other: &Targeting) -> Result<Targeting> {
                Ok(Targeting {
                    $($field: merge_dimension(&self.$field, &other.$field, TargetingDimension::$dimension)?,)*
                })
            }

            /// Targeting carrying only `dimension`, unioned over `targetings`
            pub fn union_in(dimension: TargetingDimension, targetings: &[&Targeting]) -> Targeting {
                let mut union = Targeting::default();
                match dimension {
                    $(TargetingDimension::$dimension => {
                        union.$field = TargetingValue::union_of(targetings.iter().map(|t| &t.$field))
                    })*
                }
                union
            }
        }
    };
}

targeting_dimensions! {
    abi: Abi => Abi, with_abi;
    multi_abi: MultiAbi => MultiAbi, with_multi_abi;
    screen_density: ScreenDensity => ScreenDensity, with_screen_density;
    texture_compression_format: TextureCompressionFormat => TextureCompressionFormat, with_texture_compression_format;
    sdk_version: SdkVersion => SdkVersion, with_sdk_version;
    device_tier: i32 => DeviceTier, with_device_tier;
    device_group: String => DeviceGroup, with_device_group;
    device_feature: DeviceFeature => DeviceFeature, with_device_feature;
    language: String => Language, with_language;
    country_set: CountrySet => CountrySet, with_country_set;
}

impl Targeting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targeted_dimensions(&self) -> Vec<TargetingDimension> {
        TargetingDimension::ALL
            .iter()
            .copied()
            .filter(|d| self.is_targeted(*d))
            .collect()
    }

    pub fn is_untargeted(&self) -> bool {
        self.targeted_dimensions().is_empty()
    }

    /// Checks invariants that the value pair alone cannot express
    pub fn validate(&self) -> Result<()> {
        if self.sdk_version.values().len() > 1 {
            return Err(TargetingError::InvariantViolation(format!(
                "SDK targeting may hold at most one lower bound, found {}",
                self.sdk_version.values().len()
            )));
        }
        Ok(())
    }

    /// True when no device would ever install both artifacts
    pub fn is_mutually_exclusive_with(&self, other: &Targeting) -> bool {
        TargetingDimension::ALL
            .iter()
            .filter(|d| d.is_exclusive())
            .any(|d| match d {
                TargetingDimension::Abi => self.abi.excludes(&other.abi),
                TargetingDimension::MultiAbi => self.multi_abi.excludes(&other.multi_abi),
                TargetingDimension::ScreenDensity => self.screen_density.excludes(&other.screen_density),
                TargetingDimension::TextureCompressionFormat => self
                    .texture_compression_format
                    .excludes(&other.texture_compression_format),
                TargetingDimension::SdkVersion => self.sdk_version.excludes(&other.sdk_version),
                TargetingDimension::DeviceTier => self.device_tier.excludes(&other.device_tier),
                TargetingDimension::CountrySet => self.country_set.excludes(&other.country_set),
                _ => false,
            })
    }
}

fn merge_dimension<T: Ord + Clone + fmt::Debug>(
    left: &TargetingValue<T>,
    right: &TargetingValue<T>,
    dimension: TargetingDimension,
) -> Result<TargetingValue<T>> {
    match (left.is_empty(), right.is_empty()) {
        (_, true) => Ok(left.clone()),
        (true, false) => Ok(right.clone()),
        (false, false) if left == right => Ok(left.clone()),
        _ => Err(TargetingError::InvariantViolation(format!(
            "conflicting {} targeting: {:?} vs {:?}",
            dimension,
            left.values(),
            right.values()
        ))),
    }
}
