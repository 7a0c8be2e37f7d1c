//! Sampler types and descriptors.

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    #[default]
    Nearest,
    /// Linear filtering.
    Linear,
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
}

/// Descriptor for the sampling state attached to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerDescriptor {
    /// Address mode for U coordinate.
    pub address_mode_u: AddressMode,
    /// Address mode for V coordinate.
    pub address_mode_v: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
}

impl SamplerDescriptor {
    /// The fixed policy used for every cached asset texture: repeat on both
    /// axes, linear minification, nearest magnification.
    pub fn cache_default() -> Self {
        Self {
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Linear,
        }
    }

    /// Set address mode for all coordinates.
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode_u = mode;
        self.address_mode_v = mode;
        self
    }
}
