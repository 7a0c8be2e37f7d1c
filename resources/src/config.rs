//! Cache sizing.

use crate::error::ResourceError;

/// Fixed sizes of the texture and model pools.
///
/// Pools are preallocated once and never grow; loading more distinct paths
/// than a pool holds fails with an exhausted error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Texture pool slots.
    pub texture_capacity: usize,
    /// Model pool slots.
    pub model_capacity: usize,
    /// Texture hash buckets.
    pub texture_buckets: usize,
    /// Model hash buckets.
    pub model_buckets: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            texture_capacity: 512,
            model_capacity: 512,
            texture_buckets: 16,
            model_buckets: 16,
        }
    }
}

impl CacheConfig {
    /// Set both pool capacities.
    pub fn with_capacity(mut self, textures: usize, models: usize) -> Self {
        self.texture_capacity = textures;
        self.model_capacity = models;
        self
    }

    /// Set both bucket counts.
    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.texture_buckets = buckets;
        self.model_buckets = buckets;
        self
    }

    /// Reject zero-sized pools and tables.
    pub fn validate(&self) -> Result<(), ResourceError> {
        let fields = [
            ("texture_capacity", self.texture_capacity),
            ("model_capacity", self.model_capacity),
            ("texture_buckets", self.texture_buckets),
            ("model_buckets", self.model_buckets),
        ];
        for (name, value) in fields {
            check_size(name, value)?;
        }
        Ok(())
    }
}

/// A pool or bucket count must be nonzero and fit a handle index.
pub(crate) fn check_size(name: &str, value: usize) -> Result<(), ResourceError> {
    if value == 0 {
        return Err(ResourceError::InvalidConfig(format!("{name} must be nonzero")).report());
    }
    if u32::try_from(value).is_err() {
        return Err(ResourceError::InvalidConfig(format!("{name} {value} exceeds u32")).report());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.texture_capacity, 512);
        assert_eq!(config.model_buckets, 16);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(CacheConfig::default().with_capacity(0, 4))]
    #[case(CacheConfig::default().with_capacity(4, 0))]
    #[case(CacheConfig::default().with_buckets(0))]
    fn test_zero_sizes_rejected(#[case] config: CacheConfig) {
        assert!(matches!(
            config.validate(),
            Err(ResourceError::InvalidConfig(_))
        ));
    }
}
