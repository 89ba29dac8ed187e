//! Mip chain generation.
//!
//! Each level is produced from the previous one by [`Surface::downsample`]
//! until the 1×1 level is reached. Surfaces tagged as normal maps are
//! renormalized after every downsample.

use crate::surface::Surface;

/// Number of levels in a full chain for the given dimensions.
///
/// `⌊log2(max(width, height))⌋ + 1`, so 256×256 has 9 levels and a
/// non-power-of-two 300×300 has 9 as well.
///
/// # Arguments
///
/// * `width` - Width of level 0, must be non-zero
/// * `height` - Height of level 0, must be non-zero
pub fn mip_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Dimension of mip level `level` for a level-0 dimension `size`.
pub fn mip_dimension(size: u32, level: u32) -> u32 {
    size.checked_shr(level).unwrap_or(0).max(1)
}

/// An ordered mip pyramid, level 0 first, ending at 1×1.
#[derive(Debug, Clone)]
pub struct MipChain {
    levels: Vec<Surface>,
}

impl MipChain {
    /// Build the full chain from a level-0 surface.
    ///
    /// Renormalization follows the surface's own normal-map flag.
    pub fn build(base: Surface) -> Self {
        let renormalize = base.is_normal_map();
        Self::build_with(base, renormalize)
    }

    /// Build the full chain, renormalizing downsampled levels when requested.
    pub fn build_with(base: Surface, renormalize: bool) -> Self {
        let count = mip_count(base.width(), base.height()) as usize;
        let mut levels = Vec::with_capacity(count);
        levels.push(base);

        while levels.len() < count {
            let Some(previous) = levels.last() else {
                break;
            };
            let mut next = previous.downsample();
            if renormalize {
                next.renormalize();
            }
            levels.push(next);
        }

        tracing::trace!(levels = levels.len(), renormalize, "Built mip chain");

        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Surface] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&Surface> {
        self.levels.get(index)
    }

    pub fn into_levels(self) -> Vec<Surface> {
        self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_mip_count() {
        assert_eq!(mip_count(1, 1), 1);
        assert_eq!(mip_count(2, 2), 2);
        assert_eq!(mip_count(256, 256), 9);
        assert_eq!(mip_count(1024, 16), 11);
        assert_eq!(mip_count(300, 300), 9);
        assert_eq!(mip_count(65535, 1), 16);
    }

    #[test]
    fn test_mip_dimension() {
        assert_eq!(mip_dimension(256, 0), 256);
        assert_eq!(mip_dimension(256, 3), 32);
        assert_eq!(mip_dimension(256, 9), 1);
        assert_eq!(mip_dimension(4, 40), 1);
    }

    #[test]
    fn test_chain_ends_at_one_by_one() {
        let chain = MipChain::build(Surface::new(256, 256));
        assert_eq!(chain.len(), 9);
        let last = chain.levels().last().unwrap();
        assert_eq!((last.width(), last.height()), (1, 1));
        for (i, level) in chain.levels().iter().enumerate() {
            assert_eq!(level.width(), 256 >> i);
        }
    }

    #[test]
    fn test_chain_non_square() {
        let chain = MipChain::build(Surface::new(16, 4));
        let sizes: Vec<_> = chain
            .levels()
            .iter()
            .map(|l| (l.width(), l.height()))
            .collect();
        assert_eq!(sizes, vec![(16, 4), (8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_normal_chain_is_renormalized() {
        // Two opposite tilts average to a short vector that must be renormalized.
        let tilt = 0.3f32;
        let a = glam::Vec3::new(tilt, 0.0, 1.0).normalize() * 0.5 + 0.5;
        let b = glam::Vec3::new(-tilt, 0.0, 1.0).normalize() * 0.5 + 0.5;
        let pixels = vec![a.extend(1.0), b.extend(1.0), a.extend(1.0), b.extend(1.0)];
        let base = Surface::from_pixels(2, 2, pixels)
            .unwrap()
            .with_normal_map(true);

        let chain = MipChain::build(base);
        let top = chain.level(1).unwrap().pixel(0, 0);
        let unpacked = top.truncate() * 2.0 - 1.0;
        assert!((unpacked.length() - 1.0).abs() < 1e-5);
        assert!((top.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_plain_chain_is_not_renormalized() {
        let base = Surface::from_pixels(2, 1, vec![Vec4::splat(0.25), Vec4::splat(0.75)]).unwrap();
        let chain = MipChain::build(base);
        assert_eq!(chain.level(1).unwrap().pixel(0, 0), Vec4::splat(0.5));
    }
}
