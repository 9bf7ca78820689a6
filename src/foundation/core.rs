use crate::foundation::error::{RestorableError, RestorableResult};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Axis-aligned pixel rectangle `[x, x + width) x [y, y + height)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Region {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Create a region from its origin and size.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering a whole `width x height` surface.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    pub fn right(self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Return `true` when the region covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn area(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Size in bytes of a tightly packed RGBA8 buffer for this region.
    pub fn byte_len(self) -> usize {
        self.area().saturating_mul(BYTES_PER_PIXEL)
    }

    /// Return `true` when `other` lies entirely inside `self`.
    pub fn contains_region(self, other: Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Return `true` when pixel `(x, y)` lies inside the region.
    pub fn contains_pixel(self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && u64::from(x) < self.right() && u64::from(y) < self.bottom()
    }

    /// Overlapping part of two regions, if any.
    pub fn intersect(self, other: Region) -> Option<Region> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if u64::from(x0) >= x1 || u64::from(y0) >= y1 {
            return None;
        }
        Some(Region::new(x0, y0, (x1 - u64::from(x0)) as u32, (y1 - u64::from(y0)) as u32))
    }

    /// Return `true` when the two regions share at least one pixel.
    pub fn intersects(self, other: Region) -> bool {
        self.intersect(other).is_some()
    }

    /// Fail with [`RestorableError::Bounds`] unless `self` fits in a `width x height` surface.
    pub(crate) fn ensure_within(self, width: u32, height: u32, what: &str) -> RestorableResult<()> {
        if !Region::from_size(width, height).contains_region(self) {
            return Err(RestorableError::bounds(format!(
                "{what} {self:?} exceeds {width}x{height} bounds"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
