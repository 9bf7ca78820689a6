use crate::foundation::core::{BYTES_PER_PIXEL, Region};
use crate::graphics::driver::{GraphicsDriver, SurfaceHandle};

/// CPU-side copy of an image's base pixels.
///
/// `data == None` means nothing was ever written: the base state is fully transparent.
/// The cache is authoritative when it alone describes the image's visible contents, i.e. no
/// draw has been applied on top of it since the last capture.
#[derive(Clone, Debug)]
pub(crate) struct PixelCache {
    width: u32,
    height: u32,
    data: Option<Vec<u8>>,
    authoritative: bool,
}

impl PixelCache {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: None,
            authoritative: true,
        }
    }

    pub(crate) fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    pub(crate) fn invalidate(&mut self) {
        self.authoritative = false;
    }

    pub(crate) fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Take `pixels` (whole image) as the new authoritative base.
    pub(crate) fn replace_all(&mut self, pixels: Vec<u8>) {
        debug_assert_eq!(
            pixels.len(),
            Region::from_size(self.width, self.height).byte_len()
        );
        self.data = Some(pixels);
        self.authoritative = true;
    }

    /// Overwrite `region` of the base. Authority is left as is.
    pub(crate) fn write_region(&mut self, pixels: &[u8], region: Region) {
        let row = region.width as usize * BYTES_PER_PIXEL;
        if region.is_empty() {
            return;
        }
        let full = Region::from_size(self.width, self.height).byte_len();
        let width = self.width as usize;
        let data = self.data.get_or_insert_with(|| vec![0; full]);
        for (j, src_row) in pixels.chunks_exact(row).enumerate() {
            let y = region.y as usize + j;
            let start = (y * width + region.x as usize) * BYTES_PER_PIXEL;
            data[start..start + row].copy_from_slice(src_row);
        }
    }

    /// Copy `region` out of the base; unwritten bases read as transparent.
    pub(crate) fn read_region(&self, region: Region) -> Vec<u8> {
        let Some(data) = &self.data else {
            return vec![0; region.byte_len()];
        };
        let row = region.width as usize * BYTES_PER_PIXEL;
        let mut out = Vec::with_capacity(region.byte_len());
        for y in region.y..region.y + region.height {
            let start = (y as usize * self.width as usize + region.x as usize) * BYTES_PER_PIXEL;
            out.extend_from_slice(&data[start..start + row]);
        }
        out
    }

    /// Push the base onto a freshly allocated (transparent) surface.
    pub(crate) fn upload<D: GraphicsDriver + ?Sized>(
        &self,
        driver: &mut D,
        surface: SurfaceHandle,
    ) -> anyhow::Result<()> {
        match &self.data {
            Some(data) => {
                driver.write_pixels(surface, data, Region::from_size(self.width, self.height))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/pixels.rs"]
mod tests;
