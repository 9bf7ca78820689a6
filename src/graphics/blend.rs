use crate::foundation::core::PremulRgba8;
use crate::foundation::math::mul_div255_u8;

/// Blend equation applied when a draw writes into its target.
///
/// All modes operate on premultiplied RGBA8.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Result is transparent regardless of inputs.
    Clear,
    /// Source replaces destination.
    Copy,
    /// Porter-Duff source-over.
    #[default]
    SourceOver,
    /// Porter-Duff destination-over.
    DestinationOver,
    /// Saturating addition.
    Lighter,
}

impl BlendMode {
    /// Combine `src` into `dst`.
    pub fn apply(self, dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
        match self {
            BlendMode::Clear => [0; 4],
            BlendMode::Copy => src,
            BlendMode::SourceOver => over(dst, src),
            BlendMode::DestinationOver => over(src, dst),
            BlendMode::Lighter => [
                dst[0].saturating_add(src[0]),
                dst[1].saturating_add(src[1]),
                dst[2].saturating_add(src[2]),
                dst[3].saturating_add(src[3]),
            ],
        }
    }
}

fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/graphics/blend.rs"]
mod tests;
