/// One rung of the re-encode ladder: a target bounding box plus JPEG quality.
///
/// Target dimensions describe a box the frame must fit inside, not exact
/// output dimensions; aspect ratio is always preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionProfile {
    target_width: u32,
    target_height: u32,
    quality: u8,
}

impl CompressionProfile {
    pub const fn new(target_width: u32, target_height: u32, quality: u8) -> Self {
        Self {
            target_width,
            target_height,
            quality,
        }
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Output dimensions for a source of the given size: uniform scale
    /// `min(tw/w, th/h)`, clamped to 1.0 so the frame is never enlarged.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (width, height);
        }
        let ratio = (self.target_width as f64 / width as f64)
            .min(self.target_height as f64 / height as f64)
            .min(1.0);
        let out_w = ((width as f64 * ratio).round() as u32).max(1);
        let out_h = ((height as f64 * ratio).round() as u32).max(1);
        (out_w, out_h)
    }
}
