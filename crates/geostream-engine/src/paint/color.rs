/// Straight-alpha RGBA color with `f32` channels in `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Converts to normalized bytes, the layout of a `Unorm8x4` color stream.
    #[inline]
    pub fn to_u8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// `vec4<f32>` layout for uniform blocks.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Clear color for render pass load ops.
    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_conversion_keeps_extremes() {
        assert_eq!(Color::rgb(1.0, 0.0, 0.0).to_u8(), [255, 0, 0, 255]);
        assert_eq!(Color::WHITE.to_u8(), [255; 4]);
    }

    #[test]
    fn to_u8_clamps_out_of_range_channels() {
        assert_eq!(Color::rgba(2.0, -1.0, 0.5, 1.0).to_u8(), [255, 0, 128, 255]);
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = Color::rgb(0.1, 0.2, 0.3).with_alpha(0.5);
        assert_eq!(c.to_array(), [0.1, 0.2, 0.3, 0.5]);
    }
}
