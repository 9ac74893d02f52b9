use anyhow::{ensure, Result};

/// RGBA8 texture with a view and a linear clamping sampler.
pub struct Texture {
    // Kept alive alongside its view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl Texture {
    /// Uploads `pixels` (tightly packed straight-alpha RGBA8 rows, top row first).
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self> {
        ensure!(width > 0 && height > 0, "texture `{label}` has zero size");
        ensure!(
            pixels.len() as u64 == u64::from(width) * u64::from(height) * 4,
            "texture `{label}`: {} bytes do not match {width}x{height} RGBA8",
            pixels.len()
        );

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = linear_sampler(device, label);

        Ok(Self {
            _texture: texture,
            view,
            sampler,
        })
    }

    /// Two-color checkerboard with `cell`-pixel squares.
    pub fn checkerboard(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        size: u32,
        cell: u32,
        colors: [[u8; 4]; 2],
    ) -> Result<Self> {
        Self::from_rgba8(device, queue, label, size, size, &checkerboard_pixels(size, cell, colors))
    }

    /// Horizontal gradient from `from` (left) to `to` (right).
    pub fn gradient(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        size: u32,
        from: [u8; 4],
        to: [u8; 4],
    ) -> Result<Self> {
        Self::from_rgba8(device, queue, label, size, size, &gradient_pixels(size, from, to))
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

pub(crate) fn linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// Layout for `count` sampled 2D textures (bindings `0..count`) followed by
/// one filtering sampler (binding `count`).
pub fn sampled_layout(device: &wgpu::Device, label: &str, count: u32) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..count)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: count,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &entries,
    })
}

/// Bind group matching [`sampled_layout`] with `views.len()` textures.
pub fn sampled_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    views: &[&wgpu::TextureView],
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let mut entries: Vec<wgpu::BindGroupEntry<'_>> = views
        .iter()
        .enumerate()
        .map(|(i, view)| wgpu::BindGroupEntry {
            binding: i as u32,
            resource: wgpu::BindingResource::TextureView(view),
        })
        .collect();
    entries.push(wgpu::BindGroupEntry {
        binding: views.len() as u32,
        resource: wgpu::BindingResource::Sampler(sampler),
    });

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &entries,
    })
}

pub fn checkerboard_pixels(size: u32, cell: u32, colors: [[u8; 4]; 2]) -> Vec<u8> {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let parity = ((x / cell) + (y / cell)) % 2;
            pixels.extend_from_slice(&colors[parity as usize]);
        }
    }
    pixels
}

pub fn gradient_pixels(size: u32, from: [u8; 4], to: [u8; 4]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    let span = size.saturating_sub(1).max(1) as f32;
    for _ in 0..size {
        for x in 0..size {
            let t = x as f32 / span;
            for c in 0..4 {
                let v = from[c] as f32 + (to[c] as f32 - from[c] as f32) * t;
                pixels.push(v.round() as u8);
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn pixel(pixels: &[u8], size: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * size + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let p = checkerboard_pixels(4, 2, [RED, BLUE]);
        assert_eq!(p.len(), 64);
        assert_eq!(pixel(&p, 4, 0, 0), RED);
        assert_eq!(pixel(&p, 4, 1, 1), RED);
        assert_eq!(pixel(&p, 4, 2, 0), BLUE);
        assert_eq!(pixel(&p, 4, 0, 2), BLUE);
        assert_eq!(pixel(&p, 4, 3, 3), RED);
    }

    #[test]
    fn checkerboard_zero_cell_is_per_pixel() {
        let p = checkerboard_pixels(2, 0, [RED, BLUE]);
        assert_eq!(pixel(&p, 2, 0, 0), RED);
        assert_eq!(pixel(&p, 2, 1, 0), BLUE);
    }

    #[test]
    fn gradient_spans_endpoints() {
        let p = gradient_pixels(3, RED, BLUE);
        assert_eq!(pixel(&p, 3, 0, 1), RED);
        assert_eq!(pixel(&p, 3, 2, 1), BLUE);
        assert_eq!(pixel(&p, 3, 1, 0), [128, 0, 128, 255]);
    }
}
