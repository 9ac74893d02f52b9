use crate::paint::Color;

use super::texture::{linear_sampler, sampled_bind_group, sampled_layout};
use super::RenderCtx;

/// Offscreen framebuffer with several same-sized color attachments.
///
/// Attachment `i` is written by fragment output `@location(i)`. The attachments
/// can be sampled by a later pass through [`Self::bind_group`], whose layout
/// is [`Self::layout`] (textures at bindings `0..n`, sampler at binding `n`).
pub struct OffscreenTarget {
    label: String,
    format: wgpu::TextureFormat,
    attachments: Vec<(wgpu::Texture, wgpu::TextureView)>,
    sampler: wgpu::Sampler,
    layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    size: (u32, u32),
    count: u32,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, label: &str, format: wgpu::TextureFormat, count: u32) -> Self {
        debug_assert!(count > 0);
        Self {
            label: label.to_string(),
            format,
            attachments: Vec::new(),
            sampler: linear_sampler(device, label),
            layout: sampled_layout(device, label, count),
            bind_group: None,
            size: (0, 0),
            count,
        }
    }

    /// Recreates the attachments if the requested size differs from the current one.
    ///
    /// Returns `true` if the attachments were recreated.
    pub fn ensure_size(&mut self, ctx: &RenderCtx<'_>, width: u32, height: u32) -> bool {
        let size = (width.max(1), height.max(1));
        if size == self.size && !self.attachments.is_empty() {
            return false;
        }

        self.attachments = (0..self.count)
            .map(|i| {
                let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("{} attachment {i}", self.label)),
                    size: wgpu::Extent3d {
                        width: size.0,
                        height: size.1,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: self.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                (texture, view)
            })
            .collect();

        let views: Vec<&wgpu::TextureView> = self.attachments.iter().map(|(_, v)| v).collect();
        self.bind_group = Some(sampled_bind_group(
            ctx.device,
            &self.label,
            &self.layout,
            &views,
            &self.sampler,
        ));

        log::debug!("resized `{}` to {}x{}", self.label, size.0, size.1);
        self.size = size;
        true
    }

    /// Begins a pass that clears every attachment to `clear` and renders into all of them.
    ///
    /// Returns `None` before the first [`Self::ensure_size`].
    pub fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        clear: Color,
    ) -> Option<wgpu::RenderPass<'e>> {
        if self.attachments.is_empty() {
            return None;
        }

        let attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = self
            .attachments
            .iter()
            .map(|(_, view)| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.label),
            color_attachments: &attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Some(pass)
    }

    /// Formats of all attachments, for programs rendering into this target.
    pub fn formats(&self) -> Vec<wgpu::TextureFormat> {
        vec![self.format; self.count as usize]
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn attachment_count(&self) -> u32 {
        self.count
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}
