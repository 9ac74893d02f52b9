use anyhow::{Context, Result};

use geostream_engine::paint::Color;
use geostream_engine::render::{
    DrawCount, Mesh, OffscreenTarget, Program, ProgramDesc, RenderCtx, RenderTarget, StreamLayout,
};

const LINE_SHADER: &str = include_str!("shaders/target_lines.wgsl");
const QUAD_SHADER: &str = include_str!("shaders/target_quad.wgsl");

/// Attachment 0 receives red, attachment 1 green.
pub const ATTACHMENTS: u32 = 2;
pub const INSTANCES: u32 = 10;

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub const DIAGONAL: [[f32; 2]; 2] = [[-1.0, -1.0], [1.0, 1.0]];

pub const QUAD_VERTS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

struct TargetGpu {
    format: wgpu::TextureFormat,
    offscreen: OffscreenTarget,
    lines: Mesh,
    line_program: Program,
    quad: Mesh,
    quad_program: Program,
}

/// Two-pass demo: instanced lines into a two-attachment offscreen target, then
/// an instanced quad that samples both attachments and mixes them by `uv.x`.
pub struct TargetsDemo {
    gpu: Option<TargetGpu>,
}

impl TargetsDemo {
    pub fn new() -> Self {
        Self { gpu: None }
    }

    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<()> {
        let gpu = self.ensure(ctx)?;
        gpu.offscreen.ensure_size(ctx, ctx.width, ctx.height);

        {
            let mut pass = gpu
                .offscreen
                .begin_pass(target.encoder, Color::TRANSPARENT)
                .context("offscreen target has no attachments")?;
            gpu.line_program.draw(&mut pass, &gpu.lines, &[]);
        }

        let attachments = gpu
            .offscreen
            .bind_group()
            .context("offscreen target has no bind group")?;
        let mut pass = target.begin_pass("targets composite");
        gpu.quad_program.draw(&mut pass, &gpu.quad, &[attachments]);
        Ok(())
    }

    fn ensure(&mut self, ctx: &RenderCtx<'_>) -> Result<&mut TargetGpu> {
        if self.gpu.as_ref().is_some_and(|g| g.format == ctx.surface_format) {
            return self.gpu.as_mut().context("target resources missing");
        }

        let alloc = ctx.allocator();

        let (offscreen, lines, quad) = match self.gpu.take() {
            Some(old) => (old.offscreen, old.lines, old.quad),
            None => {
                let offscreen =
                    OffscreenTarget::new(ctx.device, "targets offscreen", OFFSCREEN_FORMAT, ATTACHMENTS);

                let mut lines = Mesh::builder("targets lines", wgpu::PrimitiveTopology::LineList)
                    .stream(
                        StreamLayout::vertex("inVert", 0, wgpu::VertexFormat::Float32x2)
                            .driving(DrawCount::Elements),
                    )
                    .instances(INSTANCES)
                    .build()?;
                lines.update_stream(&alloc, 0, &DIAGONAL)?;

                let mut quad = Mesh::builder("targets quad", wgpu::PrimitiveTopology::TriangleList)
                    .stream(StreamLayout::vertex("inVert", 0, wgpu::VertexFormat::Float32x2))
                    .stream(StreamLayout::vertex("inUV", 1, wgpu::VertexFormat::Float32x2))
                    .indexed()
                    .instances(INSTANCES)
                    .build()?;
                quad.update_stream(&alloc, 0, &QUAD_VERTS)?;
                quad.update_stream(&alloc, 1, &QUAD_UVS)?;
                quad.update_indices(&alloc, &QUAD_INDICES)?;

                (offscreen, lines, quad)
            }
        };

        let line_layouts = lines.vertex_layouts();
        let offscreen_formats = offscreen.formats();
        let mut desc = ProgramDesc::new(lines.label(), LINE_SHADER, wgpu::PrimitiveTopology::LineList);
        desc.vertex_layouts = &line_layouts;
        desc.targets = &offscreen_formats;
        desc.blend = None;
        let line_program = Program::new(ctx.device, &desc);

        let quad_program = Program::for_mesh(
            ctx.device,
            &quad,
            QUAD_SHADER,
            &[offscreen.layout()],
            &[ctx.surface_format],
        );

        Ok(self.gpu.insert(TargetGpu {
            format: ctx.surface_format,
            offscreen,
            lines,
            line_program,
            quad,
            quad_program,
        }))
    }
}

impl Default for TargetsDemo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_indices_cover_two_triangles() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTS.len()));
    }

    #[test]
    fn uvs_follow_corners() {
        for (pos, uv) in QUAD_VERTS.iter().zip(QUAD_UVS) {
            assert_eq!([(pos[0] + 1.0) / 2.0, (pos[1] + 1.0) / 2.0], uv);
        }
    }
}
