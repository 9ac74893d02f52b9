use anyhow::{Context, Result};

use geostream_engine::buffer::Upload;
use geostream_engine::render::{
    sampled_bind_group, sampled_layout, Mesh, Program, RenderCtx, RenderTarget, StreamLayout,
    Texture, UniformBlock, WindowBlock,
};

const SHADER: &str = include_str!("shaders/textured.wgsl");

const POS: usize = 0;
const UV: usize = 1;

const PINK: [u8; 4] = [255, 105, 180, 255];
const NAVY: [u8; 4] = [20, 24, 82, 255];
const GOLD: [u8; 4] = [255, 200, 40, 255];
const TEAL: [u8; 4] = [0, 150, 136, 255];

/// Most triangles shown by [`triangle_row`] before the count wraps.
pub const MAX_TRIANGLES: u32 = 6;

/// CPU-side geometry for the textured demo.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleRow {
    pub verts: Vec<[f32; 2]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// `count` copies of the unit triangle laid out left to right across the
/// viewport, each with the full `(0,0) (1,0) (0.5,1)` UV range.
pub fn triangle_row(count: u32) -> TriangleRow {
    let width = 1.8 / count.max(1) as f32;
    let mut row = TriangleRow {
        verts: Vec::with_capacity(count as usize * 3),
        uvs: Vec::with_capacity(count as usize * 3),
        indices: Vec::with_capacity(count as usize * 3),
    };

    for i in 0..count {
        let left = -0.9 + i as f32 * width;
        let half = width * 0.45;
        let center = left + width * 0.5;
        row.verts.extend_from_slice(&[
            [center - half, -0.5],
            [center + half, -0.5],
            [center, 0.5],
        ]);
        row.uvs.extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]]);
        let base = i * 3;
        row.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
    row
}

/// Triangle count for a point in time: steps `1..=MAX_TRIANGLES` once a second.
pub fn triangle_count_at(elapsed: f32) -> u32 {
    (elapsed.max(0.0) as u32 % MAX_TRIANGLES) + 1
}

fn triangle_mesh<H>() -> Result<Mesh<H>> {
    Mesh::builder("textured", wgpu::PrimitiveTopology::TriangleList)
        .stream(StreamLayout::vertex("inVert", 0, wgpu::VertexFormat::Float32x2))
        .stream(StreamLayout::vertex("inUV", 1, wgpu::VertexFormat::Float32x2))
        .indexed()
        .build()
}

struct TextureGpu {
    format: wgpu::TextureFormat,
    mesh: Mesh,
    program: Program,
    window: UniformBlock<WindowBlock>,
    textures: wgpu::BindGroup,
    _layout: wgpu::BindGroupLayout,
    _t1: Texture,
    _t2: Texture,
}

/// Indexed triangles sampling two textures mixed 50/50.
pub struct TextureDraw {
    gpu: Option<TextureGpu>,
}

impl TextureDraw {
    pub fn new() -> Self {
        Self { gpu: None }
    }

    /// Replaces vertices, UVs and indices. Vertex and UV streams only grow;
    /// the index stream is refitted whenever its length changes.
    pub fn update(
        &mut self,
        ctx: &RenderCtx<'_>,
        verts: &[[f32; 2]],
        uvs: &[[f32; 2]],
        indices: &[u32],
    ) -> Result<()> {
        self.update_verts(ctx, verts)?;
        self.update_uvs(ctx, uvs)?;
        self.update_indices(ctx, indices)?;
        Ok(())
    }

    pub fn update_verts(&mut self, ctx: &RenderCtx<'_>, verts: &[[f32; 2]]) -> Result<Upload> {
        let alloc = ctx.allocator();
        self.ensure(ctx)?.mesh.update_stream(&alloc, POS, verts)
    }

    pub fn update_uvs(&mut self, ctx: &RenderCtx<'_>, uvs: &[[f32; 2]]) -> Result<Upload> {
        let alloc = ctx.allocator();
        self.ensure(ctx)?.mesh.update_stream(&alloc, UV, uvs)
    }

    pub fn update_indices(&mut self, ctx: &RenderCtx<'_>, indices: &[u32]) -> Result<Upload> {
        let alloc = ctx.allocator();
        self.ensure(ctx)?.mesh.update_indices(&alloc, indices)
    }

    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<()> {
        let gpu = self.ensure(ctx)?;
        gpu.window.write(ctx.queue, &WindowBlock::for_aspect(ctx.aspect()));

        let mut pass = target.begin_pass("textured");
        gpu.program
            .draw(&mut pass, &gpu.mesh, &[gpu.window.bind_group(), &gpu.textures]);
        Ok(())
    }

    fn ensure(&mut self, ctx: &RenderCtx<'_>) -> Result<&mut TextureGpu> {
        if self.gpu.as_ref().is_some_and(|g| g.format == ctx.surface_format) {
            return self.gpu.as_mut().context("texture resources missing");
        }

        let mesh = match self.gpu.take() {
            Some(old) => old.mesh,
            None => triangle_mesh()?,
        };

        let t1 = Texture::checkerboard(ctx.device, ctx.queue, "textured t1", 64, 8, [PINK, NAVY])
            .context("failed to create checkerboard texture")?;
        let t2 = Texture::gradient(ctx.device, ctx.queue, "textured t2", 64, GOLD, TEAL)
            .context("failed to create gradient texture")?;

        let layout = sampled_layout(ctx.device, "textured textures", 2);
        let textures = sampled_bind_group(
            ctx.device,
            "textured textures",
            &layout,
            &[t1.view(), t2.view()],
            t1.sampler(),
        );

        let window = UniformBlock::new(
            ctx.device,
            "textured window",
            wgpu::ShaderStages::VERTEX,
            &WindowBlock::default(),
        );

        let program = Program::for_mesh(
            ctx.device,
            &mesh,
            SHADER,
            &[window.layout(), &layout],
            &[ctx.surface_format],
        );

        Ok(self.gpu.insert(TextureGpu {
            format: ctx.surface_format,
            mesh,
            program,
            window,
            textures,
            _layout: layout,
            _t1: t1,
            _t2: t2,
        }))
    }
}

impl Default for TextureDraw {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geostream_engine::buffer::SizePolicy;

    #[test]
    fn single_triangle_matches_unit_uvs() {
        let row = triangle_row(1);
        assert_eq!(row.verts.len(), 3);
        assert_eq!(row.uvs, vec![[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]]);
        assert_eq!(row.indices, vec![0, 1, 2]);
    }

    #[test]
    fn streams_grow_with_triangle_count() {
        let row = triangle_row(4);
        assert_eq!(row.verts.len(), 12);
        assert_eq!(row.uvs.len(), 12);
        assert_eq!(row.indices.len(), 12);
        assert_eq!(&row.indices[9..], &[9, 10, 11]);
        assert!(row.verts.iter().all(|v| v[0] >= -0.9 && v[0] <= 0.9));
    }

    #[test]
    fn zero_triangles_is_empty() {
        let row = triangle_row(0);
        assert!(row.verts.is_empty() && row.indices.is_empty());
    }

    #[test]
    fn per_stream_updates_map_to_mesh_slots() {
        let mesh = triangle_mesh::<u64>().unwrap();
        assert_eq!(mesh.slot("inVert"), Some(POS));
        assert_eq!(mesh.slot("inUV"), Some(UV));
        assert_eq!(mesh.stream(POS).unwrap().policy(), SizePolicy::GrowOnly);
        assert_eq!(mesh.stream(UV).unwrap().policy(), SizePolicy::GrowOnly);
        assert_eq!(mesh.indices().unwrap().policy(), SizePolicy::ExactFit);
        assert!(mesh.draw_call().indexed);
    }

    #[test]
    fn count_cycles_through_range() {
        assert_eq!(triangle_count_at(0.0), 1);
        assert_eq!(triangle_count_at(2.5), 3);
        assert_eq!(triangle_count_at(MAX_TRIANGLES as f32), 1);
        assert_eq!(triangle_count_at(-1.0), 1);
    }
}
