use anyhow::{Context, Result};
use rand::Rng;

use geostream_engine::buffer::Upload;
use geostream_engine::paint::Color;
use geostream_engine::render::{
    Mesh, Program, RenderCtx, RenderTarget, StreamLayout, UniformBlock, WindowBlock,
};

const SHADER: &str = include_str!("shaders/lines.wgsl");

const POS: usize = 0;
const COLOR: usize = 1;

/// Corners of the initial square.
pub const SQUARE: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];

pub const SQUARE_COLORS: [Color; 4] = [
    Color::rgb(1.0, 0.0, 0.0),
    Color::rgb(0.0, 1.0, 0.0),
    Color::rgb(0.0, 0.0, 1.0),
    Color::WHITE,
];

/// Indices drawn per frame.
pub const RANDOM_INDICES: usize = 30;

/// `count` indices drawn uniformly from `0..vertices`.
pub fn random_indices<R: Rng + ?Sized>(rng: &mut R, count: usize, vertices: u32) -> Vec<u32> {
    if vertices == 0 {
        return Vec::new();
    }
    (0..count).map(|_| rng.random_range(0..vertices)).collect()
}

/// [`SQUARE`] scaled about the origin.
pub fn scaled_square(scale: f32) -> [[f32; 2]; 4] {
    SQUARE.map(|[x, y]| [x * scale, y * scale])
}

/// [`SQUARE_COLORS`] as `Unorm8x4` bytes, rotated so corner 0 takes color
/// `shift % 4`.
pub fn rotated_colors(shift: usize) -> [[u8; 4]; 4] {
    let mut colors = SQUARE_COLORS.map(Color::to_u8);
    colors.rotate_left(shift % SQUARE_COLORS.len());
    colors
}

struct LineGpu {
    format: wgpu::TextureFormat,
    mesh: Mesh,
    program: Program,
    window: UniformBlock<WindowBlock>,
}

/// Colored line list: grow-only position and color streams, exact-fit indices.
pub struct LineDraw {
    gpu: Option<LineGpu>,
}

impl LineDraw {
    pub fn new() -> Self {
        Self { gpu: None }
    }

    /// Replaces all three streams in one call.
    pub fn update(
        &mut self,
        ctx: &RenderCtx<'_>,
        verts: &[[f32; 2]],
        colors: &[[u8; 4]],
        indices: &[u32],
    ) -> Result<()> {
        let alloc = ctx.allocator();
        let gpu = self.ensure(ctx)?;
        gpu.mesh.update_stream(&alloc, POS, verts)?;
        gpu.mesh.update_stream(&alloc, COLOR, colors)?;
        gpu.mesh.update_indices(&alloc, indices)?;
        Ok(())
    }

    pub fn update_verts(&mut self, ctx: &RenderCtx<'_>, verts: &[[f32; 2]]) -> Result<Upload> {
        let alloc = ctx.allocator();
        self.ensure(ctx)?.mesh.update_stream(&alloc, POS, verts)
    }

    pub fn update_colors(&mut self, ctx: &RenderCtx<'_>, colors: &[[u8; 4]]) -> Result<Upload> {
        let alloc = ctx.allocator();
        self.ensure(ctx)?.mesh.update_stream(&alloc, COLOR, colors)
    }

    pub fn update_indices(&mut self, ctx: &RenderCtx<'_>, indices: &[u32]) -> Result<Upload> {
        let alloc = ctx.allocator();
        self.ensure(ctx)?.mesh.update_indices(&alloc, indices)
    }

    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<()> {
        let gpu = self.ensure(ctx)?;
        gpu.window.write(ctx.queue, &WindowBlock::for_aspect(ctx.aspect()));

        let mut pass = target.begin_pass("lines");
        gpu.program.draw(&mut pass, &gpu.mesh, &[gpu.window.bind_group()]);
        Ok(())
    }

    fn ensure(&mut self, ctx: &RenderCtx<'_>) -> Result<&mut LineGpu> {
        if self.gpu.as_ref().is_some_and(|g| g.format == ctx.surface_format) {
            return self.gpu.as_mut().context("line resources missing");
        }

        // Buffers survive a format change; only the pipeline is rebuilt.
        let (mesh, window) = match self.gpu.take() {
            Some(old) => (old.mesh, old.window),
            None => (
                Mesh::builder("lines", wgpu::PrimitiveTopology::LineList)
                    .stream(StreamLayout::vertex("inVert", 0, wgpu::VertexFormat::Float32x2))
                    .stream(StreamLayout::vertex("inColor", 1, wgpu::VertexFormat::Unorm8x4))
                    .indexed()
                    .build()?,
                UniformBlock::new(
                    ctx.device,
                    "lines window",
                    wgpu::ShaderStages::VERTEX,
                    &WindowBlock::default(),
                ),
            ),
        };

        let program = Program::for_mesh(
            ctx.device,
            &mesh,
            SHADER,
            &[window.layout()],
            &[ctx.surface_format],
        );

        Ok(self.gpu.insert(LineGpu {
            format: ctx.surface_format,
            mesh,
            program,
            window,
        }))
    }
}

impl Default for LineDraw {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_indices_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let indices = random_indices(&mut rng, RANDOM_INDICES, SQUARE.len() as u32);
        assert_eq!(indices.len(), 30);
        assert!(indices.iter().all(|&i| i < 4));
    }

    #[test]
    fn random_indices_without_vertices_is_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(random_indices(&mut rng, 30, 0).is_empty());
    }

    #[test]
    fn square_has_one_color_per_corner() {
        assert_eq!(SQUARE.len(), SQUARE_COLORS.len());
    }

    #[test]
    fn scaling_keeps_corner_order() {
        assert_eq!(scaled_square(1.0), SQUARE);
        assert_eq!(scaled_square(2.0)[2], [1.0, 1.0]);
    }

    #[test]
    fn colors_rotate_with_wraparound() {
        assert_eq!(rotated_colors(0)[0], [255, 0, 0, 255]);
        assert_eq!(rotated_colors(0)[3], [255; 4]);
        assert_eq!(rotated_colors(1)[0], SQUARE_COLORS[1].to_u8());
        assert_eq!(rotated_colors(5), rotated_colors(1));
    }
}
