use anyhow::{Context, Result};

use geostream_engine::buffer::Upload;
use geostream_engine::paint::Color;
use geostream_engine::render::{
    Mesh, Program, RenderCtx, RenderTarget, StreamLayout, UniformBlock,
};

const SHADER: &str = include_str!("shaders/grid.wgsl");

const ANCHOR: usize = 0;

/// Crosses per grid side.
pub const CELLS: u32 = 8;

/// Line-list vertices drawn per anchor: two arms of two vertices per cell.
pub const VERTICES_PER_ANCHOR: u32 = CELLS * CELLS * 4;

pub const GRID_COLOR: Color = Color::rgb(1.0, 0.5, 1.0);

pub const DEFAULT_ANCHORS: [[f32; 2]; 2] = [[-1.0, -1.0], [-0.89, -0.89]];

/// Uniform block shared by both shader stages.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridParams {
    pub color: [f32; 4],
    pub delta: [f32; 2],
    _pad: [f32; 2],
}

impl GridParams {
    /// Alpha is forced to 1; the fragment stage only reads `rgb`.
    pub fn new(delta: [f32; 2], color: Color) -> Self {
        Self {
            color: color.with_alpha(1.0).to_array(),
            delta,
            _pad: [0.0; 2],
        }
    }
}

impl Default for GridParams {
    fn default() -> Self {
        Self::new([0.1, 0.1], GRID_COLOR)
    }
}

/// Anchors on a square lattice, `side` per row, filling `[-1, 1)`.
pub fn anchor_lattice(side: u32) -> Vec<[f32; 2]> {
    let step = 2.0 / side.max(1) as f32;
    (0..side)
        .flat_map(|row| (0..side).map(move |col| [-1.0 + col as f32 * step, -1.0 + row as f32 * step]))
        .collect()
}

/// Seconds each anchor set stays on screen.
pub const STAGE_SECONDS: f32 = 2.0;

/// Anchor-set index for a point in time, cycling through four sets.
pub fn stage_at(elapsed: f32) -> u32 {
    (elapsed.max(0.0) / STAGE_SECONDS) as u32 % 4
}

/// Stage 0 is the two default anchors; stage `n` is an `(n+1)`-wide lattice.
pub fn anchors_for_stage(stage: u32) -> Vec<[f32; 2]> {
    match stage {
        0 => DEFAULT_ANCHORS.to_vec(),
        n => anchor_lattice(n + 1),
    }
}

struct GridGpu {
    format: wgpu::TextureFormat,
    mesh: Mesh,
    program: Program,
    params: UniformBlock<GridParams>,
}

/// Point anchors expanded to an 8x8 grid of crosses each.
///
/// Anchors are an instance stream: its length sets the instance count, and
/// every instance draws [`VERTICES_PER_ANCHOR`] vertices generated in the
/// vertex stage.
pub struct GridDraw {
    gpu: Option<GridGpu>,
    pending: GridParams,
}

impl GridDraw {
    pub fn new() -> Self {
        Self {
            gpu: None,
            pending: GridParams::default(),
        }
    }

    pub fn update_verts(&mut self, ctx: &RenderCtx<'_>, anchors: &[[f32; 2]]) -> Result<Upload> {
        let alloc = ctx.allocator();
        self.ensure(ctx)?.mesh.update_stream(&alloc, ANCHOR, anchors)
    }

    /// Sets the cross spacing and color; takes effect for the next draw.
    pub fn update_params(&mut self, ctx: &RenderCtx<'_>, delta: [f32; 2], color: Color) -> Result<()> {
        self.pending = GridParams::new(delta, color);
        let params = self.pending;
        self.ensure(ctx)?.params.write(ctx.queue, &params);
        Ok(())
    }

    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<()> {
        let gpu = self.ensure(ctx)?;
        let mut pass = target.begin_pass("grid");
        gpu.program.draw(&mut pass, &gpu.mesh, &[gpu.params.bind_group()]);
        Ok(())
    }

    fn ensure(&mut self, ctx: &RenderCtx<'_>) -> Result<&mut GridGpu> {
        if self.gpu.as_ref().is_some_and(|g| g.format == ctx.surface_format) {
            return self.gpu.as_mut().context("grid resources missing");
        }

        let (mesh, params) = match self.gpu.take() {
            Some(old) => (old.mesh, old.params),
            None => {
                let mut mesh = Mesh::builder("grid", wgpu::PrimitiveTopology::LineList)
                    .stream(StreamLayout::instance("inVert", 0, wgpu::VertexFormat::Float32x2))
                    .build()?;
                mesh.set_count(VERTICES_PER_ANCHOR);
                let params = UniformBlock::new(
                    ctx.device,
                    "grid params",
                    wgpu::ShaderStages::VERTEX_FRAGMENT,
                    &self.pending,
                );
                (mesh, params)
            }
        };

        let program = Program::for_mesh(
            ctx.device,
            &mesh,
            SHADER,
            &[params.layout()],
            &[ctx.surface_format],
        );

        Ok(self.gpu.insert(GridGpu {
            format: ctx.surface_format,
            mesh,
            program,
            params,
        }))
    }
}

impl Default for GridDraw {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<GridParams>(), 32);
    }

    #[test]
    fn params_pack_color_then_delta() {
        let p = GridParams::new([0.1, 0.2], Color::rgba(1.0, 0.5, 1.0, 0.3));
        let floats: [f32; 8] = bytemuck::cast(p);
        assert_eq!(floats, [1.0, 0.5, 1.0, 1.0, 0.1, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn default_params_are_pink_tenth_spacing() {
        let p = GridParams::default();
        assert_eq!(p.color, [1.0, 0.5, 1.0, 1.0]);
        assert_eq!(p.delta, [0.1, 0.1]);
    }

    #[test]
    fn each_anchor_draws_a_full_grid() {
        assert_eq!(VERTICES_PER_ANCHOR, 256);
    }

    #[test]
    fn lattice_covers_the_viewport() {
        let anchors = anchor_lattice(2);
        assert_eq!(anchors, vec![[-1.0, -1.0], [0.0, -1.0], [-1.0, 0.0], [0.0, 0.0]]);
        assert!(anchor_lattice(0).is_empty());
    }

    #[test]
    fn stages_cycle_anchor_sets() {
        assert_eq!(stage_at(0.0), 0);
        assert_eq!(stage_at(STAGE_SECONDS * 3.5), 3);
        assert_eq!(stage_at(STAGE_SECONDS * 4.0), 0);
        assert_eq!(anchors_for_stage(0), DEFAULT_ANCHORS.to_vec());
        assert_eq!(anchors_for_stage(3).len(), 16);
    }
}
