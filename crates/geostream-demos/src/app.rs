use anyhow::Result;
use rand::rngs::ThreadRng;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use geostream_engine::core::{App, AppControl, FrameCtx};
use geostream_engine::paint::Color;
use geostream_engine::render::{RenderCtx, RenderTarget};

use crate::demo::DemoKind;
use crate::grid::{self, GridDraw};
use crate::lines::{self, LineDraw};
use crate::targets::TargetsDemo;
use crate::textured::{self, TextureDraw};

const CLEAR: Color = Color::rgb(0.08, 0.08, 0.1);

/// Hosts every demo and renders the active one.
///
/// Draw helpers are created up front but allocate GPU resources lazily on
/// their first frame, so switching to a demo for the first time pays its setup.
pub struct DemoApp {
    active: DemoKind,
    title_stale: bool,
    rng: ThreadRng,

    lines: LineDraw,
    lines_seeded: bool,

    textured: TextureDraw,
    triangles: u32,

    grid: GridDraw,
    grid_stage: Option<u32>,

    targets: TargetsDemo,
}

impl DemoApp {
    pub fn new(active: DemoKind) -> Self {
        Self {
            active,
            title_stale: false,
            rng: rand::rng(),
            lines: LineDraw::new(),
            lines_seeded: false,
            textured: TextureDraw::new(),
            triangles: 0,
            grid: GridDraw::new(),
            grid_stage: None,
            targets: TargetsDemo::new(),
        }
    }

    fn switch_to(&mut self, kind: DemoKind) {
        if kind != self.active {
            log::info!("switching to `{kind}` demo");
            self.active = kind;
            self.title_stale = true;
        }
    }

    fn draw_lines(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        elapsed: f32,
    ) -> Result<()> {
        if !self.lines_seeded {
            self.lines
                .update(ctx, &lines::SQUARE, &lines::rotated_colors(0), &[0, 0])?;
            self.lines_seeded = true;
        }

        // Same byte sizes every frame: both streams are rewritten in place.
        self.lines
            .update_verts(ctx, &lines::scaled_square(1.0 + 0.2 * elapsed.sin()))?;
        self.lines
            .update_colors(ctx, &lines::rotated_colors(elapsed as usize))?;

        let indices = lines::random_indices(
            &mut self.rng,
            lines::RANDOM_INDICES,
            lines::SQUARE.len() as u32,
        );
        self.lines.update_indices(ctx, &indices)?;
        self.lines.draw(ctx, target)
    }

    fn draw_textured(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        elapsed: f32,
    ) -> Result<()> {
        let count = textured::triangle_count_at(elapsed);
        if count != self.triangles {
            let row = textured::triangle_row(count);
            self.textured.update(ctx, &row.verts, &row.uvs, &row.indices)?;
            self.triangles = count;
        }
        self.textured.draw(ctx, target)
    }

    fn draw_grid(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        elapsed: f32,
    ) -> Result<()> {
        let stage = grid::stage_at(elapsed);
        if self.grid_stage != Some(stage) {
            let upload = self.grid.update_verts(ctx, &grid::anchors_for_stage(stage))?;
            log::debug!("grid stage {stage}: {upload:?}");
            self.grid_stage = Some(stage);
        }

        // Spacing breathes between 0.05 and 0.15 so the crosses visibly move.
        let d = 0.1 + 0.05 * elapsed.sin();
        self.grid.update_params(ctx, [d, d], grid::GRID_COLOR)?;
        self.grid.draw(ctx, target)
    }
}

impl App for DemoApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        else {
            return AppControl::Continue;
        };

        if *code == KeyCode::Escape {
            return AppControl::Exit;
        }
        if let Some(kind) = DemoKind::from_key(*code) {
            self.switch_to(kind);
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.title_stale {
            ctx.runtime.set_title(self.active.window_title());
            self.title_stale = false;
        }

        let elapsed = ctx.time.elapsed;
        let active = self.active;
        ctx.render(CLEAR, |rctx, target| match active {
            DemoKind::Lines => self.draw_lines(rctx, target, elapsed),
            DemoKind::Textured => self.draw_textured(rctx, target, elapsed),
            DemoKind::Grid => self.draw_grid(rctx, target, elapsed),
            DemoKind::Targets => self.targets.draw(rctx, target),
        })
    }
}
