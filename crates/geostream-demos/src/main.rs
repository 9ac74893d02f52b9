//! Geostream demo scenes.
//!
//! `geostream-demos [lines|textured|grid|targets]` opens one window running the
//! named scene (default `targets`). Keys `1`-`4` switch scenes, `Escape` quits.

mod app;
mod demo;
mod grid;
mod lines;
mod targets;
mod textured;

use anyhow::Result;
use winit::dpi::LogicalSize;

use geostream_engine::device::GpuInit;
use geostream_engine::logging::{init_logging, LoggingConfig};
use geostream_engine::window::{Runtime, RuntimeConfig};

use crate::app::DemoApp;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let kind = demo::parse_args(std::env::args().skip(1))?;
    log::info!("starting `{kind}` demo");

    let config = RuntimeConfig {
        title: kind.window_title(),
        initial_size: LogicalSize::new(800.0, 600.0),
        resizable: true,
    };

    let app = DemoApp::new(kind);
    Runtime::run(config, GpuInit::default(), app)
}
