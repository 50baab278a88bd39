mod app;
mod cli;

use anyhow::Result;
use clap::Parser;
use winit::dpi::PhysicalSize;

use wythoff_engine::device::GpuInit;
use wythoff_engine::logging::{init_logging, LoggingConfig};
use wythoff_engine::window::{Runtime, RuntimeConfig};

use crate::app::Wythoff;
use crate::cli::{Cli, ExplorerConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..Default::default()
    });

    let config = ExplorerConfig::from(cli);
    log::info!(
        "wythoff explorer {} aa={} speed={} shaders={}",
        config.size,
        config.aa,
        config.speed,
        config.shader_dir.display()
    );

    let runtime = RuntimeConfig {
        title: "Wythoff Explorer".to_string(),
        initial_size: PhysicalSize::new(config.size.width, config.size.height),
        visible: true,
        resizable: true,
        max_fps: config.fps,
        time_scale: config.speed,
    };
    let gpu_init = GpuInit::default().with_vsync(config.vsync);

    Runtime::run(runtime, gpu_init, Wythoff::new(config))
}
