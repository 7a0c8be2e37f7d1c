//! `cinder-inspect`: load assets through the Cinder caches and report.

use std::process::ExitCode;

use clap::Parser;
use cinder_app::{AppError, CliBackend, InspectArgs, InspectReport, inspect};
use cinder_assets::{GltfImporter, ImageCrateDecoder};
use cinder_graphics::{DummyBackend, GraphicsDevice};
use cinder_resources::ResourceContext;

fn main() -> ExitCode {
    let args = InspectArgs::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();
    cinder_core::init();
    cinder_graphics::init();
    log::info!("Cinder v{}", cinder_app::VERSION);

    if args.is_empty() {
        log::warn!("nothing to load; pass model paths or --texture");
    }

    match run(&args) {
        Ok(report) => {
            println!("{report}");
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &InspectArgs) -> Result<InspectReport, AppError> {
    match args.backend {
        CliBackend::Dummy => with_device(DummyBackend::new(), args),
        #[cfg(feature = "wgpu")]
        CliBackend::Wgpu => with_device(cinder_graphics::WgpuBackend::new()?, args),
        #[cfg(not(feature = "wgpu"))]
        CliBackend::Wgpu => Err(AppError::BackendDisabled("wgpu")),
    }
}

fn with_device<D: GraphicsDevice>(device: D, args: &InspectArgs) -> Result<InspectReport, AppError> {
    let ctx = ResourceContext::new(
        args.config(),
        device,
        Box::new(GltfImporter::new()),
        Box::new(ImageCrateDecoder::new()),
    )?;
    Ok(inspect(ctx, args))
}
