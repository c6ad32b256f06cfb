//! Assemble command - rebuild one panorama and save it as JPEG.

use crate::error::CliError;
use crate::runner::CliRunner;
use image::codecs::jpeg::JpegEncoder;
use panocrawl::panorama::PanoramaAssembler;
use panocrawl::provider::StreetViewProvider;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// JPEG quality of the saved panorama.
pub const OUTPUT_JPEG_QUALITY: u8 = 90;

/// Arguments for the assemble command.
pub struct AssembleArgs {
    pub pano_id: String,
    pub output: PathBuf,
    pub zoom: Option<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub verbose: bool,
    pub debug: bool,
}

/// Run the assemble command.
pub fn run(args: AssembleArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(args.verbose, args.debug)?;
    runner.log_startup("assemble");

    let panorama = &mut runner.config_mut().panorama;
    if let Some(zoom) = args.zoom {
        panorama.zoom = zoom;
    }
    if let Some(width) = args.width {
        panorama.width = width;
    }
    if let Some(height) = args.height {
        panorama.height = height;
    }

    let config = runner.config().assembly_config();
    let provider = Arc::new(StreetViewProvider::new(runner.provider_client()?));
    let assembler = PanoramaAssembler::new(provider, config);

    println!("Assembling panorama {} (zoom {})...", args.pano_id, config.zoom());

    let runtime = runner.runtime()?;
    let assembled = runtime.block_on(assembler.assemble(&args.pano_id))?;

    println!(
        "  Grid: {} x {} tiles ({} missing)",
        assembled.extent.cols(),
        assembled.extent.rows(),
        assembled.missing
    );

    save_jpeg(&assembled.image, &args.output)?;
    info!(path = %args.output.display(), "Panorama saved");
    println!(
        "Saved {} ({}x{})",
        args.output.display(),
        assembled.image.width(),
        assembled.image.height()
    );

    Ok(())
}

fn save_jpeg(image: &image::RgbImage, path: &Path) -> Result<(), CliError> {
    let file_error = |error: String| CliError::FileWrite {
        path: path.to_path_buf(),
        error,
    };

    let file = File::create(path).map_err(|e| file_error(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, OUTPUT_JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| file_error(e.to_string()))?;
    writer.flush().map_err(|e| file_error(e.to_string()))
}
