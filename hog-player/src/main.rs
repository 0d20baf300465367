//! Play a video with HOG or optical flow overlays

use clap::*;
use hogflow::prelude::v1::{Result, *};
use hogflow_cv::{CvCapture, CvFarneback, CvHog, HighGui};
use log::*;
use std::fs::File;
use std::io::BufReader;

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("hog-player")
        .version(crate_version!())
        .about(crate_description!())
        .arg(
            Arg::new("skip-every")
                .long("skip-every")
                .short('s')
                .takes_value(true)
                .help("Draw every n-th HOG grid position"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .short('m')
                .takes_value(true)
                .possible_values(["hog", "flow", "none"]),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .help("JSON player configuration"),
        )
        .arg(Arg::new("input").takes_value(true).required(false))
        .get_matches();

    let mut config: PlayerConfig = match matches.value_of("config") {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => Default::default(),
    };

    if let Some(input) = matches.value_of("input") {
        config.input = input.into();
    }

    if let Some(skip_every) = matches.value_of("skip-every") {
        config.skip_every = skip_every.parse()?;
    }

    if let Some(mode) = matches.value_of("mode") {
        config.mode = mode.parse()?;
    }

    config.validate()?;

    info!("Playing {} in {:?} mode", config.input, config.mode);

    let processor: Box<dyn FrameProcessor> = match config.mode {
        ProcessorMode::Hog => {
            let renderer = HistogramRenderer::new(config.hog.nbins, config.hog.signed_gradient)
                .with_scale(config.hog_scale)
                .with_noise_floor(config.hog_noise_floor);
            Box::new(HogProcessor::new(CvHog::new()?, config.hog)?.with_renderer(renderer))
        }
        ProcessorMode::Flow => Box::new(FlowProcessor::new(
            CvFarneback::default(),
            config.flow,
            config.flow_view,
        )),
        ProcessorMode::None => Box::new(PassThrough::default()),
    };

    let display = HighGui::new("hog-player")?;

    let mut player = PlaybackLoop::from_config(&config, processor, display);
    let summary = player.run(&mut |path: &str| CvCapture::open(path))?;

    info!(
        "Finished with {:?} after {} frames",
        summary.outcome, summary.frames
    );

    Ok(())
}
