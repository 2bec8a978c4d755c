#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

#[macro_use]
extern crate log;

mod pitchloop_jack;

use crate::pitchloop_jack::jack_main;
use clap::{arg, value_parser, Command};
use pitchloop_common::config::Config;
use std::io;
use std::path::PathBuf;
use std::process::exit;

fn setup_logger(debug_log: bool) -> Result<(), fern::InitError> {
    let stdout_config = fern::Dispatch::new()
        .chain(io::stdout())
        .level(log::LevelFilter::Info);

    let mut d = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .chain(stdout_config);

    if debug_log {
        let file_config = fern::Dispatch::new()
            .chain(fern::log_file("output.log")?)
            .level(log::LevelFilter::Debug);

        d = d.chain(file_config);
    };

    d.apply()?;

    Ok(())
}

fn main() {
    let matches = Command::new("pitchloop")
        .version("0.1.0")
        .about("A bar-synchronized live looper that keeps every loop in tune with the tempo")
        .arg(
            arg!(--config <PATH> "Reads the config from PATH instead of the default location")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(--bpm <BPM> "Overrides the configured tempo").value_parser(value_parser!(f32)))
        .arg(
            arg!(--tracks <N> "Overrides the configured number of tracks")
                .value_parser(value_parser!(usize)),
        )
        .arg(arg!(--debug "Also writes a debug log to output.log"))
        .get_matches();

    if let Err(e) = setup_logger(matches.get_flag("debug")) {
        eprintln!("Unable to set up logging: {:?}", e);
    }

    let path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(Config::default_path);

    let mut config = match Config::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to read config from {}: {}", path.display(), e);
            exit(1);
        }
    };

    if let Some(bpm) = matches.get_one::<f32>("bpm") {
        config.tempo_bpm = *bpm;
    }
    if let Some(tracks) = matches.get_one::<usize>("tracks") {
        config.tracks = *tracks;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        exit(1);
    }

    if let Err(e) = jack_main(config) {
        error!("{}", e);
        exit(1);
    }
}
