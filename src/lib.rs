pub mod commands;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod manifest;
pub mod metadata;
pub mod models;
pub mod tag_text;
pub mod verify;

use clap::{Parser, Subcommand};
use commands::Outcome;
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

/// Builds Faba playlist directories from a folder of audio tracks
#[derive(Parser, Debug)]
#[command(name = "fabagen")]
#[command(version)]
pub struct Cli {
    /// Log debug messages too
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for the persistent run log
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy, retag and renumber tracks into <SOURCE_FOLDER>/K<PLAYLIST_ID>
    Generate {
        source_folder: PathBuf,
        /// Four digit playlist id, e.g. 0190
        playlist_id: String,
        /// Number of tracks already in the playlist (0 for a new playlist)
        #[arg(default_value_t = 0)]
        start_offset: u32,
        /// Extension of the source audio files
        #[arg(short, long)]
        extension: Option<String>,
        /// Print the renumbering plan without touching any file
        #[arg(long)]
        dry_run: bool,
    },
    /// Check an existing K<id> directory for numbering and manifest problems
    Verify { playlist_dir: PathBuf },
    /// Print the text to store on the tag for a playlist
    TagText { playlist_id: String },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let extension = match &cli.command {
        Commands::Generate { extension, .. } => extension.as_deref(),
        _ => None,
    };
    let config = Config::from_env().merge(extension, cli.log_dir.clone(), cli.verbose);

    if let Err(e) = logging::init(config.debug, config.log_dir.as_deref()) {
        eprintln!("Failed to install logger: {}", e);
    }

    let result = match config.validate() {
        Err(reason) => Err(anyhow::anyhow!(reason)),
        Ok(()) => dispatch(&config, cli.command),
    };

    match result {
        Ok(outcome) => ExitCode::from(outcome.code()),
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(Outcome::Failed.code())
        }
    }
}

fn dispatch(config: &Config, command: Commands) -> anyhow::Result<Outcome> {
    match command {
        Commands::Generate {
            source_folder,
            playlist_id,
            start_offset,
            dry_run,
            ..
        } => commands::generate(config, &source_folder, &playlist_id, start_offset, dry_run),
        Commands::Verify { playlist_dir } => commands::verify(&playlist_dir),
        Commands::TagText { playlist_id } => commands::show_tag_text(&playlist_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn offset_defaults_to_zero() {
        let cli = Cli::try_parse_from(["fabagen", "generate", "./mp3", "3101"]).unwrap();
        match cli.command {
            Commands::Generate { start_offset, playlist_id, dry_run, .. } => {
                assert_eq!(start_offset, 0);
                assert_eq!(playlist_id, "3101");
                assert!(!dry_run);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn offset_must_be_non_negative() {
        assert!(Cli::try_parse_from(["fabagen", "generate", "./mp3", "0190", "-1"]).is_err());
        let cli = Cli::try_parse_from(["fabagen", "generate", "./mp3", "0190", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { start_offset: 3, .. }));
    }

    #[test]
    fn playlist_id_stays_a_string() {
        let cli = Cli::try_parse_from(["fabagen", "tag-text", "0190"]).unwrap();
        assert!(matches!(cli.command, Commands::TagText { ref playlist_id } if playlist_id == "0190"));
    }
}
