//! Command line front end for the SExtractor wrapper.
//!
//! Subcommands:
//! - `run`: detect sources and print the catalog
//! - `mask`: write a dilated object mask
//! - `sky`: write the background model
//! - `stars`: print the bright, isolated point sources
//! - `vocab`: list the options or parameters the executable understands
//!
//! The executable comes from `SE_EXECUTABLE` unless `--executable` is given.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sew::{
    create_object_mask, create_sky_model, extract_bright_stars, fits_io, Catalog, ImageInput,
    OptionValue, Options, RunConfig, SourceExtractor, StarQuery, DEFAULT_DILATE_NPIX,
};

#[derive(Parser, Debug)]
#[command(name = "sew")]
#[command(about = "Run SExtractor on a FITS image and report what it finds")]
#[command(version)]
struct Cli {
    /// SExtractor executable (defaults to $SE_EXECUTABLE)
    #[arg(long, global = true)]
    executable: Option<PathBuf>,

    /// Log every command line and temporary file
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect sources and print the catalog
    Run {
        #[command(flatten)]
        run: RunArgs,

        /// Comma separated measurement columns on top of the defaults
        #[arg(short, long)]
        extra_params: Option<String>,

        /// Keep the catalog at this path instead of a temporary file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Write the dilated object mask as an 8-bit FITS image
    Mask {
        #[command(flatten)]
        run: RunArgs,

        /// Output FITS file
        #[arg(long)]
        output: PathBuf,

        /// Dilation window in pixels (0 disables dilation)
        #[arg(long, default_value_t = DEFAULT_DILATE_NPIX)]
        dilate: usize,
    },

    /// Write the background model estimated by SExtractor
    Sky {
        #[command(flatten)]
        run: RunArgs,

        /// Output FITS file
        #[arg(long)]
        output: PathBuf,
    },

    /// Print bright, unflagged point sources
    Stars {
        #[command(flatten)]
        run: RunArgs,

        /// Keep sources with any FLAGS value
        #[arg(long)]
        any_flags: bool,
    },

    /// List the configuration options (or catalog parameters) the executable knows
    Vocab {
        /// List catalog parameters instead of configuration options
        #[arg(long)]
        params: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// FITS image to process
    image: PathBuf,

    /// SExtractor configuration option, repeatable
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    options: Vec<(String, OptionValue)>,

    /// SExtractor configuration file (defaults to the bundled one)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for temporary files
    #[arg(long)]
    tmp_path: Option<PathBuf>,

    /// Label appended to temporary file names
    #[arg(long)]
    label: Option<String>,
}

impl RunArgs {
    fn image(&self) -> ImageInput {
        ImageInput::from(self.image.clone())
    }

    fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::default()
            .with_options(self.options.iter().cloned().collect::<Options>());
        if let Some(path) = &self.config {
            config = config.with_config_path(path);
        }
        if let Some(path) = &self.tmp_path {
            config = config.with_tmp_path(path);
        }
        if let Some(label) = &self.label {
            config = config.with_run_label(label);
        }
        config
    }
}

fn parse_option(arg: &str) -> Result<(String, OptionValue), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {arg:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing option name in {arg:?}"));
    }
    Ok((key.to_string(), OptionValue::parse(value)))
}

fn print_catalog(catalog: &Catalog) {
    println!("{}", catalog.column_names().join(" "));
    for row in catalog.rows() {
        let values: Vec<String> = row.values().iter().map(|v| v.to_string()).collect();
        println!("{}", values.join(" "));
    }
}

fn extractor(executable: Option<PathBuf>) -> Result<SourceExtractor> {
    match executable {
        Some(path) => SourceExtractor::discover(&path)
            .with_context(|| format!("cannot use {} as SExtractor", path.display())),
        None => Ok(SourceExtractor::from_env()?.clone()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let extractor = extractor(cli.executable)?;

    match cli.command {
        Command::Run {
            run,
            extra_params,
            catalog,
        } => {
            let mut config = run.run_config();
            if let Some(extra) = extra_params {
                config = config.with_extra_params(extra);
            }
            if let Some(path) = catalog {
                config = config.with_catalog_path(path);
            }
            let catalog = extractor.run(&run.image(), &config)?;
            print_catalog(&catalog);
        }
        Command::Mask {
            run,
            output,
            dilate,
        } => {
            let mask = create_object_mask(&extractor, &run.image(), &run.run_config(), None, dilate)?;
            fits_io::write_mask(&output, &mask)
                .with_context(|| format!("writing {}", output.display()))?;
            let masked = mask.iter().filter(|&&set| set).count();
            log::info!("{masked} of {} pixels masked", mask.len());
        }
        Command::Sky { run, output } => {
            let sky = create_sky_model(&extractor, &run.image(), &run.run_config(), Some(&output))?;
            log::info!(
                "background model {}x{} written to {}",
                sky.ncols(),
                sky.nrows(),
                output.display()
            );
        }
        Command::Stars { run, any_flags } => {
            let query = StarQuery {
                flags: if any_flags { None } else { Some(0) },
                ..StarQuery::default()
            };
            let stars = extract_bright_stars(&extractor, &run.image(), &run.run_config(), &query)?;
            print_catalog(&stars);
        }
        Command::Vocab { params } => {
            let vocabulary = extractor.vocabulary();
            let names: Vec<&str> = if params {
                vocabulary.param_names().collect()
            } else {
                vocabulary.option_names().collect()
            };
            for name in names {
                println!("{name}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_option() {
        assert_eq!(
            parse_option("DETECT_THRESH=3.5").unwrap(),
            ("DETECT_THRESH".to_string(), OptionValue::Float(3.5))
        );
        assert_eq!(
            parse_option("filter_name=my.conv").unwrap(),
            ("filter_name".to_string(), OptionValue::Text("my.conv".to_string()))
        );
        assert!(parse_option("DETECT_THRESH").is_err());
        assert!(parse_option("=3").is_err());
    }

    #[test]
    fn test_cli_collects_repeated_options() {
        let cli = Cli::parse_from([
            "sew", "run", "frame.fits", "-o", "DETECT_THRESH=5", "-o", "FILTER=N", "--label", "a",
        ]);
        let Command::Run { run, .. } = cli.command else {
            panic!("expected run subcommand");
        };
        let config = run.run_config();
        assert_eq!(config.options.get("DETECT_THRESH"), Some(&OptionValue::Int(5)));
        assert_eq!(config.options.get("filter"), Some(&OptionValue::Text("N".to_string())));
        assert_eq!(config.run_label(), Some("a"));
    }
}
