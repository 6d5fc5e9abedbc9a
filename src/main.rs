#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!(
        "The playtune-scroll CLI requires the \"cli\" feature. \
         Rebuild with `--features cli` to enable it."
    );
}

#[cfg(feature = "cli")]
fn main() -> std::process::ExitCode {
    cli::main()
}

#[cfg(feature = "cli")]
mod cli {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::PathBuf;
    use std::process::ExitCode;

    use anyhow::{bail, Context, Result};
    use clap::Parser;
    use tracing::info;
    use tracing_subscriber::EnvFilter;

    use playtune::render::{
        render_score, write_summary, ScoreRenderer, ScrollRenderer, SourceArrayRenderer,
    };
    use playtune::{
        DecodeError, HeaderSniffer, OutputFormat, PlaytuneError, RunningStats, ScoreLoader,
        ScrollConfig,
    };

    /// Exit status for a bytestream that cannot be decoded.
    const FAULT_EXIT_CODE: u8 = 8;

    #[derive(Parser, Debug)]
    #[command(name = "playtune-scroll", version)]
    #[command(about = "Show what a Playtune bytestream plays, one row per delay")]
    struct Args {
        /// Bytestream file (".bin" is tried when no extension is given)
        file: PathBuf,

        /// Display up to N tone generators
        #[arg(short = 't', long = "tonegens", value_name = "N",
              value_parser = clap::value_parser!(u8).range(1..=16))]
        tonegens: Option<u8>,

        /// Expect volume bytes after note numbers
        #[arg(short, long)]
        volume: bool,

        /// Expect volume bytes but do not display them
        #[arg(long)]
        ignore_volume: bool,

        /// Write an annotated source array to <base>.c
        #[arg(short, long, conflicts_with = "csv")]
        code: bool,

        /// Write a CSV event table instead of the scroll
        #[arg(long)]
        csv: bool,

        /// Show note numbers in hex instead of names
        #[arg(short = 'x', long)]
        hex: bool,

        /// Omit the raw bytestream column
        #[arg(long)]
        no_bytes: bool,

        /// Write output to PATH
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Load options from a JSON file (flags override)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Write the running statistics as JSON
        #[arg(long, value_name = "PATH")]
        summary_json: Option<PathBuf>,
    }

    impl Args {
        /// Configuration file (or defaults) with command line flags applied.
        fn config(&self) -> Result<ScrollConfig> {
            let mut config = match &self.config {
                Some(path) => ScrollConfig::load(path)?,
                None => ScrollConfig::default(),
            };
            if let Some(n) = self.tonegens {
                config.decode.display_limit = Some(n);
            }
            if self.volume || self.ignore_volume {
                config.decode.expect_volume = true;
            }
            if self.ignore_volume {
                config.render.ignore_volume = true;
            }
            if self.hex {
                config.render.show_hex = true;
            }
            if self.no_bytes {
                config.render.show_raw_bytes = false;
            }
            if self.code {
                config.render.format = OutputFormat::SourceArray;
            } else if self.csv {
                config.render.format = OutputFormat::Csv;
            }
            config.validate()?;
            Ok(config)
        }
    }

    fn init_tracing() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(io::stderr)
            .init();
    }

    fn report_fault(err: &DecodeError) {
        let offset = err.offset();
        eprintln!("*** {err}");
        eprintln!("*** at offset {offset:04X} ({offset}):");
        eprintln!("  {}", err.context());
    }

    fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
        Ok(match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("cannot create '{}'", path.display()))?;
                info!(path = %path.display(), "writing output");
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout().lock()),
        })
    }

    fn make_renderer(format: OutputFormat, out: Box<dyn Write>) -> Result<Box<dyn ScoreRenderer>> {
        Ok(match format {
            OutputFormat::Scroll => Box::new(ScrollRenderer::new(out)),
            OutputFormat::SourceArray => Box::new(SourceArrayRenderer::new(out)),
            #[cfg(feature = "csv-export")]
            OutputFormat::Csv => Box::new(playtune::render::CsvRenderer::new(out)),
            #[cfg(not(feature = "csv-export"))]
            OutputFormat::Csv => bail!("CSV output requires the \"csv-export\" feature"),
        })
    }

    fn run(args: &Args) -> Result<()> {
        let config = args.config()?;
        let score = ScoreLoader::load(&args.file)?;
        let name = score.display_name();

        let output = match (&args.output, config.render.format) {
            (Some(path), _) => Some(path.clone()),
            (None, OutputFormat::SourceArray) => Some(score.path.with_extension("c")),
            (None, _) => None,
        };
        if output.as_ref() == Some(&score.path) {
            bail!("refusing to overwrite the input file '{}'", score.path.display());
        }

        let mut renderer = make_renderer(config.render.format, open_output(output.as_ref())?)?;
        let stats: RunningStats = render_score(&score.data, &name, &config, renderer.as_mut())?;
        drop(renderer);

        let header = HeaderSniffer::new().sniff(&score.data);
        let display_limit = config.decode.resolve_display_limit(header.as_ref());
        let format = config.decode.resolve_format(header.as_ref());

        // the summary shares stdout only with the scroll
        if output.is_none() && config.render.format != OutputFormat::Scroll {
            write_summary(&mut io::stderr().lock(), &stats, display_limit, format)?;
        } else {
            let mut stdout = io::stdout().lock();
            writeln!(stdout)?;
            write_summary(&mut stdout, &stats, display_limit, format)?;
        }
        if let Some(path) = &output {
            println!("Output written to {}", path.display());
        }

        if let Some(path) = &args.summary_json {
            let json = stats.to_json()?;
            fs::write(path, json)
                .with_context(|| format!("cannot write '{}'", path.display()))?;
        }
        Ok(())
    }

    pub fn main() -> ExitCode {
        init_tracing();
        let args = Args::parse();
        match run(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                let fault = err
                    .downcast_ref::<PlaytuneError>()
                    .and_then(PlaytuneError::as_decode);
                if let Some(fault) = fault {
                    report_fault(fault);
                    return ExitCode::from(FAULT_EXIT_CODE);
                }
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_flags_override_defaults() {
            let args = Args::parse_from([
                "playtune-scroll",
                "-t",
                "3",
                "--ignore-volume",
                "-x",
                "tune",
            ]);
            let config = args.config().unwrap();
            assert_eq!(config.decode.display_limit, Some(3));
            assert!(config.decode.expect_volume);
            assert!(config.render.ignore_volume);
            assert!(config.render.show_hex);
            assert_eq!(config.render.format, OutputFormat::Scroll);
        }

        #[test]
        fn test_code_and_csv_conflict() {
            assert!(Args::try_parse_from(["playtune-scroll", "-c", "--csv", "tune"]).is_err());
            assert!(Args::try_parse_from(["playtune-scroll", "-t", "17", "tune"]).is_err());
        }
    }
}
