//! Command-line interface for the minlogo binary.
//!
//! Every pipeline stage is exposed as its own subcommand reading and writing
//! the JSON state files under the dataset root, and `run` chains the
//! repository stages. Logging goes to stderr and honours `RUST_LOG`.

use std::{
    io,
    path::{Path, PathBuf},
    process,
};

use clap::{Args, Parser, Subcommand};
use minlogo::{
    Error, PipelineConfig, RasterBackend, build_client, load_config, run_all, run_download,
    run_filter, run_icons, run_merge, run_rasterize, run_starred, run_trending,
};
use octocrab::Octocrab;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Command line interface for building the minimalist logo dataset.
#[derive(Debug, Parser,)]
#[command(name = "minlogo", version, about = "Collect and filter minimalist logo datasets")]
struct Cli
{
    /// Optional YAML configuration file overriding the defaults.
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf,>,

    /// GitHub token; anonymous requests are used when absent.
    #[arg(long = "token", env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String,>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// List the most-starred repositories.
    Starred(StarredArgs,),
    /// List trending repositories for the configured languages and periods.
    Trending,
    /// Merge the starred and trending lists.
    Merge,
    /// Locate and download one logo per merged repository.
    Download(DownloadArgs,),
    /// Keep the downloaded logos that look minimal.
    Filter(FilterArgs,),
    /// Collect the Simple Icons dataset with captions.
    Icons(IconsArgs,),
    /// Convert SVG files into fixed-size PNG files.
    Rasterize(RasterizeArgs,),
    /// Run starred, trending, download and filter back to back.
    Run,
    /// Print the effective configuration as YAML.
    Config,
}

#[derive(Debug, Args,)]
struct StarredArgs
{
    /// Maximum number of repositories to list.
    #[arg(long = "limit", value_name = "N")]
    limit: Option<usize,>,
}

#[derive(Debug, Args,)]
struct DownloadArgs
{
    /// Pause between repositories in milliseconds.
    #[arg(long = "delay-ms", value_name = "MS")]
    delay_ms: Option<u64,>,
}

#[derive(Debug, Args,)]
struct FilterArgs
{
    /// Largest accepted number of distinct colors.
    #[arg(long = "max-colors", value_name = "N")]
    max_colors: Option<u32,>,
}

#[derive(Debug, Args,)]
struct IconsArgs
{
    /// Maximum number of icons to download.
    #[arg(long = "limit", value_name = "N")]
    limit: Option<usize,>,
}

#[derive(Debug, Args,)]
struct RasterizeArgs
{
    /// Directory holding the SVG files (default: the icon directory).
    #[arg(long = "input", value_name = "DIR")]
    input: Option<PathBuf,>,

    /// Directory receiving the PNG files (default: the input directory).
    #[arg(long = "output", value_name = "DIR")]
    output: Option<PathBuf,>,

    /// Width and height of the PNG files in pixels.
    #[arg(long = "size", value_name = "PX")]
    size: Option<u32,>,

    /// Conversion backend.
    #[arg(long = "backend", value_enum)]
    backend: Option<RasterBackend,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    init_tracing();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false,).with_writer(io::stderr,),)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),),)
        .init();
}

/// Executes the parsed command.
///
/// # Errors
///
/// Propagates configuration, state-file and client initialization errors.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    let mut config = load_config(cli.config.as_deref(),)?;
    apply_overrides(&mut config, &cli.command,);
    let token = cli.token.as_deref();

    match cli.command {
        Command::Starred(_,) => {
            run_starred(&client(token,)?, &config,).await?;
        }
        Command::Trending => {
            run_trending(&client(token,)?, &config,).await?;
        }
        Command::Merge => {
            run_merge(&config,)?;
        }
        Command::Download(_,) => {
            run_download(&client(token,)?, &config,).await?;
        }
        Command::Filter(_,) => {
            run_filter(&config,)?;
        }
        Command::Icons(_,) => {
            let summary = run_icons(&client(token,)?, &config,).await?;
            info!("Collected {} / {} icons", summary.downloaded, summary.listed);
        }
        Command::Rasterize(args,) => {
            let (input, output,) = rasterize_directories(&config, &args,);
            run_rasterize(&input, &output, &config.rasterize,).await?;
        }
        Command::Run => {
            let reports = run_all(&client(token,)?, &config,).await;
            let succeeded = reports.iter().filter(|report| report.succeeded,).count();
            info!("Pipeline finished: {} / {} steps succeeded", succeeded, reports.len());
        }
        Command::Config => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_config(&mut handle, &config,)?;
        }
    }

    Ok((),)
}

fn client(token: Option<&str,>,) -> Result<Octocrab, Error,>
{
    Ok(build_client(token,)?,)
}

/// Folds command-line flags into the loaded configuration.
fn apply_overrides(config: &mut PipelineConfig, command: &Command,)
{
    match command {
        Command::Starred(StarredArgs {
            limit: Some(limit,),
        },) => config.starred.limit = *limit,
        Command::Download(DownloadArgs {
            delay_ms: Some(delay_ms,),
        },) => config.download.delay_ms = *delay_ms,
        Command::Filter(FilterArgs {
            max_colors: Some(max_colors,),
        },) => config.filter.max_colors = *max_colors,
        Command::Icons(IconsArgs {
            limit: Some(limit,),
        },) => config.icons.limit = *limit,
        Command::Rasterize(args,) => {
            if let Some(size,) = args.size {
                config.rasterize.size = size;
            }
            if let Some(backend,) = args.backend {
                config.rasterize.backend = backend;
            }
        }
        _ => {}
    }
}

fn rasterize_directories(config: &PipelineConfig, args: &RasterizeArgs,) -> (PathBuf, PathBuf,)
{
    let input = args.input.clone().unwrap_or_else(|| config.dataset.icons_dir(),);
    let output = args.output.clone().unwrap_or_else(|| input.clone(),);
    (input, output,)
}

fn write_config<W: io::Write,>(writer: &mut W, config: &PipelineConfig,) -> Result<(), Error,>
{
    let yaml = serde_yaml::to_string(config,)?;
    writer
        .write_all(yaml.as_bytes(),)
        .map_err(|source| minlogo::write_error(Path::new("<stdout>",), source,),)
}

#[cfg(test)]
mod tests
{
    use std::{fs, io::Cursor};

    use clap::Parser;
    use minlogo::{RepositoryRecord, parse_config, save_records};
    use tempfile::tempdir;

    use super::*;

    fn parse(arguments: &[&str],) -> Cli
    {
        let mut argv = vec![env!("CARGO_PKG_NAME")];
        argv.extend_from_slice(arguments,);
        Cli::try_parse_from(argv,).expect("failed to parse CLI",)
    }

    #[test]
    fn global_options_follow_the_subcommand()
    {
        let cli = parse(&["merge", "--config", "minlogo.yaml", "--token", "ghp_example"],);

        assert!(matches!(cli.command, Command::Merge));
        assert_eq!(cli.config.as_deref(), Some(Path::new("minlogo.yaml")));
        assert_eq!(cli.token.as_deref(), Some("ghp_example"));
    }

    #[test]
    fn subcommand_flags_override_configuration()
    {
        let mut config = PipelineConfig::default();

        apply_overrides(&mut config, &parse(&["starred", "--limit", "25"],).command,);
        apply_overrides(&mut config, &parse(&["filter", "--max-colors", "4"],).command,);
        apply_overrides(&mut config, &parse(&["download", "--delay-ms", "0"],).command,);
        apply_overrides(&mut config, &parse(&["icons", "--limit", "7"],).command,);

        assert_eq!(config.starred.limit, 25);
        assert_eq!(config.filter.max_colors, 4);
        assert_eq!(config.download.delay_ms, 0);
        assert_eq!(config.icons.limit, 7);
    }

    #[test]
    fn rasterize_defaults_to_icon_directory_in_place()
    {
        let mut config = PipelineConfig::default();
        let cli = parse(&["rasterize", "--size", "256", "--backend", "inkscape"],);
        apply_overrides(&mut config, &cli.command,);

        let Command::Rasterize(args,) = cli.command else {
            panic!("unexpected command variant");
        };
        let (input, output,) = rasterize_directories(&config, &args,);

        assert_eq!(input, config.dataset.icons_dir());
        assert_eq!(output, input);
        assert_eq!(config.rasterize.size, 256);
        assert_eq!(config.rasterize.backend, RasterBackend::Inkscape);
    }

    #[test]
    fn rejects_unknown_backend()
    {
        let result =
            Cli::try_parse_from([env!("CARGO_PKG_NAME"), "rasterize", "--backend", "cairo"],);
        assert!(result.is_err());
    }

    #[test]
    fn config_output_round_trips()
    {
        let mut buffer = Cursor::new(Vec::new(),);
        write_config(&mut buffer, &PipelineConfig::default(),).expect("failed to write config",);

        let yaml = String::from_utf8(buffer.into_inner(),).expect("invalid UTF-8",);
        let parsed = parse_config(&yaml,).expect("printed configuration parses",);
        assert_eq!(parsed.filter.max_colors, 10);
        assert_eq!(parsed.rasterize.size, 512);
    }

    #[tokio::test]
    async fn merge_command_uses_configured_dataset_root()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let root = dir.path().join("data",);
        let config_path = dir.path().join("minlogo.yaml",);
        fs::write(&config_path, format!("dataset:\n  root: {}\n", root.display()),)
            .expect("failed to write config",);
        save_records(&root.join("trending_repos.json",), &[RepositoryRecord::new("a", "b",)],)
            .expect("failed to seed trending list",);

        let cli = parse(&["merge", "--config", config_path.to_str().expect("utf8",)],);
        run(cli,).await.expect("merge command failed",);

        assert!(root.join("all_repos.json").exists());
    }

    #[tokio::test]
    async fn missing_configuration_file_is_reported()
    {
        let cli = parse(&["merge", "--config", "/nonexistent/minlogo.yaml"],);
        let error = run(cli,).await.expect_err("expected configuration error",);
        assert!(matches!(error, Error::Io { .. }));
    }
}
