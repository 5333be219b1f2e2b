#[macro_use]
extern crate log;

use std::{
    fs::{File, OpenOptions},
    io::Read,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eot_frame::{FrameReader, FrameWriter};
use formbridge::{command::serve, config::BridgeConfig, ctx::AppContext};
use formprune::{
    Value, clean_submission_with, should_process_submission, unwrap_grid_data_with, variable_names,
    wrap_grid_data_with, wrap_submission,
};

#[derive(Parser)]
#[command(name = "formbridge", version)]
#[command(about = "Clean up and validate form submissions over framed stdio")]
struct Cli {
    /// Configuration file, `.formbridge.toml` in the working directory by default
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve framed requests on stdin until it closes
    Serve {
        /// Directory holding form resources and custom components
        #[arg(long)]
        resource_dir: Option<PathBuf>,
    },

    /// Strip undeclared data from one submission and print the result
    Cleanup {
        /// Form definition (JSON)
        #[arg(long)]
        form: PathBuf,
        /// Submission or bare data (JSON), read from stdin when omitted
        #[arg(long)]
        submission: Option<PathBuf>,
    },

    /// Print the shape schema derived from a form
    Schema {
        #[arg(long)]
        form: PathBuf,
    },

    /// List the variable names a form submits
    Fields {
        #[arg(long)]
        form: PathBuf,
    },

    /// Wrap the bare rows of `noRowWrapping` grids, or unwrap them
    Grid {
        #[arg(long)]
        form: PathBuf,
        /// Data (JSON), read from stdin when omitted
        #[arg(long)]
        data: Option<PathBuf>,
        /// Turn engine-shaped rows back into bare values
        #[arg(long)]
        unwrap: bool,
    },

    /// Tell whether a submission saved in a state should be processed
    ShouldProcess {
        #[arg(long)]
        form: PathBuf,
        /// Submission state the saving button sets
        #[arg(long)]
        state: String,
    },

    /// Print the JSON Schema of the configuration file
    ConfigSchema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("error: {e:#}").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let workdir = std::env::current_dir()?;
    let serving = matches!(cli.command, Command::Serve { .. });
    let load = || -> Result<AppContext> {
        let ctx = AppContext::load(cli.config.as_deref(), &workdir)?;
        init_logging(&ctx.config, serving)?;
        if let Some(path) = &ctx.config_path {
            debug!("config: {}", path.display());
        }
        Ok(ctx)
    };

    match &cli.command {
        Command::Serve { resource_dir } => {
            let mut ctx = load()?;
            if let Some(dir) = resource_dir {
                ctx = ctx.with_resource_dir(dir);
            }
            let terminator = ctx.config.terminator.clone();
            let mut reader = FrameReader::with_terminator(std::io::stdin().lock(), &terminator);
            let mut writer =
                FrameWriter::with_terminator(std::io::stdout().lock(), std::io::stderr().lock(), &terminator);
            info!("serving on stdio, resources in {}", ctx.resource_dir().display());
            serve(&ctx, &mut reader, &mut writer)?;
        }
        Command::Cleanup { form, submission } => {
            let ctx = load()?;
            let form = read_json(Some(form.as_path()))?;
            let submission = wrap_submission(read_json(submission.as_deref())?);
            let cleaned = clean_submission_with(&ctx.builder, &form, &submission);
            println!("{}", serde_json::to_string_pretty(&cleaned)?);
        }
        Command::Schema { form } => {
            let ctx = load()?;
            let form = read_json(Some(form.as_path()))?;
            println!("{}", serde_json::to_string_pretty(&ctx.builder.derive(&form))?);
        }
        Command::Fields { form } => {
            let form = read_json(Some(form.as_path()))?;
            for name in variable_names(&form) {
                println!("{name}");
            }
        }
        Command::Grid { form, data, unwrap } => {
            let ctx = load()?;
            let form = read_json(Some(form.as_path()))?;
            let data = read_json(data.as_deref())?;
            let data = if *unwrap {
                unwrap_grid_data_with(&ctx.builder, &data, &form)
            } else {
                wrap_grid_data_with(&ctx.builder, &data, &form)
            };
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Command::ShouldProcess { form, state } => {
            let form = read_json(Some(form.as_path()))?;
            println!("{}", should_process_submission(&form, state));
        }
        Command::ConfigSchema => {
            let schema = schemars::schema_for!(BridgeConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

/// Sets up logging. While serving, stderr carries error frames only, so logs
/// go to `log_file` or nowhere.
fn init_logging(config: &BridgeConfig, serving: bool) -> Result<()> {
    if serving && config.log_file.is_none() {
        log::set_max_level(log::LevelFilter::Off);
        return Ok(());
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"));
    if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init()?;
    Ok(())
}

/// Reads JSON from `path`, or from stdin.
fn read_json(path: Option<&Path>) -> Result<Value> {
    let mut content = String::new();
    match path {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("cannot open {}", path.display()))?
                .read_to_string(&mut content)?;
        }
        None => {
            std::io::stdin().read_to_string(&mut content)?;
        }
    }
    let value = serde_json::from_str(&content).map_err(formbridge::BridgeError::malformed)?;
    Ok(value)
}

