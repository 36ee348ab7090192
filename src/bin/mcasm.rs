use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::EnvFilter;

use mcasm::{AsmConfig, AsmError, Assembler, LayoutKind, Reporter, RomImage, Severity};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble microcode sources into 64 KiB control-store images",
    override_usage = "mcasm [-t] [-o OUTFILE] INFILE [[-t] INFILE ...]"
)]
struct Opts {
    /// Emit trace diagnostics for the inputs that follow
    #[arg(short = 't', action = ArgAction::Count)]
    trace: u8,
    /// Start a new zero-filled image; later inputs are assembled into it
    #[arg(short = 'o', value_name = "OUTFILE", action = ArgAction::Append)]
    output: Vec<PathBuf>,
    /// Source files, assembled in command-line order with shared symbols
    #[arg(value_name = "INFILE")]
    inputs: Vec<PathBuf>,
    /// Command word layout (overrides the config file)
    #[arg(long, value_enum)]
    layout: Option<LayoutKind>,
    /// JSON assembler configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Write symbols defined under `export on` to a JSON file
    #[arg(long, value_name = "FILE")]
    symbols: Option<PathBuf>,
    /// Never colour diagnostics
    #[arg(long)]
    no_color: bool,
}

/// One order-sensitive command-line item.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Trace,
    Output(PathBuf),
    Input(PathBuf),
}

/// Rebuilds the command-line order of `-t`, `-o` and inputs, which clap
/// collects into separate fields.
fn steps(matches: &ArgMatches, opts: &Opts) -> Vec<Step> {
    let indices = |id: &str| -> Vec<usize> {
        matches
            .indices_of(id)
            .map(|idx| idx.collect())
            .unwrap_or_default()
    };
    let mut out: Vec<(usize, Step)> = Vec::new();
    out.extend(indices("trace").into_iter().map(|i| (i, Step::Trace)));
    out.extend(
        indices("output")
            .into_iter()
            .zip(&opts.output)
            .map(|(i, p)| (i, Step::Output(p.clone()))),
    );
    out.extend(
        indices("inputs")
            .into_iter()
            .zip(&opts.inputs)
            .map(|(i, p)| (i, Step::Input(p.clone()))),
    );
    out.sort_by_key(|(i, _)| *i);
    out.into_iter().map(|(_, s)| s).collect()
}

fn save(asm: &mut Assembler, path: Option<PathBuf>) -> Result<()> {
    let image = asm.take_image();
    if let Some(path) = path {
        image.save(&path)?;
        tracing::info!(path = %path.display(), "image saved");
    }
    Ok(())
}

fn create_output(asm: &mut Assembler, path: &Path) -> bool {
    let blank = RomImage::new(asm.config().geometry.image_size);
    match blank.save(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "output created");
            true
        }
        Err(err) => {
            asm.reporter_mut()
                .report(Severity::Error, None, format!("Can't write to {}: {err}", path.display()));
            false
        }
    }
}

fn run(opts: &Opts, steps: &[Step]) -> Result<bool> {
    let mut config = match &opts.config {
        Some(path) => AsmConfig::load(path)?,
        None => AsmConfig::default(),
    };
    if let Some(layout) = opts.layout {
        config.layout = layout;
    }
    let colour = !opts.no_color && std::io::stderr().is_terminal();
    let mut asm = Assembler::new(config, Reporter::stderr(colour))?;
    tracing::debug!(
        layout = asm.layout().name(),
        inputs = opts.inputs.len(),
        trace_flags = opts.trace,
        "assembler ready"
    );

    let mut output: Option<PathBuf> = None;
    for step in steps {
        match step {
            Step::Trace => asm.set_trace(true),
            Step::Output(path) => {
                save(&mut asm, output.take())?;
                if create_output(&mut asm, path) {
                    output = Some(path.clone());
                }
            }
            Step::Input(path) if output.is_none() => {
                asm.reporter_mut().report(
                    Severity::Error,
                    None,
                    format!("No output file defined for input {}", path.display()),
                );
            }
            Step::Input(path) => {
                if let Err(err) = asm.assemble_file(path) {
                    // keep what earlier inputs produced
                    save(&mut asm, output.take())?;
                    return Err(err.into());
                }
            }
        }
    }
    save(&mut asm, output.take())?;

    if let Some(path) = &opts.symbols {
        let json = serde_json::to_string_pretty(&asm.exported_symbols())?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    let rep = asm.reporter();
    tracing::info!(errors = rep.error_count(), warnings = rep.warning_count(), "done");
    Ok(!asm.failed())
}

/// Diagnostic text for a rejected command line.
fn usage_message(err: &clap::Error) -> String {
    let arg = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg.clone(),
        _ => String::new(),
    };
    match err.kind() {
        ErrorKind::UnknownArgument => format!("Unknown argument, {arg}"),
        ErrorKind::InvalidValue if arg.starts_with("-o") => {
            "No output file for output file option, -o".to_string()
        }
        _ => {
            let rendered = err.render().to_string();
            let first = rendered.lines().next().unwrap_or_default();
            first.strip_prefix("error: ").unwrap_or(first).to_string()
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if std::env::args_os().len() <= 1 {
        // usage only; not a failure
        let _ = Opts::command().print_help();
        return ExitCode::SUCCESS;
    }
    let parsed = Opts::command()
        .try_get_matches()
        .and_then(|m| Opts::from_arg_matches(&m).map(|opts| (m, opts)));
    let (matches, opts) = match parsed {
        Ok(parsed) => parsed,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let colour = std::io::stderr().is_terminal();
            Reporter::stderr(colour).fatal(None, usage_message(&err));
            return ExitCode::FAILURE;
        }
    };
    match run(&opts, &steps(&matches, &opts)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            // fatal diagnostics were already printed by the reporter
            if !matches!(err.downcast_ref::<AsmError>(), Some(AsmError::Fatal(_))) {
                eprintln!("mcasm: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
