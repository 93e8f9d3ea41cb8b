use clap::{ArgAction, Parser};
use simread::checksum;
use simread::image::{DecodeOptions, SimImage, DEFAULT_MAX_FILE_SIZE};
use simread::render::{write_json, RenderOptions, TextRenderer};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "simread",
    version,
    about = "Display an IAR Simple Code (.sim) file in human-readable form"
)]
struct Cli {
    /// Image file to read
    file: PathBuf,
    /// Hide program bytes of data records
    #[arg(short = 'H', long = "hide-bytes")]
    hide_bytes: bool,
    /// Print the decoded image as JSON instead of text
    #[arg(long)]
    json: bool,
    /// Reject files of this many bytes or more
    #[arg(long, env = "SIMREAD_MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_size: u64,
    /// Exit with failure when the calculated checksum does not match
    #[arg(long)]
    strict: bool,
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true)  => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("simread: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Returns whether the run should count as a success.
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let opts  = DecodeOptions { max_file_size: cli.max_size };
    let image = SimImage::open(&cli.file, &opts)?;

    if cli.json {
        let decoded = image.decode()?;
        write_json(io::stdout().lock(), &decoded)?;
        return Ok(decoded.checksum.matches || !cli.strict);
    }

    // Text mode renders each record as soon as it is decoded, so everything
    // before a failure is still shown.
    let mut out = TextRenderer::new(
        BufWriter::new(io::stdout().lock()),
        RenderOptions { hide_program_bytes: cli.hide_bytes },
    );
    out.file_size(image.len() as u64)?;
    out.header(&image.header()?)?;

    let mut records = image.records();
    for rec in records.by_ref() {
        out.record(&rec?)?;
    }
    let embedded = records
        .end_checksum()
        .ok_or("record stream ended without an end record")?;
    out.trailing_bytes(records.remaining().len())?;

    let report = checksum::verify(image.bytes(), embedded)?;
    out.checksum(&report)?;
    out.into_inner().flush()?;

    Ok(report.matches || !cli.strict)
}
