use std::path::PathBuf;

use remora::{Converter, samples};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Remora(remora::Error),
    Json(serde_json::Error),
    Incomplete { converted: usize, total: usize },
    DependenciesUnavailable,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Remora(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Incomplete { converted, total } => {
                write!(f, "converted {converted}/{total} files")
            }
            CliError::DependenciesUnavailable => write!(f, "Mermaid CLI is not available"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<remora::Error> for CliError {
    fn from(value: remora::Error) -> Self {
        Self::Remora(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Default)]
struct Args {
    file: Option<PathBuf>,
    out: Option<PathBuf>,
    dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    text: Option<String>,
    config: Option<PathBuf>,
    sample: bool,
    check: bool,
}

fn usage() -> &'static str {
    "remora-cli\n\
\n\
USAGE:\n\
  remora-cli -f <diagram.mmd> [-o <out.png>] [-c <config.json>]\n\
  remora-cli -d <input-dir> [--out-dir <output-dir>] [-c <config.json>]\n\
  remora-cli -t <mermaid source> [-o <out.png>] [-c <config.json>]\n\
  remora-cli --sample\n\
  remora-cli --check\n\
\n\
OPTIONS:\n\
  -f, --file <path>      Convert a single .mmd file\n\
  -o, --out <path>       Output PNG path (defaults next to the input, or output.png for -t)\n\
  -d, --dir <path>       Convert every .mmd file in a directory\n\
      --out-dir <path>   Output directory for -d (defaults to the input directory)\n\
  -t, --text <source>    Convert Mermaid source given on the command line\n\
  -c, --config <path>    Mermaid configuration file (JSON)\n\
      --sample           Write sample.mmd into the current directory\n\
      --check            Check whether the Mermaid CLI is usable\n\
  -h, --help             Show this help\n\
\n\
NOTES:\n\
  - When no Mermaid CLI is found, conversions produce a placeholder image.\n\
  - Batch mode exits non-zero unless every file converted.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();
    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--sample" => args.sample = true,
            "--check" => args.check = true,
            "-f" | "--file" => args.file = Some(next_value(&mut it)?.into()),
            "-o" | "--out" => args.out = Some(next_value(&mut it)?.into()),
            "-d" | "--dir" => args.dir = Some(next_value(&mut it)?.into()),
            "--out-dir" => args.out_dir = Some(next_value(&mut it)?.into()),
            "-t" | "--text" => args.text = Some(next_value(&mut it)?),
            "-c" | "--config" => args.config = Some(next_value(&mut it)?.into()),
            _ => return Err(CliError::Usage(usage())),
        }
    }

    let actions = [
        args.file.is_some(),
        args.dir.is_some(),
        args.text.is_some(),
        args.sample,
        args.check,
    ]
    .iter()
    .filter(|set| **set)
    .count();
    if actions != 1 {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn next_value(it: &mut dyn Iterator<Item = &String>) -> Result<String, CliError> {
    it.next().cloned().ok_or(CliError::Usage(usage()))
}

fn load_config(path: Option<&PathBuf>) -> Result<Option<serde_json::Value>, CliError> {
    match path {
        None => Ok(None),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(Some(serde_json::from_str(&text)?))
        }
    }
}

fn report(conversion: &remora::Conversion) {
    if conversion.degraded {
        println!(
            "wrote {} (placeholder fallback: {})",
            conversion.output.display(),
            conversion.detail.as_deref().unwrap_or("unknown reason")
        );
    } else {
        println!("wrote {}", conversion.output.display());
    }
}

fn run(args: Args) -> Result<(), CliError> {
    if args.sample {
        let path = PathBuf::from("sample.mmd");
        samples::write_sample(&path)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let config = load_config(args.config.as_ref())?;
    let converter = Converter::discover();

    if args.check {
        return if converter.check_dependencies() {
            let label = converter
                .active_candidate()
                .map(|c| c.label())
                .unwrap_or_default();
            println!("Mermaid CLI is available: {label}");
            Ok(())
        } else {
            Err(CliError::DependenciesUnavailable)
        };
    }

    if let Some(text) = &args.text {
        let out = args.out.clone().unwrap_or_else(|| PathBuf::from("output.png"));
        let conversion = converter.convert(text, &out, config.as_ref())?;
        report(&conversion);
        return Ok(());
    }

    if let Some(file) = &args.file {
        let conversion = converter.convert_file(file, args.out.as_deref(), config.as_ref())?;
        report(&conversion);
        return Ok(());
    }

    if let Some(dir) = &args.dir {
        let summary = converter.batch_convert(dir, args.out_dir.as_deref(), config.as_ref())?;
        println!(
            "converted {}/{} files from {}",
            summary.converted,
            summary.total,
            dir.display()
        );
        // Partial success is still an overall failure for exit-code purposes.
        if !summary.all_converted() {
            return Err(CliError::Incomplete {
                converted: summary.converted,
                total: summary.total,
            });
        }
        return Ok(());
    }

    Err(CliError::Usage(usage()))
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(args) => args,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
