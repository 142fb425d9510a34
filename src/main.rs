use amba_transpiler::{
    EmbedOptions, HtmlEmbedder, MacroPhase, Options, TranslateError, WithLowering, export_js, macros, translate_with,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "amba")]
#[command(about = "AMBA - translate a Python subset to JavaScript")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate .py files to .js
    Translate {
        /// Path to .py file or directory
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,

        /// Read from stdin and write to stdout
        #[arg(long)]
        stdin: bool,

        /// Directory for generated files (default: next to each source)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print JSON results instead of writing files
        #[arg(long)]
        json: bool,

        /// Spaces per indentation level
        #[arg(long, default_value_t = 2)]
        indent: usize,

        /// Lower `with` blocks to `using` declarations
        #[arg(long)]
        using: bool,

        /// Leave %dqs and %innerHTML escapes untouched
        #[arg(long)]
        no_macros: bool,
    },

    /// Replace tagged Python regions in an HTML file with <script> blocks
    Embed {
        /// HTML file to process
        html: PathBuf,

        /// Tag that marks embedded Python
        #[arg(long, default_value = "jiminy")]
        tag: String,

        /// Wrapper for generated code; `{}` marks the slot
        #[arg(long, default_value = "{}")]
        template: String,

        /// Write here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Expand %dqs and %innerHTML escapes only
    Macros {
        #[arg(required_unless_present = "stdin")]
        file: Option<PathBuf>,

        #[arg(long)]
        stdin: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Translate { path, stdin, out_dir, json, indent, using, no_macros } => {
            let options = Options {
                indent: " ".repeat(indent),
                with_lowering: if using { WithLowering::Using } else { WithLowering::PseudoWith },
                macros: if no_macros { MacroPhase::Off } else { MacroPhase::BeforeParse },
            };
            match (stdin, path) {
                (true, _) => translate_stdin(options, json),
                (false, Some(path)) => translate_path(&path, out_dir.as_deref(), options, json),
                (false, None) => Err(CliError::Usage("provide a file/directory or use --stdin".to_string())),
            }
        }
        Commands::Embed { html, tag, template, output } => {
            embed_file(&html, EmbedOptions { tag_name: tag, template }, output.as_deref())
        }
        Commands::Macros { file, stdin } => expand_macros(file.as_deref(), stdin),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AMBA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

/// Failure surfaced by the CLI
enum CliError {
    Usage(String),
    Read(PathBuf, io::Error),
    Write(PathBuf, io::Error),
    Translate {
        error: TranslateError,
        source: String,
        filename: String,
    },
}

impl CliError {
    fn render(&self) -> String {
        match self {
            CliError::Usage(message) => format!("error: {}\n", message),
            CliError::Read(path, e) => format!("error: failed to read {}: {}\n", path.display(), e),
            CliError::Write(path, e) => format!("error: failed to write {}: {}\n", path.display(), e),
            CliError::Translate { error, source, filename } => {
                if io::stderr().is_terminal() {
                    error.render_color(source, filename)
                } else {
                    error.render(source, filename)
                }
            }
        }
    }
}

fn read_stdin() -> Result<String, CliError> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .map_err(|e| CliError::Read(PathBuf::from("<stdin>"), e))?;
    Ok(source)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::Read(path.to_path_buf(), e))
}

fn translate_stdin(options: Options, json: bool) -> Result<(), CliError> {
    let source = read_stdin()?;
    let result = translate_with(&source, options).map_err(|error| CliError::Translate {
        error,
        source: source.clone(),
        filename: "<stdin>".to_string(),
    })?;

    if json {
        println!("{}", to_json(&result)?);
    } else {
        print!("{}", result.code);
    }
    Ok(())
}

fn translate_path(path: &Path, out_dir: Option<&Path>, options: Options, json: bool) -> Result<(), CliError> {
    let start = Instant::now();

    let files: Vec<PathBuf> = if path.is_file() {
        if path.extension().is_none_or(|ext| ext != "py") {
            return Err(CliError::Usage(format!("{} is not a .py file", path.display())));
        }
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "py"))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    } else {
        return Err(CliError::Usage(format!("{} does not exist", path.display())));
    };

    if files.is_empty() {
        return Err(CliError::Usage(format!("no .py files found in {}", path.display())));
    }

    for file in &files {
        translate_file(file, out_dir, &options, json)?;
    }

    if !json {
        print_summary(files.len(), start.elapsed());
    }
    Ok(())
}

fn translate_file(path: &Path, out_dir: Option<&Path>, options: &Options, json: bool) -> Result<(), CliError> {
    let source = read_file(path)?;
    let filename = path.display().to_string();

    let result = translate_with(&source, options.clone()).map_err(|error| CliError::Translate {
        error,
        source: source.clone(),
        filename: filename.clone(),
    })?;

    if json {
        let entry = serde_json::json!({ "file": filename, "result": result });
        println!("{}", to_json(&entry)?);
        return Ok(());
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("script");
    let dir = match out_dir {
        Some(dir) => dir,
        None => path.parent().unwrap_or(Path::new("")),
    };
    let prefix = if dir.as_os_str().is_empty() {
        String::new()
    } else {
        format!("{}/", dir.display())
    };

    let written = export_js(&result.code, stem, &prefix).map_err(|error| CliError::Translate {
        error,
        source: String::new(),
        filename,
    })?;
    print_generated(&written);
    Ok(())
}

fn embed_file(html_path: &Path, embed: EmbedOptions, output: Option<&Path>) -> Result<(), CliError> {
    let html = read_file(html_path)?;
    let filename = html_path.display().to_string();

    let embedded = HtmlEmbedder::new(embed, Options::default())
        .and_then(|embedder| embedder.embed(&html))
        .map_err(|error| CliError::Translate { error, source: html.clone(), filename })?;

    match output {
        Some(path) => {
            fs::write(path, embedded).map_err(|e| CliError::Write(path.to_path_buf(), e))?;
            print_generated(path);
        }
        None => print!("{}", embedded),
    }
    Ok(())
}

fn expand_macros(file: Option<&Path>, stdin: bool) -> Result<(), CliError> {
    let source = match (stdin, file) {
        (true, _) => read_stdin()?,
        (false, Some(path)) => read_file(path)?,
        (false, None) => return Err(CliError::Usage("provide a file or use --stdin".to_string())),
    };
    print!("{}", macros::expand(&source));
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string(value)
        .map_err(|e| CliError::Write(PathBuf::from("<stdout>"), io::Error::other(e)))
}

fn print_generated(path: &Path) {
    if io::stderr().is_terminal() {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path.display());
    } else {
        eprintln!("  ✓ {}", path.display());
    }
}

fn print_summary(count: usize, elapsed: std::time::Duration) {
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if io::stderr().is_terminal() {
        eprintln!("\n\x1b[1m✨ Translated {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\n✨ Translated {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
