//! symbio - FASTA sequence analysis from the command line
//!
//! ```bash
//! symbio analyze sample.fasta
//! zcat reads.fa.gz | symbio analyze - --filename reads.fa --json
//! symbio list --user alice
//! symbio report <id> --save
//! ```

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flate2::read::GzDecoder;
use human_panic::setup_panic;
use log::{info, warn};
use serde::Serialize;

use symbio::config::Config;
use symbio::logging;
use symbio::narrative::{self, GeminiNarrator, NarrativeSummary, Narrator};
use symbio::report;
use symbio::store::{JsonFileStore, RecordStore, RECENT_LIMIT};
use symbio::{AnalysisPipeline, AnalysisResult, Error, PipelineOptions, RawInput, Result};

/// Genomic sequence analysis: composition, GC content, ORFs and codon usage
#[derive(Parser, Debug)]
#[command(name = "symbio", author, version, about, long_about = None)]
struct Args {
    /// Directory for stored records and logs [default: ~/.symbio]
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Acting user; omitted means guest
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a FASTA file ("-" reads stdin, ".gz" is decompressed)
    Analyze {
        input: PathBuf,

        /// Name recorded for the upload [default: the input file name]
        #[arg(long)]
        filename: Option<String>,

        /// Use the template interpretation even when a model is configured
        #[arg(long)]
        no_narrative: bool,

        /// Print the result without storing it
        #[arg(long)]
        no_save: bool,

        /// Print JSON instead of the text report
        #[arg(long)]
        json: bool,

        /// Largest accepted input in bytes
        #[arg(long, value_name = "BYTES")]
        max_length: Option<usize>,
    },
    /// List stored analyses, newest first
    List,
    /// Show one stored analysis
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },
    /// Delete a stored analysis
    Delete { id: String },
    /// Write a stored sequence back out as FASTA
    Export {
        id: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render the text report of a stored analysis
    Report {
        id: String,

        #[arg(short, long, conflicts_with = "save")]
        output: Option<PathBuf>,

        /// Write to report-<name>.txt in the current directory
        #[arg(long)]
        save: bool,
    },
    /// Ask the model for an overview of recent analyses
    Summary {
        #[arg(long, default_value_t = RECENT_LIMIT)]
        limit: usize,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Analyze { .. } => "analyze",
            Command::List => "list",
            Command::Show { .. } => "show",
            Command::Delete { .. } => "delete",
            Command::Export { .. } => "export",
            Command::Report { .. } => "report",
            Command::Summary { .. } => "summary",
        }
    }
}

#[derive(Serialize)]
struct AnalysisOutput<'a> {
    id: Option<&'a str>,
    interpretation: &'a str,
    analysis: &'a AnalysisResult,
}

fn main() -> ExitCode {
    setup_panic!();
    let args = Args::parse();

    logging::set_log_level();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.log_dir()) {
        eprintln!("Warning: file logging disabled: {e}");
    }
    logging::log_system_info();

    let code = match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_validation() {
                warn!("Rejected input: {e}");
                eprintln!("Error: {e}");
            } else {
                logging::log_critical_error(&e.to_string(), Some(args.command.name()));
            }
            ExitCode::from(exit_status(&e))
        }
    };

    logging::log_shutdown();
    code
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn exit_status(error: &Error) -> u8 {
    match error {
        e if e.is_validation() => 2,
        Error::NotFound(_) => 3,
        Error::Forbidden(_) => 4,
        _ => 1,
    }
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let user = args.user.as_deref();
    let store = || JsonFileStore::open(config.records_dir());

    match &args.command {
        Command::Analyze {
            input,
            filename,
            no_narrative,
            no_save,
            json,
            max_length,
        } => {
            let limit = max_length.unwrap_or(config.max_sequence_length);
            let (text, source_name) = read_input(input, limit)?;

            let mut raw = RawInput::new(text).with_owner(user);
            if let Some(name) = filename.clone().or(source_name) {
                raw = raw.with_filename(name);
            }

            let pipeline = AnalysisPipeline::new(PipelineOptions {
                parallel: config.parallel,
            });
            let analysis = pipeline.run(&raw)?;

            let narrator = if *no_narrative {
                None
            } else {
                GeminiNarrator::from_config(config)?
            };
            let interpretation = narrative::interpret_or_fallback(
                narrator.as_ref().map(|n| n as &dyn Narrator),
                &NarrativeSummary::from(&analysis),
            );

            if *no_save {
                if *json {
                    print_json(&AnalysisOutput {
                        id: None,
                        interpretation: &interpretation,
                        analysis: &analysis,
                    })
                } else {
                    println!("{}", report::render_text(&analysis, &interpretation));
                    Ok(())
                }
            } else {
                let record = store()?.create(analysis, interpretation)?;
                info!("Stored analysis {} for {}", record.id, record.analysis.filename());
                if *json {
                    print_json(&record)
                } else {
                    println!("{}", report::render_record(&record));
                    eprintln!("Saved as {}", record.id);
                    Ok(())
                }
            }
        }
        Command::List => {
            let records = store()?.list(user)?;
            if records.is_empty() {
                println!("No stored analyses.");
            }
            for r in &records {
                println!(
                    "{}  {}  {:<24} {:>8} bp  GC {:>6.2}%  ORF {}",
                    r.id,
                    r.created_at.format("%Y-%m-%d %H:%M"),
                    r.analysis.filename(),
                    r.analysis.length(),
                    r.analysis.gc_percent(),
                    if r.analysis.orf_detected() { "yes" } else { "no" }
                );
            }
            Ok(())
        }
        Command::Show { id, json } => {
            let record = store()?.get(id)?;
            if *json {
                print_json(&record)
            } else {
                println!("{}", report::render_record(&record));
                Ok(())
            }
        }
        Command::Delete { id } => {
            store()?.delete(id, user)?;
            println!("Deleted {id}");
            Ok(())
        }
        Command::Export { id, output } => {
            let record = store()?.get(id)?;
            let fasta = report::fasta_export(&record);
            match output {
                Some(path) => write_file(path, &fasta),
                None => {
                    println!("{fasta}");
                    Ok(())
                }
            }
        }
        Command::Report { id, output, save } => {
            let record = store()?.get(id)?;
            let text = report::render_record(&record);
            let target = match output {
                Some(path) => Some(path.clone()),
                None if *save => Some(PathBuf::from(report::report_filename(
                    record.analysis.filename(),
                    "txt",
                ))),
                None => None,
            };
            match target {
                Some(path) => write_file(&path, &text),
                None => {
                    println!("{text}");
                    Ok(())
                }
            }
        }
        Command::Summary { limit } => {
            let records = store()?.recent(user, *limit)?;
            let narrator = GeminiNarrator::from_config(config)?;
            let summary =
                narrative::summarize_records(narrator.as_ref().map(|n| n as &dyn Narrator), &records)?;
            println!("{summary}");
            Ok(())
        }
    }
}

const STDIN_PATH: &str = "-";

/// Reads at most `limit` bytes of FASTA text, plus the file name to record.
fn read_input(path: &Path, limit: usize) -> Result<(String, Option<String>)> {
    let name = recorded_name(path);
    if path == Path::new(STDIN_PATH) {
        info!("Reading FASTA from stdin");
        return Ok((read_bounded(io::stdin().lock(), limit)?, name));
    }

    info!("Reading FASTA from {path:?}");
    let file = File::open(path)?;
    let text = if is_gzipped(path) {
        read_bounded(GzDecoder::new(file), limit)?
    } else {
        read_bounded(file, limit)?
    };
    Ok((text, name))
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// File name stored with the analysis: none for stdin, `.gz` removed.
fn recorded_name(path: &Path) -> Option<String> {
    if path == Path::new(STDIN_PATH) {
        return None;
    }
    let name = path.file_name()?.to_string_lossy().into_owned();
    if is_gzipped(path) {
        Some(name[..name.len() - ".gz".len()].to_string())
    } else {
        Some(name)
    }
}

fn read_bounded(reader: impl Read, limit: usize) -> Result<String> {
    let mut buf = Vec::new();
    reader
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut buf)?;
    if buf.len() > limit {
        return Err(Error::InputTooLong { limit });
    }
    Ok(String::from_utf8(buf)?)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use symbio::FastaError;
    use tempfile::tempdir;

    #[test]
    fn test_read_bounded_limits() {
        let text = b">s\nACGT";
        assert_eq!(read_bounded(&text[..], text.len()).unwrap(), ">s\nACGT");
        assert!(matches!(
            read_bounded(&text[..], text.len() - 1),
            Err(Error::InputTooLong { limit: 6 })
        ));
        assert_eq!(read_bounded(&text[..], usize::MAX).unwrap(), ">s\nACGT");
    }

    #[test]
    fn test_read_bounded_rejects_binary() {
        let err = read_bounded(&[b'>', b's', b'\n', 0xff, 0xfe][..], 100).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
        assert_eq!(exit_status(&err), 2);
    }

    #[test]
    fn test_read_input_plain_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gene.fasta");
        std::fs::write(&path, ">gene\nATGAAATAA\n").unwrap();

        let (text, name) = read_input(&path, 1000).unwrap();
        assert_eq!(text, ">gene\nATGAAATAA\n");
        assert_eq!(name.as_deref(), Some("gene.fasta"));
        assert!(matches!(read_input(&path, 5), Err(Error::InputTooLong { limit: 5 })));
    }

    #[test]
    fn test_read_input_gzip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reads.fa.GZ");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b">reads\nGGCGCGCC\n").unwrap();
        encoder.finish().unwrap();

        let (text, name) = read_input(&path, 1000).unwrap();
        assert_eq!(text, ">reads\nGGCGCGCC\n");
        assert_eq!(name.as_deref(), Some("reads.fa"));

        // The bound applies to the decompressed text.
        assert!(matches!(read_input(&path, 10), Err(Error::InputTooLong { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_input(&dir.path().join("absent.fa"), 1000).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(exit_status(&err), 1);
    }

    #[test]
    fn test_recorded_name() {
        assert_eq!(recorded_name(Path::new("-")), None);
        assert_eq!(recorded_name(Path::new("dir/x.fasta")).as_deref(), Some("x.fasta"));
        assert_eq!(recorded_name(Path::new("x.fasta.gz")).as_deref(), Some("x.fasta"));
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&Error::from(FastaError::MissingHeader)), 2);
        assert_eq!(exit_status(&Error::from(FastaError::EmptySequence)), 2);
        assert_eq!(
            exit_status(&Error::from(FastaError::InvalidCharacter { found: 'X', position: 1 })),
            2
        );
        assert_eq!(exit_status(&Error::InputTooLong { limit: 1 }), 2);
        assert_eq!(exit_status(&Error::NotFound("id".into())), 3);
        assert_eq!(exit_status(&Error::Forbidden("id".into())), 4);
        assert_eq!(exit_status(&Error::Config("bad".into())), 1);
        assert_eq!(exit_status(&Error::Narrative("empty".into())), 1);
    }
}
