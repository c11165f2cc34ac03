use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use linediff::preprocess::{Language, LineFilter, normalize, split_lines};
use linediff::{Algorithm, DiffResult, Differ, to_unified};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "linediff", version)]
#[command(about = "Line-level diff with LCS and opcode strategies")]
struct Cli {
    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two files and print a unified diff
    Diff {
        /// Original file
        old: PathBuf,
        /// Modified file
        new: PathBuf,
        /// Alignment strategy: lcs or opcode
        #[arg(short, long, default_value = "lcs")]
        algorithm: Algorithm,
        /// Skip blank lines on both sides
        #[arg(long)]
        ignore_blank: bool,
        /// Skip whole-line comments of the given language (e.g. python, cpp)
        #[arg(long, value_name = "LANG")]
        ignore_comments: Option<Language>,
        /// Label for the `---` header (defaults to the old path)
        #[arg(long)]
        old_label: Option<String>,
        /// Label for the `+++` header (defaults to the new path)
        #[arg(long)]
        new_label: Option<String>,
        /// Print change counters instead of the diff
        #[arg(long)]
        stat: bool,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
    /// Print the man page
    Man,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .init();

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Diff {
            old,
            new,
            algorithm,
            ignore_blank,
            ignore_comments,
            old_label,
            new_label,
            stat,
        } => {
            let mut filter = LineFilter::new().ignore_blank(ignore_blank);
            if let Some(language) = ignore_comments {
                filter = filter.language(language);
            }

            let old_lines = read_lines(&old, &filter)?;
            let new_lines = read_lines(&new, &filter)?;

            let old_label = old_label.unwrap_or_else(|| old.display().to_string());
            let new_label = new_label.unwrap_or_else(|| new.display().to_string());
            let result = Differ::new(algorithm)
                .labels(&old_label, &new_label)
                .compare(&old_lines, &new_lines);

            if stat {
                write_stat(&mut stdout, &result)?;
            } else if !result.identical() {
                stdout.write_all(to_unified(&result).as_bytes())?;
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "linediff", &mut stdout);
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut stdout)?;
        }
    }

    Ok(())
}

/// Read a file as terminator-free lines, dropping what the filter ignores
fn read_lines(path: &Path, filter: &LineFilter) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let lines = normalize(&split_lines(&text));
    if filter.is_noop() {
        Ok(lines)
    } else {
        Ok(filter.apply(&lines))
    }
}

fn write_stat(out: &mut impl Write, result: &DiffResult) -> std::io::Result<()> {
    let stats = result.stats();
    writeln!(out, "{} -> {}", result.label_a(), result.label_b())?;
    writeln!(out, "  algorithm:  {}", result.algorithm())?;
    writeln!(out, "  hunks:      {}", stats.hunk_count)?;
    writeln!(out, "  inserted:   {}", stats.inserted)?;
    writeln!(out, "  deleted:    {}", stats.deleted)?;
    writeln!(out, "  modified:   {}", stats.modified)?;
    writeln!(out, "  unchanged:  {}", stats.unchanged)?;
    writeln!(out, "  similarity: {:.2}%", result.similarity() * 100.0)?;
    Ok(())
}
