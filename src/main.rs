use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use merge_report::{Config, Dataset, Error, ExportFormat, HeaderMode, Pipeline};

#[derive(Parser)]
#[command(
    version,
    about = "Merge two tabular files on a shared key and export the result as CSV, XLSX or a paginated PDF"
)]
struct Cli {
    /// Where uploaded sources are stored
    #[arg(long, env = "MERGE_REPORT_UPLOADS", default_value = "uploads")]
    uploads: PathBuf,

    /// Where exported files are stored
    #[arg(long, env = "MERGE_REPORT_MERGED", default_value = "merged")]
    merged: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store both files, merge them and export the result
    Export {
        users: PathBuf,
        details: PathBuf,
        #[arg(short, long, value_enum)]
        format: FormatArg,
        #[arg(long, default_value = merge_report::DEFAULT_MERGE_KEY)]
        key: String,
        /// Where the column-name row appears in the PDF report
        #[arg(long, value_enum, default_value_t = HeaderArg::Repeat)]
        header: HeaderArg,
        #[arg(long, default_value_t = 10)]
        rows_per_page: usize,
        /// Also write the download copy here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the merged table
    Show {
        users: PathBuf,
        details: PathBuf,
        #[arg(long, default_value = merge_report::DEFAULT_MERGE_KEY)]
        key: String,
    },
    /// List uploaded and merged files
    List,
    /// Copy a stored file out of the uploads or merged folder
    Fetch {
        folder: String,
        filename: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Xlsx,
    Pdf,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Pdf => ExportFormat::Pdf,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HeaderArg {
    Repeat,
    FirstPage,
}

fn exit_code(e: &Error) -> ExitCode {
    match e {
        Error::Merge(_) => ExitCode::from(2),
        Error::EmptyResult => ExitCode::from(3),
        Error::NotFound { .. } => ExitCode::from(4),
        _ => ExitCode::FAILURE,
    }
}

fn print_table(dataset: &Dataset) {
    let widths: Vec<usize> = dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(ci, name)| {
            dataset
                .rows()
                .iter()
                .map(|row| row[ci].chars().count())
                .fold(name.chars().count(), usize::max)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(dataset.columns()));
    println!(
        "{}",
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in dataset.rows() {
        println!("{}", line(row.as_slice()));
    }
    println!("({} rows)", dataset.row_count());
}

fn write_copy(bytes: &[u8], out: &Path) -> Result<(), Error> {
    std::fs::write(out, bytes)?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = Config {
        uploads_dir: cli.uploads,
        merged_dir: cli.merged,
        ..Config::default()
    };

    match cli.command {
        Command::Export {
            users,
            details,
            format,
            key,
            header,
            rows_per_page,
            out,
        } => {
            config.merge_key = key;
            config.report.max_rows_per_page = rows_per_page;
            config.report.header_mode = match header {
                HeaderArg::Repeat => HeaderMode::Repeat,
                HeaderArg::FirstPage => HeaderMode::FirstPage,
            };
            let pipeline = Pipeline::new(config)?;

            let uploads = pipeline.upload(&users, &details)?;
            let merged = pipeline.merge(&uploads.users, &uploads.details)?;
            let export = pipeline.export(&merged, format.into())?;

            println!("{}", export.path.display());
            if let Some(out) = out {
                write_copy(&export.bytes, &out)?;
            }
        }
        Command::Show {
            users,
            details,
            key,
        } => {
            config.merge_key = key;
            let pipeline = Pipeline::new(config)?;
            let uploads = pipeline.upload(&users, &details)?;
            print_table(&pipeline.merge(&uploads.users, &uploads.details)?);
        }
        Command::List => {
            let listing = Pipeline::new(config)?.list()?;
            println!("uploads:");
            for name in &listing.uploaded {
                println!("  {name}");
            }
            println!("merged:");
            for name in &listing.merged {
                println!("  {name}");
            }
        }
        Command::Fetch {
            folder,
            filename,
            out,
        } => {
            let pipeline = Pipeline::new(config)?;
            let path = pipeline.fetch(&folder, &filename)?;
            match out {
                Some(out) => write_copy(&std::fs::read(&path)?, &out)?,
                None => println!("{}", path.display()),
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match &e {
                Error::Merge(_) => eprintln!("Error merging files: {e}"),
                Error::NotFound { filename, .. } => {
                    eprintln!("The file {filename} does not exist.")
                }
                _ => eprintln!("Error: {e}"),
            }
            exit_code(&e)
        }
    }
}
