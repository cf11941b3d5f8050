use std::path::Path;
use std::process;

use clap::error::ErrorKind;
use clap::CommandFactory;
use tracing_subscriber::EnvFilter;

use querycsv::cli::Cli;
use querycsv::output::{format_table, write_csv, CsvFormat};
use querycsv::storage::CsvReader;
use querycsv::store::{load_sources, Result, Script, Sources, StoreBacking};

fn main() {
    let cli = Cli::parse_args();
    init_tracing();

    if cli.inputs.is_empty() && cli.use_db.is_none() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "at least one --input or a --use-db database is required",
            )
            .exit();
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<()> {
    let backing = match &cli.db_file {
        Some(path) => StoreBacking::File {
            path: path.clone(),
            keep: cli.keep,
        },
        None => StoreBacking::Memory,
    };
    let sources = Sources {
        csv_files: cli.inputs.clone(),
        database: cli.use_db.clone(),
        backing,
    };

    let reader = CsvReader::new().with_optional_delimiter(cli.delimiter);
    let loader = load_sources(&sources, reader)?;
    for table in loader.tables()? {
        tracing::debug!(
            table = table.name.as_str(),
            source = ?table.source_kind,
            columns = table.column_count(),
            "table staged"
        );
    }

    let sql = cli.sql_text();
    let script = if cli.script {
        Script::from_file(Path::new(&sql))?
    } else {
        Script::parse(&sql)
    };

    let store = loader.into_store();
    match store.execute_script(&script)? {
        Some(result) => match &cli.output {
            Some(path) => {
                let format = CsvFormat {
                    quote_style: cli.quote,
                    ..CsvFormat::default()
                };
                write_csv(&result, path, &format)?;
            }
            None => print!("{}", format_table(&result)),
        },
        None => tracing::debug!("no statement produced rows"),
    }

    store.close()
}
