use clap::Parser;
use std::path::PathBuf;

use crate::output::QuoteStyle;

#[derive(Parser, Debug)]
#[command(name = "querycsv")]
#[command(author, version, about = "Run SQL against delimited text files")]
pub struct Cli {
    /// Input CSV file; repeat for more files. Each becomes a table named after the file
    #[arg(short, long = "input", value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Use an existing SQLite file as the database (ignores -i, -f and -k)
    #[arg(short = 'u', long = "use-db", value_name = "FILE")]
    pub use_db: Option<PathBuf>,

    /// Write the result to this file as CSV instead of printing a table
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Treat the positional argument as the path of a SQL script
    #[arg(short, long)]
    pub script: bool,

    /// Stage the CSV data in this SQLite file instead of memory
    #[arg(short = 'f', long = "db-file", value_name = "FILE")]
    pub db_file: Option<PathBuf>,

    /// Keep the --db-file after the run
    #[arg(short, long, requires = "db_file")]
    pub keep: bool,

    /// Input delimiter; sniffed from the header line when omitted
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// Quoting style for CSV output
    #[arg(long, default_value = "necessary")]
    pub quote: QuoteStyle,

    /// SQL to execute, or the script path with --script
    #[arg(required = true, value_name = "SQL")]
    pub sql: Vec<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Positional words joined with spaces.
    pub fn sql_text(&self) -> String {
        self.sql.join(" ")
    }
}
