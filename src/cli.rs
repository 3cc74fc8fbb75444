//! Command-line surface.
//!
//! Derive-style CLI grounded on the teacher's `cmd::Cli`/help-heading idiom
//! (`#[command(after_help = ...)]`, grouped `help_heading`s); flag set
//! grounded on the original `kingpin`-based `args.go` (`ConnectionArgs`,
//! `DumpArgs`), extended with this crate's superset of output/behavior
//! flags.

use clap::Parser;

const AFTER_HELP: &str = "\x1b[1mExamples:\x1b[0m
  dbsample shop > sample.sql
  dbsample --host db.internal --user root -p shop > sample.sql
  dbsample --limit 50 --routines --triggers shop > sample.sql
  dbsample --rename-database shop_dev shop > sample.sql
  dbsample --filter \"empty users.password\" --constraint \"orders.customer_id customers.id\" shop

\x1b[1mMore info:\x1b[0m
  A single positional argument names the database to sample.
  Output is a replayable SQL script written to stdout.";

const CONNECTION: &str = "Connection";
const SELECTION: &str = "Selection";
const OUTPUT: &str = "Output";
const BEHAVIOR: &str = "Behavior";

#[derive(Parser)]
#[command(name = "dbsample")]
#[command(author = "Helge Sverre <helge.sverre@gmail.com>")]
#[command(version)]
#[command(about = "Takes a referentially consistent sample of a live MySQL database")]
#[command(after_help = AFTER_HELP)]
#[command(max_term_width = 100)]
pub struct Cli {
    /// Database to sample
    #[arg(help_heading = CONNECTION)]
    pub database: String,

    /// Server host
    #[arg(long, short = 'H', default_value = "127.0.0.1", help_heading = CONNECTION)]
    pub host: String,

    /// Server port
    #[arg(long, default_value_t = 3306, help_heading = CONNECTION)]
    pub port: u16,

    /// Connection protocol: tcp, socket, pipe, memory
    #[arg(long, default_value = "tcp", help_heading = CONNECTION)]
    pub protocol: String,

    /// Username
    #[arg(long, short = 'u', help_heading = CONNECTION)]
    pub user: Option<String>,

    /// Password; pass with no value to be prompted interactively
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "", help_heading = CONNECTION)]
    pub password: Option<String>,

    /// Include stored procedures and functions
    #[arg(long, help_heading = SELECTION)]
    pub routines: bool,

    /// Include triggers
    #[arg(long, help_heading = SELECTION)]
    pub triggers: bool,

    /// Maximum rows sampled per table; 0 means unlimited
    #[arg(long, short = 'l', default_value_t = 100, help_heading = SELECTION)]
    pub limit: u64,

    /// Synthetic foreign-key edge "child.column parent.column" (repeatable)
    #[arg(long = "constraint", help_heading = SELECTION)]
    pub constraints: Vec<String>,

    /// Value filter "name table.column [args...]" (repeatable)
    #[arg(long = "filter", help_heading = SELECTION)]
    pub filters: Vec<String>,

    /// Omit the CREATE DATABASE statement
    #[arg(long, help_heading = OUTPUT)]
    pub no_create_database: bool,

    /// Omit DROP TABLE IF EXISTS before each table's DDL
    #[arg(long, help_heading = OUTPUT)]
    pub skip_add_drop_table: bool,

    /// Batch every table's rows into one INSERT statement
    #[arg(long, help_heading = OUTPUT)]
    pub extended_insert: bool,

    /// Emit DDL and INSERTs against a different database name
    #[arg(long, help_heading = OUTPUT)]
    pub rename_database: Option<String>,

    /// Don't issue LOCK TABLES / UNLOCK TABLES around each table's SELECT
    #[arg(long, help_heading = BEHAVIOR)]
    pub skip_lock_tables: bool,
}
