use clap::Parser;
use std::path::PathBuf;
use students_marks::{Database, cli, config, logger};

#[derive(Parser)]
#[command(name = "students-marks", version, about = "Student marks records over an embedded document store")]
struct Cli {
    /// Config file, read after the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Operation log path; overrides config and environment
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Collection holding the student documents
    #[arg(long, global = true)]
    collection: Option<String>,
    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Cli::parse();
    let mut cfg = match config::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    // flags win over files and environment
    if args.db.is_some() {
        cfg.db_path = args.db;
    }
    if let Some(c) = args.collection {
        cfg.collection = c;
    }
    if args.log_level.is_some() {
        cfg.log_level = args.log_level;
    }

    let logging = match &cfg.log_dir {
        Some(dir) => logger::configure_logging(Some(dir.as_path()), cfg.log_level.as_deref(), cfg.log_retention),
        None => logger::configure_console(cfg.log_level.as_deref()),
    };
    if let Err(e) = logging {
        eprintln!("warning: logging disabled: {e}");
    }

    let db = match Database::from_config(&cfg) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = cli::run(&db, &cfg, args.command, &mut out) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
