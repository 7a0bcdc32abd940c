//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load `.env` and environment configuration, start logging, open the
//!   configured database, and print a deterministic status summary.

use log::info;
use packlist_core::{open_db, open_db_in_memory, schema_version, AppConfig};
use rusqlite::Connection;
use std::error::Error;
use std::process::ExitCode;

const COUNTED_TABLES: [&str; 5] = ["users", "lists", "categories", "category_items", "items"];

fn main() -> ExitCode {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("packlist: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        packlist_core::init_logging(config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = if config.is_in_memory() {
        open_db_in_memory()?
    } else {
        open_db(&config.db_path)?
    };

    println!("packlist_core ping={}", packlist_core::ping());
    println!("packlist_core version={}", packlist_core::core_version());
    println!("schema_version={}", schema_version(&conn)?);
    for table in COUNTED_TABLES {
        println!("{table}={}", count_rows(&conn, table)?);
    }
    info!("event=cli_status module=cli status=ok");
    Ok(())
}

fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
}
