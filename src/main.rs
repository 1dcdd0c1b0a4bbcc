mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod logging;
mod maintenance;
mod models;
mod query;
mod reconciler;
mod reports;
mod settings;
mod writer;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let db = cli.db.as_deref();

    let result = match cli.command {
        Commands::Init => cli::init::run(db),
        Commands::Import { file } => cli::import::run(db, &file),
        Commands::FixDates => cli::fix_dates::run(db),
        Commands::Clear { yes } => cli::clear::run(db, yes),
        Commands::Query { sql, json } => cli::query::run(db, &sql, json),
        Commands::Schema { json } => cli::schema::run(db, json),
        Commands::Movements {
            from_date,
            to_date,
            json,
        } => cli::movements::run(db, &from_date, &to_date, json),
        Commands::Summary {
            from_date,
            to_date,
            json,
        } => cli::summary::run(db, from_date.as_deref(), to_date.as_deref(), json),
        Commands::Patterns { json } => cli::patterns::run(db, json),
        Commands::Status => cli::status::run(db),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
