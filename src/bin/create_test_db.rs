use std::error::Error;
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use time::{Duration, PrimitiveDateTime};
use tracing_subscriber::filter::LevelFilter;

use expense_tracker::{
    Category, DatabaseLocation, Expense, ExpenseId, ExpenseStore, StoreConfig,
    default_database_path, init_logging,
};

/// A utility for creating a database of sample expenses for manual testing.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to. Defaults to the app's data directory.
    #[arg(long, short)]
    output_path: Option<PathBuf>,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    #[arg(long, short, default_value = "Etc/UTC")]
    timezone: String,

    /// How many sample expenses to create.
    #[arg(long, short, default_value_t = 24)]
    count: u32,
}

const SAMPLE_TITLES: [&str; 8] = [
    "Coffee", "Bus fare", "T-shirt", "Cinema", "Power bill", "Pharmacy", "Textbook", "Gift",
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    init_logging(LevelFilter::INFO)?;

    let args = Args::parse();

    let output_path = match args.output_path {
        Some(path) => path,
        None => default_database_path()?,
    };

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'expenses.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let config = StoreConfig::new(DatabaseLocation::File(output_path), &args.timezone);
    let now = config.local_now()?;
    let store = ExpenseStore::new(config);
    store.initialize()?;

    println!("Creating {} sample expenses...", args.count);
    let today = PrimitiveDateTime::new(now.date(), now.time());

    for i in 0..args.count {
        let slot = i as usize % Category::ALL.len();
        let expense = Expense::build(
            SAMPLE_TITLES[slot],
            f64::from(i % 7 + 1) * 4.5,
            today - Duration::days(i64::from(i) * 3),
            Category::ALL[slot].clone(),
        )
        .id(ExpenseId::from_timestamp(now + Duration::milliseconds(i64::from(i))))
        .finalise(now)?;

        store.insert_or_replace(&expense)?;
    }

    tracing::info!("seeded {} expenses", args.count);
    println!("Total: {:.2}", store.sum_all()?);
    for (category, total) in store.sum_by_category()? {
        println!("  {category}: {total:.2}");
    }

    println!("Success!");

    Ok(())
}
