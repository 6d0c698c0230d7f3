//! # Demo Catalogue Generator
//!
//! Creates (or opens) a storefront database and fills it with demo wines on
//! top of the starter seed.
//!
//! ## Usage
//! ```bash
//! # Starter seed plus 60 demo wines (default)
//! cargo run -p cellar-db --bin seed
//!
//! # Custom amount
//! cargo run -p cellar-db --bin seed -- --count 200
//!
//! # Specify database path (otherwise CELLAR_DB_PATH, then ./cellar_dev.db)
//! cargo run -p cellar-db --bin seed -- --db ./data/cellar.db
//! ```
//!
//! Demo wines cycle through the six starter categories and vintages
//! 2010-2021, priced 500,000-40,000,000.

use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cellar_core::NewProduct;
use cellar_db::{Database, DbConfig, ENV_DB_PATH};

/// Wine labels per starter category id.
const LABELS: &[(i64, &[&str])] = &[
    (1, &["Pavillon Rouge", "Pavillon Blanc", "Margaux du Château"]),
    (2, &["La Tâche", "Richebourg", "Romanée-Saint-Vivant", "Échezeaux"]),
    (3, &["Grange Bin 95", "Bin 389", "RWT Bin 798", "St Henri"]),
    (4, &["Tignanello", "Solaia", "Guado al Tasso"]),
    (5, &["Brut Impérial", "Rosé Impérial", "Dom Pérignon", "Nectar Impérial"]),
    (6, &["Sauvignon Blanc", "Te Koko", "Chardonnay", "Pinot Noir"]),
];

const VINTAGES: std::ops::RangeInclusive<u32> = 2010..=2021;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cellar_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cellar Demo Catalogue Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of demo wines to add (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ${ENV_DB_PATH} or ./cellar_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let config = match db_path {
        Some(path) => DbConfig::new(path),
        None if env::var(ENV_DB_PATH).is_ok() => DbConfig::from_env()?,
        None => DbConfig::new("./cellar_dev.db"),
    };
    info!(path = %config.database_path.display(), count, "Seeding demo catalogue");

    let db = Database::new(config).await?;
    let status = db.schema_status().await?;
    info!(
        categories = status.categories,
        products = status.products,
        users = status.users,
        "Schema ready"
    );

    if status.products > 1 {
        warn!(
            products = status.products,
            "Database already has demo products; delete the file to regenerate"
        );
        db.close().await;
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;

    for product in demo_wines().take(count) {
        match db.products().create(&product).await {
            Ok(_) => generated += 1,
            Err(e) => error!(name = %product.name, error = %e, "Failed to insert demo wine"),
        }
    }

    let elapsed = start.elapsed();
    info!(generated, ?elapsed, "Demo wines inserted");

    let margaux = db.catalog().search("margaux").await?;
    let mid_range = db.catalog().filter_by_price_range(1_000_000.0, 5_000_000.0).await?;
    info!(
        margaux = margaux.len(),
        mid_range = mid_range.len(),
        "Catalog check"
    );

    db.close().await;
    Ok(())
}

/// Endless, deterministic stream of demo wines.
fn demo_wines() -> impl Iterator<Item = NewProduct> {
    VINTAGES.cycle().enumerate().flat_map(|(round, vintage)| {
        LABELS.iter().filter_map(move |(category_id, labels)| {
            let label = labels.get(round % labels.len())?;
            let step = (round * 7 + *category_id as usize * 13) % 80;
            Some(NewProduct {
                name: format!("{label} {vintage}"),
                price: 500_000.0 + step as f64 * 493_750.0,
                img: None,
                category_id: *category_id,
            })
        })
    })
}
