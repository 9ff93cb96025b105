mod output;
mod search;
mod viewport;

use clap::{Parser, Subcommand};
use clinicmap_core::{haversine_km, AppConfig, LatLng};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "clinicmap")]
#[command(about = "Find dental clinics and the map view that shows them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search clinics by keyword
    Search {
        /// Name, suburb or postcode to search for
        keywords: String,
        /// Your location as LAT,LNG (e.g. -33.87,151.21); replaces any cached one
        #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true)]
        near: Option<LatLng>,
        /// Skip address geocoding even when an API key is configured
        #[arg(long)]
        no_geocode: bool,
        /// Maximum number of clinics to print
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Great-circle distance in kilometres between two LAT,LNG points
    Distance {
        #[arg(value_parser = parse_lat_lng, allow_hyphen_values = true)]
        from: LatLng,
        #[arg(value_parser = parse_lat_lng, allow_hyphen_values = true)]
        to: LatLng,
    },
    /// Forget the cached user location
    ClearLocation,
}

fn parse_lat_lng(raw: &str) -> Result<LatLng, String> {
    LatLng::parse(raw).map_err(|e| e.to_string())
}

/// Logs go to stderr so stdout stays clean for results. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> anyhow::Result<AppConfig> {
    let config = clinicmap_core::load_app_config()?;
    init_tracing(&config.log_level);
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search {
            keywords,
            near,
            no_geocode,
            limit,
        } => {
            let config = load_config()?;
            let args = search::SearchArgs {
                keywords,
                near,
                no_geocode,
                limit,
            };
            search::run_search(&config, &args).await?;
        }
        Commands::Distance { from, to } => {
            init_tracing("info");
            println!("{}", output::format_distance(Some(haversine_km(from, to))));
        }
        Commands::ClearLocation => {
            let config = load_config()?;
            search::run_clear_location(&config);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
