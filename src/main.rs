mod cli;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands, ExplicitArgs, LocationArgs};
use cropwise::datasources::{
    HttpSoilClassifier, OpenWeatherMapClient, SoilClassifier, SoilFeatures,
};
use cropwise::logic::require_coordinates;
use cropwise::{
    Config, Database, DetectedEnvironment, EnvironmentInput, RecommendationOutcome,
    RecommendationRecord, RecommendationRequest, RecommendationService, TelemetryMerger,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_OWNER: &str = "local";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Recommend(ref args) => run_recommend(&cli, args).await,
        Commands::Detect(ref location) => run_detect(&cli, location).await,
        Commands::Auto {
            ref location,
            no_save,
        } => run_auto(&cli, location, no_save).await,
        Commands::History { ref user, limit } => run_history(&cli, user.as_deref(), limit),
        Commands::Init => {
            Config::setup_interactive()?;
            Ok(())
        }
        Commands::Check => run_check(&cli).await,
    }
}

async fn run_recommend(cli: &Cli, args: &ExplicitArgs) -> anyhow::Result<()> {
    // Explicit mode needs no upstreams, so a missing or broken config only
    // costs us the owner name.
    let owner = match Config::load(cli.config.clone()) {
        Ok(config) => config.farm.owner,
        Err(e) => {
            tracing::debug!("No usable config ({}), recording as {}", e, DEFAULT_OWNER);
            DEFAULT_OWNER.to_string()
        }
    };

    let input = EnvironmentInput {
        soil_type: args.soil.clone(),
        temperature_c: args.temperature,
        rainfall_mm: args.rainfall,
        season: args.season.clone(),
    };

    let service = RecommendationService::explicit_only();
    let outcome = service
        .recommend(RecommendationRequest::Explicit(input))
        .await?;

    print_outcome(cli.json, &outcome)?;

    if !args.no_save {
        save_outcome(cli.data_dir.as_ref(), &owner, &outcome)?;
    }

    Ok(())
}

async fn run_detect(cli: &Cli, location: &LocationArgs) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let (latitude, longitude) = resolve_location(&config, location)?;

    let service = RecommendationService::new(TelemetryMerger::from_config(&config)?);
    let detected = service.detect_environment(latitude, longitude).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&detected)?);
    } else {
        print_detected(&detected);
    }

    Ok(())
}

async fn run_auto(cli: &Cli, location: &LocationArgs, no_save: bool) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let (latitude, longitude) = coordinates_or_default(&config, location);

    let service = RecommendationService::new(TelemetryMerger::from_config(&config)?);
    let outcome = service
        .recommend(RecommendationRequest::AutoDetect {
            latitude,
            longitude,
        })
        .await?;

    print_outcome(cli.json, &outcome)?;

    if !no_save {
        save_outcome(cli.data_dir.as_ref(), &config.farm.owner, &outcome)?;
    }

    Ok(())
}

fn run_history(cli: &Cli, user: Option<&str>, limit: usize) -> anyhow::Result<()> {
    let owner = match user {
        Some(u) => u.to_string(),
        None => Config::load(cli.config.clone())
            .map(|c| c.farm.owner)
            .unwrap_or_else(|_| DEFAULT_OWNER.to_string()),
    };

    let db = Database::open(cli.data_dir.as_ref())?;
    let records = db.recommendations_for_user(&owner, limit)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No saved recommendations for {}", owner);
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {:<24} {} / {:.1}°C / {:.1}mm / {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.recommendation.crop_name,
            record.sample.soil_type,
            record.sample.temperature_c,
            record.sample.rainfall_mm,
            record.sample.season,
        );
    }

    Ok(())
}

async fn run_check(cli: &Cli) -> anyhow::Result<()> {
    println!("Checking configuration...");
    let config = load_config(cli)?;
    println!("  Config: OK");

    let (latitude, longitude) = match coordinates_or_default(&config, &LocationArgs::default()) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => (0.0, 0.0),
    };

    println!("Checking connections...");
    let weather = OpenWeatherMapClient::new(config.openweathermap.clone())?;
    match weather.test_connection(latitude, longitude).await {
        Ok(true) => println!("  OpenWeatherMap: OK"),
        Ok(false) => println!("  OpenWeatherMap: FAILED"),
        Err(e) => println!("  OpenWeatherMap: ERROR ({})", e),
    }

    match config.soil_classifier {
        Some(ref classifier_config) => {
            let classifier = HttpSoilClassifier::new(classifier_config.clone())?;
            let probe = SoilFeatures {
                latitude,
                longitude,
                temperature_c: 25.0,
                humidity_pct: 50.0,
                rainfall_mm: 100.0,
            };
            match classifier.predict(&probe).await {
                Ok(soil) => println!("  Soil classifier: OK (probe answered {})", soil),
                Err(e) => println!("  Soil classifier: FAILED ({})", e),
            }
        }
        None => println!("  Soil classifier: not configured (soil defaults to Loamy)"),
    }

    let db = Database::open(cli.data_dir.as_ref())?;
    println!("  History database: OK ({})", db.path().display());

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    Config::load(cli.config.clone())
        .context("Configuration error (run `cropwise init`, or copy config/config.yaml.example)")
}

/// Command-line coordinates, each falling back to the configured farm location.
fn coordinates_or_default(config: &Config, location: &LocationArgs) -> (Option<f64>, Option<f64>) {
    (
        location.lat.or(config.farm.latitude),
        location.lon.or(config.farm.longitude),
    )
}

fn resolve_location(config: &Config, location: &LocationArgs) -> anyhow::Result<(f64, f64)> {
    let (latitude, longitude) = coordinates_or_default(config, location);
    Ok(require_coordinates(latitude, longitude)?)
}

fn save_outcome(
    data_dir: Option<&PathBuf>,
    owner: &str,
    outcome: &RecommendationOutcome,
) -> anyhow::Result<()> {
    let db = Database::open(data_dir)?;
    let record = RecommendationRecord::new(
        owner,
        outcome.sample,
        outcome.recommendation.clone(),
        Utc::now(),
    );
    let id = db.save_recommendation(&record)?;
    tracing::debug!(id, owner, "Saved recommendation");
    Ok(())
}

fn print_outcome(json: bool, outcome: &RecommendationOutcome) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    if let Some(ref detected) = outcome.detected {
        print_detected(detected);
        println!();
    }

    println!("Recommended crop: {}", outcome.recommendation.crop_name);
    println!("Fertilizer:       {}", outcome.recommendation.fertilizer_advice);
    println!(
        "Based on:         {} soil, {:.1}°C, {:.1}mm, {} ({})",
        outcome.sample.soil_type,
        outcome.sample.temperature_c,
        outcome.sample.rainfall_mm,
        outcome.sample.season,
        outcome.rule_id.unwrap_or("default"),
    );
    Ok(())
}

fn print_detected(detected: &DetectedEnvironment) {
    let sample = &detected.sample;
    println!(
        "Location:    {}",
        detected.location.as_deref().unwrap_or("unknown")
    );
    println!("Soil:        {} ({})", sample.soil_type, detected.soil_source);
    println!("Temperature: {:.1}°C", sample.temperature_c);
    println!("Humidity:    {:.0}%", detected.humidity_pct);
    println!(
        "Rainfall:    {:.1}mm ({})",
        sample.rainfall_mm, detected.rainfall_source
    );
    println!("Season:      {}", sample.season);
}
