use openweather::{Dataset, OpenWeather, OpenWeatherError, Settings};
use std::env;

/// Downloads a typical meteorological year for Ithaca, NY and converts it to EPW.
///
/// Needs `NSRDB_API_KEY` and `NSRDB_EMAIL`; files are written under the configured
/// outputs directory (`OPENWEATHER_OUTPUTS_DIR`).
#[tokio::main]
async fn main() -> Result<(), OpenWeatherError> {
    let settings = Settings::from_env()?;
    env_logger::Builder::new()
        .filter_level(settings.log_level_filter())
        .init();

    let (Ok(api_key), Ok(email)) = (env::var("NSRDB_API_KEY"), env::var("NSRDB_EMAIL")) else {
        eprintln!("Set NSRDB_API_KEY and NSRDB_EMAIL to run this example");
        return Ok(());
    };
    let dataset: Dataset = env::var("NSRDB_DATASET")
        .unwrap_or_else(|_| "tmy".to_string())
        .parse()?;

    let client = OpenWeather::with_settings(api_key, email, settings).await?;
    let job = client
        .run_job()
        .wkt("POINT(-76.5 42.4)")
        .dataset(dataset)
        .years(vec![2023])
        .location("Ithaca")
        .state("New York")
        .country("United States")
        .call()
        .await?;

    for line in &job.logs {
        println!("{line}");
    }
    for epw in &job.epw_files {
        println!("EPW file: {}", epw.display());
    }
    Ok(())
}
