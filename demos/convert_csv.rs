use openweather::{convert_csv_file, ConversionOptions, OpenWeatherError, Settings, YearLayout};
use std::env;
use std::path::PathBuf;

/// Converts an NSRDB CSV that is already on disk:
///
/// `cargo run --example convert_csv -- data/149190_2021.csv Golden CO "United States"`
///
/// Pass `--typical` for TMY files.
#[tokio::main]
async fn main() -> Result<(), OpenWeatherError> {
    let settings = Settings::from_env()?;
    env_logger::Builder::new()
        .filter_level(settings.log_level_filter())
        .init();

    let (flags, positional): (Vec<String>, Vec<String>) =
        env::args().skip(1).partition(|arg| arg.starts_with("--"));
    let layout = if flags.iter().any(|f| f == "--typical") {
        YearLayout::Typical
    } else {
        YearLayout::Calendar
    };

    let mut args = positional.into_iter();
    let Some(csv_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: convert_csv [--typical] <csv file> [location] [state] [country]");
        return Ok(());
    };
    let location = args.next();
    let state = args.next();
    let country = args.next();

    let converted = convert_csv_file()
        .csv_path(&csv_path)
        .maybe_location(location.as_deref())
        .maybe_state(state.as_deref())
        .maybe_country(country.as_deref())
        .options(ConversionOptions::builder().layout(layout).build())
        .call()
        .await?;

    println!("EPW file: {}", converted.epw_path.display());
    println!("{:#?}", converted.report);
    Ok(())
}
