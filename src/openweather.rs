//! Main entry point: download NSRDB time series for a geometry and turn them into EPW files.

use crate::config::Settings;
use crate::epw::converter::{write_epw_file, ConversionOptions};
use crate::epw::error::FormatError;
use crate::epw::row::ConversionReport;
use crate::error::OpenWeatherError;
use crate::nsrdb::client::{DownloadRequest, NsrdbClient};
use crate::nsrdb::parser::parse_nsrdb_csv;
use crate::types::dataset::Dataset;
use crate::types::location::{LatLon, LocationMetadata};
use crate::types::wkt::parse as parse_wkt;
use crate::utils::{ensure_dir_exists, epw_file_name, job_directory_name};
use bon::{bon, builder};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::task;

const UNKNOWN: &str = "Unknown";

/// An NSRDB CSV and the EPW file produced from it.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedFile {
    pub csv_path: PathBuf,
    pub epw_path: PathBuf,
    pub location: LocationMetadata,
    pub report: ConversionReport,
}

/// Everything a finished job wrote.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_dir: PathBuf,
    pub location_ids: Vec<u64>,
    pub csv_files: Vec<PathBuf>,
    pub epw_files: Vec<PathBuf>,
    pub reports: Vec<ConversionReport>,
    pub logs: Vec<String>,
}

/// Converts a downloaded NSRDB CSV into an EPW file in the same directory.
///
/// The file is named `<location>_<lat>_<lon>_<year>.epw` after the coordinates in the CSV
/// metadata and the year of its first record. Place names default to `Unknown`. Records must
/// all belong to that year unless `options` sets
/// [`YearLayout::Typical`](crate::YearLayout::Typical), which TMY files need.
///
/// This function uses a builder pattern.
///
/// # Examples
///
/// ```no_run
/// # use openweather::{convert_csv_file, OpenWeatherError};
/// # use std::path::Path;
/// # #[tokio::main]
/// # async fn main() -> Result<(), OpenWeatherError> {
/// let converted = convert_csv_file()
///     .csv_path(Path::new("outputs/149190_2021.csv"))
///     .location("Golden")
///     .state("CO")
///     .country("United States")
///     .call()
///     .await?;
/// println!("Wrote {}", converted.epw_path.display());
/// # Ok(())
/// # }
/// ```
#[builder]
pub async fn convert_csv_file(
    csv_path: &Path,
    location: Option<&str>,
    state: Option<&str>,
    country: Option<&str>,
    options: Option<ConversionOptions>,
) -> Result<ConvertedFile, OpenWeatherError> {
    let bytes = tokio::fs::read(csv_path)
        .await
        .map_err(|e| OpenWeatherError::CsvRead(csv_path.to_path_buf(), e))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(OpenWeatherError::EmptyCsv(csv_path.to_path_buf()));
    }

    let csv_path = csv_path.to_path_buf();
    let location = location.unwrap_or(UNKNOWN).to_string();
    let state = state.unwrap_or(UNKNOWN).to_string();
    let country = country.unwrap_or(UNKNOWN).to_string();
    let options = options.unwrap_or_default();

    task::spawn_blocking(move || -> Result<ConvertedFile, OpenWeatherError> {
        let parsed = parse_nsrdb_csv(&bytes)?;
        let year = parsed.first_year().ok_or(FormatError::EmptySource)?;

        let metadata = parsed.metadata.to_location(&location, &state, &country);
        let file_name = epw_file_name(&location, metadata.latitude, metadata.longitude, year);
        let epw_path = match csv_path.parent() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        };
        info!(
            "Converting {} to {}",
            csv_path.display(),
            epw_path.display()
        );

        let report = write_epw_file(&epw_path, parsed.records, &metadata, year, &options)?;
        Ok(ConvertedFile {
            csv_path,
            epw_path,
            location: metadata,
            report,
        })
    })
    .await?
}

/// Conversion options for a job. The dataset decides the year layout.
fn job_options(dataset: Dataset, options: Option<ConversionOptions>) -> ConversionOptions {
    let mut options = options.unwrap_or_default();
    let layout = dataset.year_layout();
    if options.layout != layout {
        debug!("Converting {} data with the {:?} year layout", dataset, layout);
        options.layout = layout;
    }
    options
}

/// Client that runs NSRDB download and conversion jobs.
///
/// # Examples
///
/// ```no_run
/// # use openweather::{Dataset, OpenWeather, OpenWeatherError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), OpenWeatherError> {
/// let client = OpenWeather::new("my-api-key", "me@example.com").await?;
/// let job = client
///     .run_job()
///     .wkt("POINT(-105.18 39.74)")
///     .dataset(Dataset::Conus)
///     .years(vec![2022])
///     .location("Golden")
///     .state("CO")
///     .country("United States")
///     .call()
///     .await?;
/// println!("{} EPW file(s) in {}", job.epw_files.len(), job.job_dir.display());
/// # Ok(())
/// # }
/// ```
pub struct OpenWeather {
    settings: Settings,
    nsrdb: NsrdbClient,
}

#[bon]
impl OpenWeather {
    /// Creates a client with settings read from the environment. See [`Settings::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`OpenWeatherError::Config`] for malformed environment variables and
    /// [`OpenWeatherError::OutputDirCreation`] if the outputs directory cannot be created.
    pub async fn new(
        api_key: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, OpenWeatherError> {
        let settings = Settings::from_env()?;
        Self::with_settings(api_key, email, settings).await
    }

    pub async fn with_settings(
        api_key: impl Into<String>,
        email: impl Into<String>,
        settings: Settings,
    ) -> Result<Self, OpenWeatherError> {
        ensure_dir_exists(&settings.outputs_dir)
            .await
            .map_err(|e| OpenWeatherError::OutputDirCreation(settings.outputs_dir.clone(), e))?;
        let nsrdb = NsrdbClient::builder()
            .api_key(api_key)
            .email(email)
            .api_base_url(settings.api_base_url.clone())
            .maps_api_url(settings.maps_api_url.clone())
            .build();
        Ok(Self { settings, nsrdb })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Converts an NSRDB CSV already on disk. See [`convert_csv_file`].
    #[builder]
    pub async fn convert_csv(
        &self,
        csv_path: &Path,
        location: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
        options: Option<ConversionOptions>,
    ) -> Result<ConvertedFile, OpenWeatherError> {
        convert_csv_file()
            .csv_path(csv_path)
            .maybe_location(location)
            .maybe_state(state)
            .maybe_country(country)
            .maybe_options(options)
            .call()
            .await
    }

    /// Downloads every (year, location id) CSV covered by `wkt` into a new job directory
    /// and converts each to EPW.
    ///
    /// The job directory is `<location>_<state>_<country>_<YYYYMMDD_HHMMSS>` under the
    /// configured outputs directory. Repeated years are requested once. Downloads run one
    /// after another with the configured delay in between; the first failure ends the job.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.wkt(&str)`: **Required.** `POINT`, `POLYGON` or `MULTIPOLYGON` in `lon lat` order.
    /// * `.dataset(Dataset)`: **Required.**
    /// * `.years(Vec<i32>)`: **Required.** Calendar years, or TMY edition years for [`Dataset::Tmy`].
    /// * `.interval(u32)`: Optional. Minutes between records, defaults to `60`.
    /// * `.location(&str)`, `.state(&str)`, `.country(&str)`: Optional place names for file names
    ///   and the EPW header, default `Unknown`.
    /// * `.convert_to_epw(bool)`: Optional. Set `false` to only download. Defaults to `true`.
    /// * `.options(ConversionOptions)`: Optional. Applied to every conversion, with the year
    ///   layout taken from `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenWeatherError::Wkt`] for a geometry NSRDB would reject,
    /// [`OpenWeatherError::NoYears`] when `years` is empty, [`OpenWeatherError::Nsrdb`] for
    /// request and download failures, and conversion errors from [`convert_csv_file`].
    #[builder]
    pub async fn run_job(
        &self,
        wkt: &str,
        dataset: Dataset,
        years: Vec<i32>,
        interval: Option<u32>,
        location: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
        convert_to_epw: Option<bool>,
        options: Option<ConversionOptions>,
    ) -> Result<JobResult, OpenWeatherError> {
        let geometry = parse_wkt(wkt)?;
        let mut unique_years: Vec<i32> = Vec::with_capacity(years.len());
        for year in years {
            if !unique_years.contains(&year) {
                unique_years.push(year);
            }
        }
        let first_year = *unique_years.first().ok_or(OpenWeatherError::NoYears)?;

        let interval = interval.unwrap_or(60);
        if !dataset.supports_interval(interval) {
            warn!(
                "{} does not list a {}-minute interval (supported: {:?})",
                dataset,
                interval,
                dataset.intervals()
            );
        }
        for year in unique_years.iter().filter(|y| !dataset.supports_year(**y)) {
            warn!("{} does not list year {}", dataset, year);
        }

        let location = location.unwrap_or(UNKNOWN);
        let state = state.unwrap_or(UNKNOWN);
        let country = country.unwrap_or(UNKNOWN);
        let convert_to_epw = convert_to_epw.unwrap_or(true);
        let options = job_options(dataset, options);

        let started = chrono::Local::now().naive_local();
        let job_dir = self
            .settings
            .outputs_dir
            .join(job_directory_name(location, state, country, started));
        ensure_dir_exists(&job_dir)
            .await
            .map_err(|e| OpenWeatherError::OutputDirCreation(job_dir.clone(), e))?;

        let mut logs = Vec::new();
        logs.push(match geometry.representative_point() {
            Some(LatLon(lat, lon)) => format!(
                "Job for {} ({:.4}, {:.4}) using {}",
                location, lat, lon, dataset
            ),
            None => format!("Job for {} using {}", location, dataset),
        });
        info!("{}", logs[0]);

        let location_ids = self
            .nsrdb
            .resolve_location_ids(wkt, dataset, first_year)
            .await?;
        logs.push(format!("Resolved {} location id(s)", location_ids.len()));

        let total = unique_years.len() * location_ids.len();
        let mut csv_files = Vec::with_capacity(total);
        let mut epw_files = Vec::new();
        let mut reports = Vec::new();

        for year in &unique_years {
            for location_id in &location_ids {
                if !csv_files.is_empty() {
                    tokio::time::sleep(self.settings.request_delay()).await;
                }
                let request = DownloadRequest::builder()
                    .dataset(dataset)
                    .location_id(*location_id)
                    .year(*year)
                    .interval(interval)
                    .build();
                let csv_path =
                    job_dir.join(format!("{}_{}.csv", location_id, dataset.year_name(*year)));
                self.nsrdb.download_csv_to(&request, &csv_path).await?;
                csv_files.push(csv_path.clone());
                info!("Download progress: {}/{}", csv_files.len(), total);

                if convert_to_epw {
                    let converted = convert_csv_file()
                        .csv_path(&csv_path)
                        .location(location)
                        .state(state)
                        .country(country)
                        .options(options.clone())
                        .call()
                        .await?;
                    epw_files.push(converted.epw_path);
                    reports.push(converted.report);
                }
            }
        }

        logs.push(format!("Generated {} CSV files", csv_files.len()));
        logs.push(format!("Generated {} EPW files", epw_files.len()));
        info!(
            "Job finished in {}: {} CSV, {} EPW",
            job_dir.display(),
            csv_files.len(),
            epw_files.len()
        );

        Ok(JobResult {
            job_dir,
            location_ids,
            csv_files,
            epw_files,
            reports,
            logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epw::error::ConvertError;
    use crate::epw::row::YearLayout;
    use crate::nsrdb::parser::test_support::synthetic_csv;
    use crate::types::wkt::WktError;
    use chrono::NaiveDate;

    /// Twelve months taken from twelve different years, 2009 through 2020.
    fn typical_year_csv() -> String {
        let mut lines: Vec<String> = Vec::new();
        for month in 1..=12u32 {
            let source_year = 2008 + month as i32;
            let source = synthetic_csv(source_year, 60);
            if month == 1 {
                lines.extend(source.lines().take(3).map(str::to_string));
            }
            let prefix = format!("{},{},", source_year, month);
            lines.extend(
                source
                    .lines()
                    .skip(3)
                    .filter(|line| line.starts_with(&prefix))
                    .map(str::to_string),
            );
        }
        lines.join("\n") + "\n"
    }

    async fn client_in(dir: &Path) -> OpenWeather {
        let settings = Settings {
            outputs_dir: dir.join("outputs"),
            request_delay_ms: 0,
            ..Settings::default()
        };
        OpenWeather::with_settings("test-key", "test@example.com", settings)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_convert_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("149190_2021.csv");
        std::fs::write(&csv_path, synthetic_csv(2021, 60)).unwrap();

        let converted = convert_csv_file()
            .csv_path(&csv_path)
            .location("Golden")
            .state("CO")
            .country("USA")
            .call()
            .await
            .unwrap();

        assert_eq!(
            converted.epw_path,
            dir.path().join("Golden_39.74_-105.18_2021.epw")
        );
        let contents = std::fs::read_to_string(&converted.epw_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 8768);
        assert_eq!(
            lines[0],
            "LOCATION,Golden,CO,USA,NSRDB,149190,39.74,-105.18,-7.0,1829.0"
        );
        assert!(lines[8767].starts_with("2021,12,31,24,0,"));
        assert_eq!(converted.report.rows, 8760);
    }

    #[tokio::test]
    async fn test_convert_half_hourly_csv_through_client() {
        let dir = tempfile::tempdir().unwrap();
        let client = client_in(dir.path()).await;
        assert!(client.settings().outputs_dir.is_dir());

        let csv_path = dir.path().join("149190_2020.csv");
        std::fs::write(&csv_path, synthetic_csv(2020, 30)).unwrap();
        let converted = client
            .convert_csv()
            .csv_path(&csv_path)
            .call()
            .await
            .unwrap();

        assert_eq!(
            converted.epw_path.file_name().unwrap(),
            "Unknown_39.74_-105.18_2020.epw"
        );
        assert_eq!(converted.report.rows, 8784);
        assert_eq!(converted.report.source_records, 17568);
    }

    #[tokio::test]
    async fn test_convert_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            convert_csv_file().csv_path(&missing).call().await,
            Err(OpenWeatherError::CsvRead(..))
        ));

        let empty = dir.path().join("empty.csv");
        std::fs::write(&empty, "\n").unwrap();
        assert!(matches!(
            convert_csv_file().csv_path(&empty).call().await,
            Err(OpenWeatherError::EmptyCsv(_))
        ));

        let truncated = dir.path().join("1_2021.csv");
        let csv = synthetic_csv(2021, 60);
        let cut: String = csv.lines().take(1000).map(|l| format!("{l}\n")).collect();
        std::fs::write(&truncated, cut).unwrap();
        assert!(matches!(
            convert_csv_file().csv_path(&truncated).call().await,
            Err(OpenWeatherError::Convert(_))
        ));
        assert!(!dir.path().join("Unknown_39.74_-105.18_2021.epw").exists());
    }

    #[tokio::test]
    async fn test_out_of_year_row_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("149190_2021.csv");
        let csv = synthetic_csv(2021, 60).replace("\n2021,6,15,10,0,", "\n2020,6,15,10,0,");
        std::fs::write(&csv_path, csv).unwrap();

        let result = convert_csv_file().csv_path(&csv_path).call().await;
        let stray = NaiveDate::from_ymd_opt(2020, 6, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert!(matches!(
            result,
            Err(OpenWeatherError::Convert(ConvertError::Format(FormatError::OutsideYear {
                timestamp,
                year: 2021,
            }))) if timestamp == stray
        ));
        assert!(!dir.path().join("Unknown_39.74_-105.18_2021.epw").exists());
    }

    #[tokio::test]
    async fn test_typical_year_needs_typical_layout() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("149190_tmy-2023.csv");
        std::fs::write(&csv_path, typical_year_csv()).unwrap();

        let calendar = convert_csv_file().csv_path(&csv_path).call().await;
        assert!(matches!(
            calendar,
            Err(OpenWeatherError::Convert(ConvertError::Format(
                FormatError::OutsideYear { year: 2009, .. }
            )))
        ));

        let converted = convert_csv_file()
            .csv_path(&csv_path)
            .options(job_options(Dataset::Tmy, None))
            .call()
            .await
            .unwrap();
        assert_eq!(converted.report.layout, YearLayout::Typical);
        assert_eq!(converted.report.rows, 8760);
        assert_eq!(
            converted.epw_path,
            dir.path().join("Unknown_39.74_-105.18_2009.epw")
        );
        let contents = std::fs::read_to_string(&converted.epw_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[7], "DATA PERIODS,1,1,Data,Monday, 1/ 1,12/31");
        assert!(lines[8].starts_with("2009,1,1,1,0,"));
        assert!(lines[8767].starts_with("2020,12,31,24,0,"));
    }

    #[test]
    fn test_job_options_follow_dataset() {
        assert_eq!(job_options(Dataset::Tmy, None).layout, YearLayout::Typical);

        let typical = ConversionOptions::builder()
            .layout(YearLayout::Typical)
            .comments_2("kept")
            .build();
        let options = job_options(Dataset::Conus, Some(typical));
        assert_eq!(options.layout, YearLayout::Calendar);
        assert_eq!(options.comments_2.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_run_job_validates_before_downloading() {
        let dir = tempfile::tempdir().unwrap();
        let client = client_in(dir.path()).await;

        let bad_wkt = client
            .run_job()
            .wkt("LINESTRING(-105.2 39.7, -105.1 39.8)")
            .dataset(Dataset::Conus)
            .years(vec![2022])
            .call()
            .await;
        assert!(matches!(
            bad_wkt,
            Err(OpenWeatherError::Wkt(WktError::UnsupportedType(_)))
        ));

        let no_years = client
            .run_job()
            .wkt("POINT(-105.18 39.74)")
            .dataset(Dataset::Conus)
            .years(vec![])
            .call()
            .await;
        assert!(matches!(no_years, Err(OpenWeatherError::NoYears)));
    }

    #[tokio::test]
    #[ignore = "requires network access and NSRDB_API_KEY"]
    async fn test_run_job_live() {
        let api_key = std::env::var("NSRDB_API_KEY").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            outputs_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let client = OpenWeather::with_settings(api_key, "openweather@example.com", settings)
            .await
            .unwrap();

        let job = client
            .run_job()
            .wkt("POINT(-76.5 42.4)")
            .dataset(Dataset::Tmy)
            .years(vec![2023, 2023])
            .location("Ithaca")
            .call()
            .await
            .unwrap();
        assert_eq!(job.csv_files.len(), job.location_ids.len());
        assert_eq!(job.epw_files.len(), job.csv_files.len());
    }
}
