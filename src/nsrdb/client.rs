use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_MAPS_API_URL};
use crate::nsrdb::error::NsrdbError;
use crate::types::dataset::Dataset;
use bon::{bon, Builder};
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::{Client, Request, Response, Url};
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Attributes requested from NSRDB unless a request says otherwise.
pub const DEFAULT_ATTRIBUTES: [&str; 11] = [
    "dew_point",
    "ghi",
    "air_temperature",
    "wind_direction",
    "surface_albedo",
    "dhi",
    "dni",
    "surface_pressure",
    "wind_speed",
    "relative_humidity",
    "total_precipitable_water",
];

fn default_attributes() -> Vec<String> {
    DEFAULT_ATTRIBUTES.iter().map(|a| a.to_string()).collect()
}

/// One CSV download: a single location id for a single year.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct DownloadRequest {
    pub dataset: Dataset,
    pub location_id: u64,
    pub year: i32,
    /// Minutes between records.
    #[builder(default = 60)]
    pub interval: u32,
    #[builder(default = default_attributes())]
    pub attributes: Vec<String>,
    /// NSRDB reports local standard time unless this is set.
    #[builder(default)]
    pub to_utc: bool,
}

#[derive(Debug, Deserialize)]
struct SampleCodeResponse {
    outputs: Option<SampleCodeOutputs>,
}

#[derive(Debug, Deserialize)]
struct SampleCodeOutputs {
    script: Option<String>,
}

/// Pulls the location ids out of the `POINTS = [...]` list in a generated download script.
pub fn extract_points(script: &str) -> Option<Vec<u64>> {
    const MARKER: &str = "POINTS = [";
    let start = script.find(MARKER)? + MARKER.len();
    let len = script[start..].find(']')?;
    Some(
        script[start..start + len]
            .split(|c: char| !c.is_ascii_digit())
            .filter_map(|digits| digits.parse().ok())
            .collect(),
    )
}

/// The URL with its `api_key` value hidden, for logs and error messages.
pub fn redacted(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "api_key" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut hidden = url.clone();
    if !pairs.is_empty() {
        hidden.query_pairs_mut().clear().extend_pairs(pairs);
    }
    hidden.to_string()
}

/// Client for the NSRDB download API and the maps API that resolves geometries to
/// location ids.
pub struct NsrdbClient {
    http: Client,
    api_key: String,
    email: String,
    api_base_url: String,
    maps_api_url: String,
}

#[bon]
impl NsrdbClient {
    #[builder]
    pub fn new(
        #[builder(into)] api_key: String,
        #[builder(into)] email: String,
        #[builder(into, default = DEFAULT_API_BASE_URL.to_string())] api_base_url: String,
        #[builder(into, default = DEFAULT_MAPS_API_URL.to_string())] maps_api_url: String,
    ) -> Self {
        Self {
            http: Client::new(),
            api_key,
            email,
            api_base_url,
            maps_api_url,
        }
    }
}

impl NsrdbClient {
    fn endpoint(&self, path: &str) -> String {
        if self.api_base_url.ends_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }

    /// The maps API request that generates a download script for `wkt`.
    pub fn sample_code_request(
        &self,
        wkt: &str,
        dataset: Dataset,
        year: i32,
    ) -> Result<Request, NsrdbError> {
        self.http
            .get(&self.maps_api_url)
            .query(&[
                ("email", self.email.as_str()),
                ("wkt", wkt),
                ("attributes", DEFAULT_ATTRIBUTES[..9].join(",").as_str()),
                ("names", dataset.year_name(year).as_str()),
                ("interval", "60"),
                ("to_utc", "false"),
                ("api_key", self.api_key.as_str()),
                ("dataset", dataset.api_name()),
            ])
            .build()
            .map_err(|e| NsrdbError::NetworkRequest(self.maps_api_url.clone(), e))
    }

    /// The CSV download request for one location id and year.
    pub fn download_request(&self, request: &DownloadRequest) -> Result<Request, NsrdbError> {
        let endpoint = self.endpoint(&request.dataset.download_path());
        self.http
            .get(&endpoint)
            .query(&[
                ("attributes", request.attributes.join(",")),
                ("interval", request.interval.to_string()),
                ("to_utc", request.to_utc.to_string()),
                ("api_key", self.api_key.clone()),
                ("email", self.email.clone()),
                ("names", request.dataset.year_name(request.year)),
                ("location_ids", request.location_id.to_string()),
            ])
            .build()
            .map_err(|e| NsrdbError::NetworkRequest(endpoint, e))
    }

    async fn send(&self, request: Request) -> Result<Response, NsrdbError> {
        let url = redacted(request.url());
        info!("Requesting {}", url);

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| NsrdbError::NetworkRequest(url.clone(), e.without_url()))?;

        match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e.status());
                Err(if let Some(status) = e.status() {
                    NsrdbError::HttpStatus {
                        url,
                        status,
                        source: e.without_url(),
                    }
                } else {
                    NsrdbError::NetworkRequest(url, e.without_url())
                })
            }
        }
    }

    /// Resolves a WKT geometry to the NSRDB location ids it covers.
    pub async fn resolve_location_ids(
        &self,
        wkt: &str,
        dataset: Dataset,
        year: i32,
    ) -> Result<Vec<u64>, NsrdbError> {
        let request = self.sample_code_request(wkt, dataset, year)?;
        let url = redacted(request.url());
        let body = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(|e| NsrdbError::NetworkRequest(url.clone(), e.without_url()))?;

        let parsed: SampleCodeResponse =
            serde_json::from_slice(&body).map_err(|e| NsrdbError::JsonParse(url.clone(), e))?;
        let script = parsed
            .outputs
            .and_then(|outputs| outputs.script)
            .ok_or(NsrdbError::MissingScript(url))?;

        let points = extract_points(&script).unwrap_or_default();
        if points.is_empty() {
            return Err(NsrdbError::PointsNotFound);
        }
        info!("Geometry resolved to {} location id(s)", points.len());
        debug!("Location ids: {:?}", points);
        Ok(points)
    }

    /// Downloads one CSV into memory.
    pub async fn download_csv(&self, request: &DownloadRequest) -> Result<Vec<u8>, NsrdbError> {
        let http_request = self.download_request(request)?;
        let url = redacted(http_request.url());
        let bytes = self
            .send(http_request)
            .await?
            .bytes()
            .await
            .map_err(|e| NsrdbError::NetworkRequest(url, e.without_url()))?;
        info!(
            "Downloaded {} bytes for location {} ({})",
            bytes.len(),
            request.location_id,
            request.year
        );
        Ok(bytes.to_vec())
    }

    /// Streams one CSV to `path`. A partially written file is removed if the transfer fails.
    pub async fn download_csv_to(
        &self,
        request: &DownloadRequest,
        path: &Path,
    ) -> Result<u64, NsrdbError> {
        let response = self.send(self.download_request(request)?).await?;

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| NsrdbError::FileWrite(path.to_path_buf(), e))?;

        let copied = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(copied) => file.flush().await.map(|_| copied),
            Err(e) => Err(e),
        };
        match copied {
            Ok(bytes) => {
                info!("Saved {} bytes to {}", bytes, path.display());
                Ok(bytes)
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(path).await {
                    warn!(
                        "Failed to remove partial download {}: {}",
                        path.display(),
                        remove_err
                    );
                } else {
                    warn!("Removed partial download {}", path.display());
                }
                Err(NsrdbError::DownloadIo(e))
            }
        }
    }
}
