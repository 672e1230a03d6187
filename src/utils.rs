use chrono::NaiveDateTime;
use log::info;
use std::io;
use std::path::Path;

pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Keeps place names usable as file names: ASCII only, single spaces, no path separators.
pub fn sanitize_location_name(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    let sanitized = ascii.split_whitespace().collect::<Vec<_>>().join(" ");
    if sanitized.is_empty() {
        "Unknown".to_string()
    } else {
        sanitized
    }
}

/// `<Location>_<lat>_<lon>_<year>.epw`
pub fn epw_file_name(location: &str, latitude: f64, longitude: f64, year: i32) -> String {
    format!(
        "{}_{}_{}_{}.epw",
        sanitize_location_name(location),
        latitude,
        longitude,
        year
    )
}

/// `<Location>_<State>_<Country>_<YYYYMMDD_HHMMSS>`
pub fn job_directory_name(
    location: &str,
    state: &str,
    country: &str,
    started: NaiveDateTime,
) -> String {
    format!(
        "{}_{}_{}_{}",
        sanitize_location_name(location),
        sanitize_location_name(state),
        sanitize_location_name(country),
        started.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_sanitize_location_name() {
        assert_eq!(sanitize_location_name("  New   York "), "New York");
        assert_eq!(sanitize_location_name("São Paulo"), "So Paulo");
        assert_eq!(sanitize_location_name("a/b\\c"), "a-b-c");
        assert_eq!(sanitize_location_name("東京"), "Unknown");
        assert_eq!(sanitize_location_name(""), "Unknown");
    }

    #[test]
    fn test_file_and_directory_names() {
        assert_eq!(
            epw_file_name("Ithaca", 42.45, -76.48, 2021),
            "Ithaca_42.45_-76.48_2021.epw"
        );
        let started = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(
            job_directory_name("Ithaca", "NY", "United States", started),
            "Ithaca_NY_United States_20240309_140507"
        );
    }

    #[tokio::test]
    async fn test_ensure_dir_exists() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir_exists(&nested).await.unwrap();
        assert!(nested.is_dir());
        ensure_dir_exists(&nested).await.unwrap();

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(ensure_dir_exists(&file).await.is_err());
    }
}
