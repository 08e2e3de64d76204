use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub campus: CampusConfig,
    pub capture: CaptureConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            campus: CampusConfig::from_env()?,
            capture: CaptureConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Fixed institutional reference point and the radius students and teachers
/// must be inside when the portal runs in offline mode.
#[derive(Debug, Clone, Copy)]
pub struct CampusConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

impl CampusConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let latitude = parse_f64_var("CAMPUS_LATITUDE", 25.637146)?;
        let longitude = parse_f64_var("CAMPUS_LONGITUDE", 85.012951)?;
        let radius_meters = parse_f64_var("GEOFENCE_RADIUS_METERS", 500.0)?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ConfigError::CoordinateOutOfRange {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
            radius_meters,
        })
    }
}

impl Default for CampusConfig {
    fn default() -> Self {
        Self {
            latitude: 25.637146,
            longitude: 85.012951,
            radius_meters: 500.0,
        }
    }
}

/// Timing knobs for the capture pipeline.
#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    /// Hard wall-clock budget for a QR scan attempt.
    pub scan_timeout: Duration,
    /// Budget for a one-shot geolocation read.
    pub location_timeout: Duration,
    /// Staleness tolerance hint passed to the location source.
    pub location_max_age: Duration,
    /// Settle delay for the timed face capture.
    pub face_settle: Duration,
}

impl CaptureConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            scan_timeout: parse_millis_var("QR_SCAN_TIMEOUT_MS", 10_000)?,
            location_timeout: parse_millis_var("LOCATION_TIMEOUT_MS", 10_000)?,
            location_max_age: parse_millis_var("LOCATION_MAX_AGE_MS", 60_000)?,
            face_settle: parse_millis_var("FACE_SETTLE_MS", 2_000)?,
        })
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_millis(10_000),
            location_timeout: Duration::from_millis(10_000),
            location_max_age: Duration::from_millis(60_000),
            face_settle: Duration::from_millis(2_000),
        }
    }
}

fn parse_f64_var(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

fn parse_millis_var(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(Duration::from_millis(default)),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    CoordinateOutOfRange { latitude: f64, longitude: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a valid number")
            }
            ConfigError::CoordinateOutOfRange {
                latitude,
                longitude,
            } => {
                write!(
                    f,
                    "campus coordinate ({latitude}, {longitude}) is outside valid degree ranges"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
