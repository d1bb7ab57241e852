use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub model_dir: PathBuf,
    pub cors_origins: Option<String>,
    pub inference_timeout: Duration,
    pub max_batch_size: usize,
    pub rate_limit_per_minute: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            model_dir: PathBuf::from("./models/spam_dense"),
            cors_origins: None,
            inference_timeout: Duration::from_millis(5000),
            max_batch_size: 5,
            rate_limit_per_minute: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port: u16 = parse_var("PORT", defaults.port);

        let model_dir = std::env::var("MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_dir);

        let cors_origins = std::env::var("CORS_ORIGINS").ok();

        let inference_timeout = Duration::from_millis(parse_var(
            "INFERENCE_TIMEOUT_MS",
            defaults.inference_timeout.as_millis() as u64,
        ));

        let max_batch_size = match parse_var("MAX_BATCH_SIZE", defaults.max_batch_size) {
            0 => {
                warn!("[spamcheck] MAX_BATCH_SIZE must be positive, defaulting to {}", defaults.max_batch_size);
                defaults.max_batch_size
            }
            n => n,
        };

        let rate_limit_per_minute =
            match parse_var("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute) {
                0 => {
                    warn!(
                        "[spamcheck] RATE_LIMIT_PER_MINUTE must be positive, defaulting to {}",
                        defaults.rate_limit_per_minute
                    );
                    defaults.rate_limit_per_minute
                }
                n => n,
            };

        Self {
            port,
            model_dir,
            cors_origins,
            inference_timeout,
            max_batch_size,
            rate_limit_per_minute,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("[spamcheck] Invalid {} value {:?}, defaulting to {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
