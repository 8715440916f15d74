use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Weather API returned {status}: {reason}")]
    Api { status: u16, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Variable '{0}' missing from API response")]
    MissingVariable(String),
}

impl AppError {
    /// Transient failures worth another attempt: timeouts, connection errors,
    /// server errors (5xx) and rate limiting (429).
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status()
                        .map(|s| s.is_server_error() || s.as_u16() == 429)
                        .unwrap_or(false)
            }
            AppError::Api { status, .. } => *status >= 500 || *status == 429,
            AppError::Io(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_transience() {
        let server = AppError::Api {
            status: 503,
            reason: "unavailable".to_string(),
        };
        let limited = AppError::Api {
            status: 429,
            reason: "slow down".to_string(),
        };
        let bad_request = AppError::Api {
            status: 400,
            reason: "Cannot initialize WeatherVariable from invalid String value".to_string(),
        };

        assert!(server.is_transient());
        assert!(limited.is_transient());
        assert!(!bad_request.is_transient());
    }

    #[test]
    fn test_data_errors_are_not_transient() {
        assert!(!AppError::MissingVariable("rain".to_string()).is_transient());
        assert!(!AppError::Parse("bad".to_string()).is_transient());
        assert!(!AppError::Config("bad".to_string()).is_transient());
    }
}
