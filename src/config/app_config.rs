use crate::error::{AppError, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub jwt: JwtConfig,
    pub upload: UploadConfig,
    pub aws: AwsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadProviderKind {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub provider: UploadProviderKind,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub s3_bucket: String,
    pub event_queue_name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid PORT value".to_string()))?,
                max_body_size: env::var("MAX_BODY_SIZE")
                    .unwrap_or_else(|_| "10485760".to_string())
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid MAX_BODY_SIZE value".to_string()))?,
            },
            database: DatabaseConfig {
                url: env::var("DB_URL")?,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::ConfigError("Invalid DB_MAX_CONNECTIONS value".to_string())
                    })?,
            },
            cors: CorsConfig {
                allowed_origins: env::var("FRONTEND_URL")?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            jwt: JwtConfig::from_env()?,
            upload: UploadConfig {
                provider: match env::var("UPLOAD_PROVIDER")
                    .unwrap_or_else(|_| "local".to_string())
                    .as_str()
                {
                    "local" => UploadProviderKind::Local,
                    "s3" => UploadProviderKind::S3,
                    other => {
                        return Err(AppError::ConfigError(format!(
                            "Invalid UPLOAD_PROVIDER value: {}",
                            other
                        )))
                    }
                },
                path: env::var("UPLOAD_PATH").unwrap_or_else(|_| "./uploads".to_string()),
            },
            aws: AwsConfig {
                region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                s3_bucket: env::var("AWS_S3_BUCKET")
                    .unwrap_or_else(|_| "vela-uploads".to_string()),
                event_queue_name: env::var("AWS_EVENT_QUEUE_NAME")
                    .unwrap_or_else(|_| "vela-events".to_string()),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            secret: env::var("JWT_SECRET")
                .map_err(|_| AppError::ConfigError("JWT_SECRET not set".to_string()))?,
            access_ttl_secs: env::var("ACCESS_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .map_err(|_| {
                    AppError::ConfigError("Invalid ACCESS_TOKEN_TTL_SECS value".to_string())
                })?,
            refresh_ttl_secs: env::var("REFRESH_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "2592000".to_string())
                .parse()
                .map_err(|_| {
                    AppError::ConfigError("Invalid REFRESH_TOKEN_TTL_SECS value".to_string())
                })?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_provider_parses_known_kinds() {
        // from_env reads process env, so exercise the match arms directly
        let parse = |s: &str| match s {
            "local" => Some(UploadProviderKind::Local),
            "s3" => Some(UploadProviderKind::S3),
            _ => None,
        };

        assert_eq!(parse("local"), Some(UploadProviderKind::Local));
        assert_eq!(parse("s3"), Some(UploadProviderKind::S3));
        assert_eq!(parse("ftp"), None);
    }
}
