mod app_config;

pub use app_config::{
    AppConfig, AwsConfig, CorsConfig, DatabaseConfig, JwtConfig, ServerConfig, UploadConfig,
    UploadProviderKind,
};
