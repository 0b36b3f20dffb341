pub use self::parser::{
    AiConfig, AuthConfig, ChainConfig, Config, DatabaseConfig, DbType, LimitsConfig, LoggingConfig,
    PublisherConfig, ServerConfig,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
