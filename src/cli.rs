use clap::Parser;

/// Command-line overrides applied on top of the YAML configuration.
#[derive(Debug, Parser)]
#[command(name = "cryptorafts-server", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: String,

    /// Override the configured bind address.
    #[arg(long)]
    pub bind_address: Option<String>,

    /// Override the configured port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Run the database migrations and exit.
    #[arg(long)]
    pub migrate_only: bool,
}

impl Cli {
    pub fn apply_to(&self, config: &mut crate::config::Config) {
        if let Some(ref bind_address) = self.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn overrides_are_optional() {
        let cli = Cli::parse_from(["cryptorafts-server"]);
        assert_eq!(cli.config, "config.yaml");
        assert!(cli.bind_address.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.migrate_only);
    }

    #[test]
    fn port_override_applies() {
        let cli = Cli::parse_from(["cryptorafts-server", "--port", "9999"]);
        assert_eq!(cli.port, Some(9999));
    }
}
