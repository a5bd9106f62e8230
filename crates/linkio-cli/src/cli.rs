use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use linkio_core::SdkConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "linkio")]
#[command(version, about = "Deep-link resolution and referral tracking")]
pub struct Cli {
    /// Path to linkio.toml. Flags below override its values.
    #[arg(long, global = true, env = "LINKIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// App domain, e.g. example.com
    #[arg(long, global = true, env = "LINKIO_DOMAIN")]
    pub domain: Option<String>,

    /// Attribution backend base URL
    #[arg(long, global = true, env = "LINKIO_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Custom app URL scheme, e.g. rokart
    #[arg(long, global = true, env = "LINKIO_APP_SCHEME")]
    pub app_scheme: Option<String>,

    /// Directory holding the persistent store
    #[arg(long, global = true, env = "LINKIO_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a navigation URI against the configured domain
    Classify(ClassifyArgs),
    /// Print this installation's device id, creating it if needed
    DeviceId,
    /// Look up the deferred deep link for this device
    CheckPending,
    /// Report a referral event
    TrackReferral(TrackReferralArgs),
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Navigation URI
    pub uri: String,
}

#[derive(Args, Debug)]
pub struct TrackReferralArgs {
    /// Referral code
    #[arg(long)]
    pub code: String,
    /// Referred user id
    #[arg(long)]
    pub user: String,
    /// Metadata as a JSON object
    #[arg(long)]
    pub metadata: Option<String>,
}

impl Cli {
    /// Build the SDK config from the optional file plus flag overrides.
    pub fn sdk_config(&self) -> Result<SdkConfig> {
        let mut config = match &self.config {
            Some(path) => SdkConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => {
                let domain = self
                    .domain
                    .clone()
                    .context("--domain is required without --config")?;
                let backend = self
                    .backend_url
                    .clone()
                    .context("--backend-url is required without --config")?;
                SdkConfig::new(domain, backend)
            }
        };

        if let Some(domain) = &self.domain {
            config.domain = domain.clone();
        }
        if let Some(backend) = &self.backend_url {
            config.backend_base_url = backend.clone();
        }
        if let Some(scheme) = &self.app_scheme {
            config = config.with_app_scheme(scheme.clone());
        }
        Ok(config.validate()?)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("linkio.redb")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("linkio").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_build_config() {
        let cli = parse(&[
            "--domain",
            "example.com",
            "--backend-url",
            "https://api.example.com/",
            "classify",
            "https://example.com/x",
        ]);
        let config = cli.sdk_config().unwrap();
        assert_eq!(config.domain, "example.com");
        assert_eq!(config.backend_base_url, "https://api.example.com");
        assert!(matches!(cli.command, Commands::Classify(_)));
    }

    #[test]
    fn test_missing_domain_is_error() {
        let cli = parse(&["--backend-url", "https://api.example.com", "device-id"]);
        assert!(cli.sdk_config().is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "domain = \"example.com\"\nbackend_base_url = \"https://api.example.com\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&["--config", &path, "--domain", "shop.example.org", "check-pending"]);
        let config = cli.sdk_config().unwrap();
        assert_eq!(config.domain, "shop.example.org");
        assert_eq!(config.backend_base_url, "https://api.example.com");
    }

    #[test]
    fn test_track_referral_args() {
        let cli = parse(&[
            "--domain",
            "example.com",
            "--backend-url",
            "https://api.example.com",
            "track-referral",
            "--code",
            "FRIEND10",
            "--user",
            "u1",
            "--metadata",
            "{\"source\":\"cli\"}",
        ]);
        match cli.command {
            Commands::TrackReferral(args) => {
                assert_eq!(args.code, "FRIEND10");
                assert_eq!(args.metadata.as_deref(), Some("{\"source\":\"cli\"}"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
