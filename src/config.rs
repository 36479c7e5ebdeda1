use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{
    env::{self, VarError},
    str::FromStr,
    time::Duration,
};

/// Which storage implementation serves the bucket.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// AWS S3 or an S3-compatible endpoint.
    S3,
    /// Process-local map, contents lost on exit.
    Memory,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub public_domain: Option<String>,
    pub backend: BackendKind,
    pub deletion_timeout: Duration,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Single-bucket object storage gateway")]
pub struct Args {
    /// Host to bind to (overrides GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket holding all objects (overrides AWS_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint, enables path-style addressing (overrides AWS_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Domain used in hosted URLs after the bucket name (overrides GATEWAY_PUBLIC_DOMAIN)
    #[arg(long)]
    pub public_domain: Option<String>,

    /// Storage backend (overrides GATEWAY_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Seconds to wait for a delete to be confirmed (overrides GATEWAY_DELETION_TIMEOUT_SECS)
    #[arg(long)]
    pub deletion_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name))
    }

    /// Merge CLI args over values looked up through `env`, then defaults.
    pub fn resolve<F>(args: Args, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        // --- Environment fallback ---
        let env_host = lookup(&env, "GATEWAY_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = parse_env::<u16, _>(&env, "GATEWAY_PORT")?.unwrap_or(3000);
        let env_region = lookup(&env, "AWS_REGION")?.unwrap_or_else(|| "us-east-1".into());
        let env_backend = match lookup(&env, "GATEWAY_BACKEND")? {
            Some(value) => BackendKind::from_str(&value, true)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("parsing GATEWAY_BACKEND value `{}`", value))?,
            None => BackendKind::S3,
        };
        let env_timeout = parse_env::<u64, _>(&env, "GATEWAY_DELETION_TIMEOUT_SECS")?.unwrap_or(30);

        // --- Merge ---
        let backend = args.backend.unwrap_or(env_backend);
        let bucket = match args.bucket.or(lookup(&env, "AWS_BUCKET")?) {
            Some(bucket) => bucket,
            None if backend == BackendKind::Memory => "local".into(),
            None => bail!("bucket name is required for the s3 backend (--bucket or AWS_BUCKET)"),
        };

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            bucket,
            region: args.region.unwrap_or(env_region),
            endpoint_url: args.endpoint_url.or(lookup(&env, "AWS_ENDPOINT_URL")?),
            public_domain: args.public_domain.or(lookup(&env, "GATEWAY_PUBLIC_DOMAIN")?),
            backend,
            deletion_timeout: Duration::from_secs(args.deletion_timeout_secs.unwrap_or(env_timeout)),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Domain placed after the bucket name in hosted URLs.
    pub fn storage_domain(&self) -> String {
        self.public_domain
            .clone()
            .unwrap_or_else(|| format!("s3.{}.amazonaws.com", self.region))
    }
}

/// Read a variable, treating unset and empty alike.
fn lookup<F>(env: &F, name: &str) -> Result<Option<String>>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match env(name) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

fn parse_env<T, F>(env: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(env, name)? {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned().ok_or(VarError::NotPresent)
    }

    fn args(list: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("bucket-gateway").chain(list.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_with_bucket_from_env() {
        let cfg = AppConfig::resolve(Args::default(), env_from(&[("AWS_BUCKET", "acme")])).unwrap();

        assert_eq!(cfg.bucket, "acme");
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.region, "us-east-1");
        assert_eq!(cfg.backend, BackendKind::S3);
        assert_eq!(cfg.deletion_timeout, Duration::from_secs(30));
        assert_eq!(cfg.storage_domain(), "s3.us-east-1.amazonaws.com");
        assert!(cfg.endpoint_url.is_none());
    }

    #[test]
    fn cli_args_override_env() {
        let env = env_from(&[
            ("AWS_BUCKET", "from-env"),
            ("AWS_REGION", "eu-west-1"),
            ("GATEWAY_PORT", "8080"),
        ]);
        let cfg = AppConfig::resolve(
            args(&["--bucket", "from-cli", "--port", "9000", "--deletion-timeout-secs", "5"]),
            env,
        )
        .unwrap();

        assert_eq!(cfg.bucket, "from-cli");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.region, "eu-west-1");
        assert_eq!(cfg.deletion_timeout, Duration::from_secs(5));
        assert_eq!(cfg.storage_domain(), "s3.eu-west-1.amazonaws.com");
    }

    #[test]
    fn s3_backend_requires_bucket() {
        let err = AppConfig::resolve(Args::default(), env_from(&[])).unwrap_err();
        assert!(err.to_string().contains("bucket name is required"));
    }

    #[test]
    fn memory_backend_defaults_bucket() {
        let cfg = AppConfig::resolve(args(&["--backend", "memory"]), env_from(&[])).unwrap();
        assert_eq!(cfg.backend, BackendKind::Memory);
        assert_eq!(cfg.bucket, "local");
    }

    #[test]
    fn backend_from_env_is_case_insensitive() {
        let cfg = AppConfig::resolve(Args::default(), env_from(&[("GATEWAY_BACKEND", "Memory")])).unwrap();
        assert_eq!(cfg.backend, BackendKind::Memory);
    }

    #[test]
    fn invalid_port_reports_variable() {
        let env = env_from(&[("AWS_BUCKET", "acme"), ("GATEWAY_PORT", "http")]);
        let err = AppConfig::resolve(Args::default(), env).unwrap_err();
        assert!(err.to_string().contains("GATEWAY_PORT"));
    }

    #[test]
    fn empty_endpoint_is_ignored() {
        let env = env_from(&[("AWS_BUCKET", "acme"), ("AWS_ENDPOINT_URL", "")]);
        let cfg = AppConfig::resolve(Args::default(), env).unwrap();
        assert!(cfg.endpoint_url.is_none());
    }

    #[test]
    fn public_domain_overrides_region_domain() {
        let env = env_from(&[
            ("AWS_BUCKET", "acme"),
            ("AWS_ENDPOINT_URL", "http://localhost:4566"),
            ("GATEWAY_PUBLIC_DOMAIN", "storage.example.com"),
        ]);
        let cfg = AppConfig::resolve(Args::default(), env).unwrap();
        assert_eq!(cfg.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(cfg.storage_domain(), "storage.example.com");
    }
}
