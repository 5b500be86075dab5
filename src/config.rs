use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

pub const ENV_ENDPOINT: &str = "OSS_ENDPOINT";
pub const ENV_ACCESS_KEY_ID: &str = "OSS_ACCESS_KEY_ID";
pub const ENV_ACCESS_KEY_SECRET: &str = "OSS_ACCESS_KEY_SECRET";
pub const ENV_BUCKET_NAME: &str = "OSS_BUCKET_NAME";
pub const ENV_REGION: &str = "OSS_REGION";
pub const ENV_FORCE_PATH_STYLE: &str = "OSS_FORCE_PATH_STYLE";

/// Required store settings and the values written into a fresh env file.
const TEMPLATE: [(&str, &str); 4] = [
    (ENV_ENDPOINT, "oss-cn-hangzhou.aliyuncs.com"),
    (ENV_ACCESS_KEY_ID, "your-access-key-id"),
    (ENV_ACCESS_KEY_SECRET, "your-access-key-secret"),
    (ENV_BUCKET_NAME, "your-bucket-name"),
];

const DEFAULT_REGION: &str = "us-east-1";

/// Which object store the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Aliyun OSS (S3-compatible API)
    Oss,
    /// Process-local store, contents are lost on exit
    Memory,
}

/// Centralized application configuration.
/// Combines environment variables, the env file and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub max_upload_bytes: usize,
    pub env_file: PathBuf,
    /// Present for the `oss` backend only.
    pub oss: Option<OssConfig>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP gateway for an OSS bucket")]
pub struct Args {
    /// Host to bind to
    #[arg(long, env = "GATEWAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(long, env = "GATEWAY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// File holding the OSS_* settings; a template is written when absent
    #[arg(long, env = "GATEWAY_ENV_FILE", default_value = ".env")]
    pub env_file: PathBuf,

    /// Object store backend
    #[arg(long, env = "GATEWAY_BACKEND", value_enum, default_value_t = Backend::Oss)]
    pub backend: Backend,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "GATEWAY_MAX_UPLOAD_BYTES", default_value_t = 100 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Parse CLI args, load the env file and assemble the configuration.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if ensure_env_file(&args.env_file)? {
            tracing::warn!(
                "{} was missing; wrote a template with placeholder values",
                args.env_file.display()
            );
        }
        // Real process environment wins over the file.
        dotenvy::from_path(&args.env_file)
            .with_context(|| format!("loading {}", args.env_file.display()))?;

        Self::from_args(args, |name| env::var(name).ok())
    }

    /// Assemble the configuration with `lookup` resolving OSS_* variables.
    pub fn from_args<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let oss = match args.backend {
            Backend::Oss => Some(
                OssConfig::from_lookup(lookup)
                    .with_context(|| format!("edit {} and restart", args.env_file.display()))?,
            ),
            Backend::Memory => None,
        };

        Ok(Self {
            host: args.host,
            port: args.port,
            backend: args.backend,
            max_upload_bytes: args.max_upload_bytes,
            env_file: args.env_file,
            oss,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection settings for the OSS bucket.
#[derive(Clone)]
pub struct OssConfig {
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,
    pub region: Option<String>,
    pub force_path_style: bool,
}

impl OssConfig {
    /// Read the four required values plus the optional ones.
    ///
    /// Missing values and untouched template placeholders are both errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            let value = lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{} is not set", name))?;
            if name != ENV_ENDPOINT && placeholder_of(name) == Some(value.as_str()) {
                bail!("{} still has its placeholder value `{}`", name, value);
            }
            Ok(value)
        };

        let endpoint = required(ENV_ENDPOINT)?;
        let access_key_id = required(ENV_ACCESS_KEY_ID)?;
        let access_key_secret = required(ENV_ACCESS_KEY_SECRET)?;
        let bucket = required(ENV_BUCKET_NAME)?;

        let force_path_style = match lookup(ENV_FORCE_PATH_STYLE) {
            Some(value) => parse_bool(&value)
                .with_context(|| format!("parsing {} value `{}`", ENV_FORCE_PATH_STYLE, value))?,
            None => false,
        };

        Ok(Self {
            endpoint,
            access_key_id,
            access_key_secret,
            bucket,
            region: lookup(ENV_REGION).filter(|r| !r.trim().is_empty()),
            force_path_style,
        })
    }

    /// Endpoint with a scheme; bare hosts get `https://`.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("https://{}", self.endpoint)
        }
    }

    /// Signing region: explicit `OSS_REGION`, else the `oss-*` label of the endpoint host.
    pub fn region(&self) -> String {
        if let Some(region) = &self.region {
            return region.clone();
        }
        let host = self
            .endpoint
            .split("://")
            .last()
            .unwrap_or(&self.endpoint);
        host.split('.')
            .next()
            .filter(|label| label.starts_with("oss-"))
            .map(|label| label.trim_end_matches("-internal").to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }
}

impl fmt::Debug for OssConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OssConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Write the placeholder env file if `path` does not exist.
///
/// Returns `true` when the file was created.
pub fn ensure_env_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let content = TEMPLATE
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(path, content + "\n")
        .with_context(|| format!("creating {}", path.display()))?;
    Ok(true)
}

fn placeholder_of(name: &str) -> Option<&'static str> {
    TEMPLATE
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, placeholder)| *placeholder)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got `{}`", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn valid() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_ENDPOINT, "oss-cn-shanghai.aliyuncs.com"),
            (ENV_ACCESS_KEY_ID, "LTAIexample"),
            (ENV_ACCESS_KEY_SECRET, "s3cr3t"),
            (ENV_BUCKET_NAME, "media"),
        ]
    }

    #[test]
    fn reads_required_values() {
        let cfg = OssConfig::from_lookup(lookup_from(&valid())).unwrap();
        assert_eq!(cfg.bucket, "media");
        assert_eq!(cfg.endpoint_url(), "https://oss-cn-shanghai.aliyuncs.com");
        assert_eq!(cfg.region(), "oss-cn-shanghai");
        assert!(!cfg.force_path_style);
    }

    #[test]
    fn missing_value_is_an_error() {
        let mut pairs = valid();
        pairs.retain(|(k, _)| *k != ENV_BUCKET_NAME);
        let err = OssConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains(ENV_BUCKET_NAME));
    }

    #[test]
    fn placeholder_value_is_an_error() {
        let mut pairs = valid();
        pairs.retain(|(k, _)| *k != ENV_ACCESS_KEY_ID);
        pairs.push((ENV_ACCESS_KEY_ID, "your-access-key-id"));
        let err = OssConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn explicit_region_and_path_style() {
        let mut pairs = valid();
        pairs.retain(|(k, _)| *k != ENV_ENDPOINT);
        pairs.extend([
            (ENV_ENDPOINT, "http://127.0.0.1:9000"),
            (ENV_REGION, "local"),
            (ENV_FORCE_PATH_STYLE, "true"),
        ]);
        let cfg = OssConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.endpoint_url(), "http://127.0.0.1:9000");
        assert_eq!(cfg.region(), "local");
        assert!(cfg.force_path_style);
    }

    #[test]
    fn non_oss_endpoint_uses_default_region() {
        let mut pairs = valid();
        pairs.retain(|(k, _)| *k != ENV_ENDPOINT);
        pairs.push((ENV_ENDPOINT, "https://storage.example.com"));
        let cfg = OssConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.region(), DEFAULT_REGION);
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let cfg = OssConfig::from_lookup(lookup_from(&valid())).unwrap();
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn template_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        assert!(ensure_env_file(&path).unwrap());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("OSS_BUCKET_NAME=your-bucket-name"));

        fs::write(&path, "OSS_BUCKET_NAME=kept\n").unwrap();
        assert!(!ensure_env_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "OSS_BUCKET_NAME=kept\n");
    }

    #[test]
    fn template_values_are_rejected_for_oss_backend() {
        let args = Args::parse_from(["oss-gateway", "--env-file", "unused.env"]);
        let pairs: Vec<(&str, &str)> = TEMPLATE.to_vec();
        let err = AppConfig::from_args(args, lookup_from(&pairs)).unwrap_err();
        assert!(format!("{:#}", err).contains("unused.env"));
    }

    #[test]
    fn memory_backend_needs_no_credentials() {
        let args = Args::parse_from(["oss-gateway", "--backend", "memory", "--port", "9000"]);
        let cfg = AppConfig::from_args(args, |_| None).unwrap();
        assert_eq!(cfg.backend, Backend::Memory);
        assert!(cfg.oss.is_none());
        assert_eq!(cfg.addr(), "0.0.0.0:9000");
    }
}
