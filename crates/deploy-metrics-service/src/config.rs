//! Service configuration.
//!
//! Configuration is assembled from layered sources — later sources override
//! earlier ones:
//!
//!  1. `config/service.toml`            — deployment-local file
//!  2. Path given by `DM_CONFIG_FILE`   — operator-specified file
//!  3. Environment variables prefixed `DM__` (double-underscore separator),
//!     e.g. `DM__SERVER__PORT=9090` sets `server.port = 9090`
//!
//! All fields carry serde defaults, so an entirely unconfigured environment
//! yields a valid structure; [`ServiceConfig::validate`] then decides
//! whether it is complete enough to start (both secrets must be
//! resolvable). A malformed file or an environment variable that cannot be
//! coerced to the right type is a hard error: it indicates
//! deliberate-but-broken operator configuration.

use deploy_metrics_core::SecretValue;
use serde::Deserialize;
use tracing::warn;

// ============================================================================
// Errors
// ============================================================================

/// Errors while loading or validating service configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not load configuration: {message}")]
    Load { message: String },

    #[error("no secret source configured for '{field}'")]
    MissingSecret { field: String },

    #[error("secret for '{field}' resolved to an empty value")]
    EmptySecret { field: String },

    #[error("environment variable '{var}' is not set")]
    MissingEnvVar { var: String },
}

// ============================================================================
// Secret Sources
// ============================================================================

/// Where a secret comes from.
///
/// The vault holding production secrets is an external collaborator; this
/// service only ever sees the resolved value. `Env` names a variable the
/// deployment platform injects at startup. `Literal` embeds the value in the
/// configuration file and exists for development and testing only — a `WARN`
/// is emitted whenever one is resolved.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SecretSource {
    /// Resolve from an environment variable at startup.
    Env {
        /// Name of the environment variable.
        var: String,
    },

    /// Literal secret embedded in the configuration.
    ///
    /// **Development / testing only.** Never commit to source control.
    Literal {
        /// Raw secret value. Excluded from `Debug` output.
        value: String,
    },
}

impl SecretSource {
    /// Resolve this source into a [`SecretValue`].
    ///
    /// Resolution happens exactly once, at startup; the resolved value is
    /// held in memory for the process lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when the named variable is not
    /// set and [`ConfigError::EmptySecret`] when the resolved value is empty.
    pub fn resolve(&self, field: &str) -> Result<SecretValue, ConfigError> {
        let value = match self {
            Self::Env { var } => {
                std::env::var(var).map_err(|_| ConfigError::MissingEnvVar { var: var.clone() })?
            }
            Self::Literal { value } => {
                warn!(
                    field = %field,
                    "Literal secret in configuration — not safe for production. \
                     Switch to an env-sourced secret before deploying."
                );
                value.clone()
            }
        };

        if value.is_empty() {
            return Err(ConfigError::EmptySecret {
                field: field.to_string(),
            });
        }

        Ok(SecretValue::new(value))
    }
}

impl std::fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env { var } => f.debug_struct("SecretSource::Env").field("var", var).finish(),
            Self::Literal { .. } => f
                .debug_struct("SecretSource::Literal")
                .field("value", &"<REDACTED>")
                .finish(),
        }
    }
}

// ============================================================================
// Configuration Sections
// ============================================================================

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` form for the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Webhook intake settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Source for the shared signing secret. Required to start.
    pub secret: Option<SecretSource>,
}

/// Datadog submission settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatadogConfig {
    /// Datadog site, e.g. `datadoghq.com` or `datadoghq.eu`.
    pub site: String,
    /// Source for the API key. Required to start.
    pub api_key: Option<SecretSource>,
    /// Full intake base URL override. Intended for tests; when set, `site`
    /// is ignored.
    pub endpoint: Option<String>,
}

impl DatadogConfig {
    /// The metric-series intake URL.
    pub fn series_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/api/v2/series", endpoint.trim_end_matches('/')),
            None => format!("https://api.{}/api/v2/series", self.site),
        }
    }
}

impl Default for DatadogConfig {
    fn default() -> Self {
        Self {
            site: "datadoghq.com".to_string(),
            api_key: None,
            endpoint: None,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub datadog: DatadogConfig,
}

impl ServiceConfig {
    /// Assemble configuration from the layered sources described in the
    /// module documentation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] for unreadable or malformed sources.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder().add_source(
            ::config::File::with_name("config/service")
                .required(false)
                .format(::config::FileFormat::Toml),
        );

        // Optional explicit path supplied by the operator.
        if let Ok(explicit_path) = std::env::var("DM_CONFIG_FILE") {
            if !explicit_path.is_empty() {
                builder = builder.add_source(
                    ::config::File::with_name(&explicit_path)
                        .required(true)
                        .format(::config::FileFormat::Toml),
                );
            }
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix("DM").separator("__"))
            .build()
            .map_err(|e| ConfigError::Load {
                message: e.to_string(),
            })?;

        settings.try_deserialize().map_err(|e| ConfigError::Load {
            message: e.to_string(),
        })
    }

    /// Resolve the webhook signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when no source is configured,
    /// plus any resolution error from [`SecretSource::resolve`].
    pub fn resolve_webhook_secret(&self) -> Result<SecretValue, ConfigError> {
        self.webhook
            .secret
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSecret {
                field: "webhook.secret".to_string(),
            })?
            .resolve("webhook.secret")
    }

    /// Resolve the Datadog API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when no source is configured,
    /// plus any resolution error from [`SecretSource::resolve`].
    pub fn resolve_datadog_api_key(&self) -> Result<SecretValue, ConfigError> {
        self.datadog
            .api_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSecret {
                field: "datadog.api_key".to_string(),
            })?
            .resolve("datadog.api_key")
    }

    /// Check that the configuration is complete enough to start.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when either the webhook secret
    /// or the Datadog API key has no configured source, and
    /// [`ConfigError::Load`] when the Datadog site is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook.secret.is_none() {
            return Err(ConfigError::MissingSecret {
                field: "webhook.secret".to_string(),
            });
        }
        if self.datadog.api_key.is_none() {
            return Err(ConfigError::MissingSecret {
                field: "datadog.api_key".to_string(),
            });
        }
        if self.datadog.site.is_empty() && self.datadog.endpoint.is_none() {
            return Err(ConfigError::Load {
                message: "datadog.site must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
