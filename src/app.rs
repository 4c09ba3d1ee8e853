use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::backend::HttpBackend;
use crate::config::{CliConfig, active_profile_name, resolve_api_url, resolve_token};
use crate::errors::CliError;
use crate::output::OutputMode;

#[derive(Debug, Clone)]
pub struct Runtime {
    pub output: OutputMode,
    pub config: CliConfig,
    pub config_path: PathBuf,
    pub profile_override: Option<String>,
    pub api_url_override: Option<String>,
    pub timeout_ms: u64,
}

impl Runtime {
    pub fn active_profile(&self) -> String {
        active_profile_name(&self.config, self.profile_override.as_deref())
    }

    pub fn resolved_api_url(&self) -> Result<String, CliError> {
        resolve_api_url(
            &self.config,
            &self.active_profile(),
            self.api_url_override.as_deref(),
        )
    }

    /// The bearer token of the signed-in principal, if any.
    pub fn resolved_token(&self) -> Option<String> {
        resolve_token(&self.config, &self.active_profile())
    }

    pub fn require_token(&self) -> Result<String, CliError> {
        self.resolved_token().ok_or_else(|| {
            CliError::Auth("You must be logged in. Run `auryvia auth login` first.".to_string())
        })
    }

    pub fn api_client(&self) -> Result<ApiClient, CliError> {
        ApiClient::new(self.resolved_api_url()?, self.timeout_ms, self.output.debug)
    }

    pub fn backend(&self) -> Result<Arc<HttpBackend>, CliError> {
        Ok(Arc::new(HttpBackend::new(self.api_client()?)))
    }
}
