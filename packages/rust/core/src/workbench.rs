//! Session-level operations shared by the CLI and the TUI.
//!
//! A [`Workbench`] owns everything that lives for the whole process (config,
//! profile, ingestor, model backend) and applies one user action at a time to
//! a [`Session`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bidflow_ingest::Ingestor;
use bidflow_llm::{ChatModel, OpenAiProvider};
use bidflow_shared::{AppConfig, BidFlowError, PipelineResult, Profile, Result, UploadedFile, resolve_api_key};
use tracing::info;

use crate::crew::ProgressReporter;
use crate::export::export_submission;
use crate::pipeline::{self, PipelineConfig};
use crate::profile::load_profile;
use crate::session::{Session, VaultChange};

pub struct Workbench {
    config: AppConfig,
    pipeline: PipelineConfig,
    profile: Profile,
    ingestor: Ingestor,
    model: Arc<dyn ChatModel>,
}

impl Workbench {
    pub fn new(config: AppConfig, profile: Profile, ingestor: Ingestor, model: Arc<dyn ChatModel>) -> Self {
        Self {
            pipeline: PipelineConfig::from(&config),
            config,
            profile,
            ingestor,
            model,
        }
    }

    /// Production wiring: PDF ingestor, profile from the configured path,
    /// OpenAI-compatible backend keyed from the environment.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let profile = load_profile(Path::new(&config.profile.path))?;
        let api_key = resolve_api_key(&config)?;
        let provider = OpenAiProvider::from_llm_config(&config.llm, api_key)?;
        info!(model = %config.llm.model, base_url = %config.llm.base_url, "model backend ready");
        Ok(Self::new(config, profile, Ingestor::pdf(), Arc::new(provider)))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Ingest an upload batch into the session's Vault.
    pub fn sync_vault(&self, session: &mut Session, files: &[UploadedFile]) -> Result<VaultChange> {
        let vault = self.ingestor.ingest(files)?;
        Ok(session.store_vault(vault))
    }

    /// Run Pipeline A and store its result.
    pub async fn run_decomposition<'s>(
        &self,
        session: &'s mut Session,
        progress: &dyn ProgressReporter,
    ) -> Result<&'s PipelineResult> {
        let vault = session.require_vault()?;
        let result = pipeline::decompose(&self.pipeline, vault, &self.profile, self.model.as_ref(), progress).await?;
        session.store_decomposition(result);
        session.require_decomposition()
    }

    /// Run Pipeline B on the stored decomposition and store its result.
    pub async fn run_responses<'s>(
        &self,
        session: &'s mut Session,
        progress: &dyn ProgressReporter,
    ) -> Result<&'s PipelineResult> {
        let decomposition = session.require_decomposition()?;
        let result = pipeline::generate_responses(
            &self.pipeline,
            decomposition,
            &self.profile,
            self.model.as_ref(),
            progress,
        )
        .await?;
        session.store_responses(result)?;
        session
            .responses()
            .ok_or_else(|| BidFlowError::precondition("responses were not stored"))
    }

    /// Export the stored responses under the configured file name.
    pub fn export(&self, session: &Session, dir: &Path) -> Result<PathBuf> {
        let responses = session
            .responses()
            .ok_or_else(|| BidFlowError::precondition("generate responses before exporting"))?;
        export_submission(dir, &self.config.export.file_name, responses)
    }
}
