//! The two BidFlow pipelines.
//!
//! Pipeline A decomposes the Vault and audits compliance gates against the
//! profile. Pipeline B drafts weighted responses from Pipeline A's result.

use bidflow_llm::ChatModel;
use bidflow_shared::{AppConfig, PipelineResult, Profile, Result, Vault};
use tracing::{info, instrument, warn};

use crate::agent::{AgentSpec, LlmSettings, TaskSpec};
use crate::context::{ContextPolicy, ContextWindow};
use crate::crew::{Crew, ProgressReporter};
use crate::prompts::{analyst, architect, auditor};
use crate::weighting::ResponsePlan;

/// Settings shared by both pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub llm: LlmSettings,
    pub context: ContextPolicy,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            llm: LlmSettings::from(&config.llm),
            context: ContextPolicy::from(&config.context),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Pipeline A
// ---------------------------------------------------------------------------

/// Build the decomposition crew: one analyst task per context chunk, then the
/// auditor, which receives every analyst output and the profile.
pub fn build_decomposition_crew(
    config: &PipelineConfig,
    window: &ContextWindow,
    profile: &Profile,
) -> Crew {
    let parts = window.chunks.len();
    let analyst_agent = AgentSpec::new(
        analyst::ROLE,
        analyst::GOAL,
        analyst::BACKSTORY,
        config.llm.clone(),
    )
    .without_delegation();

    let mut tasks: Vec<TaskSpec> = window
        .chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let task = TaskSpec::new(analyst::DESCRIPTION, analyst::EXPECTED_OUTPUT, analyst_agent.clone());
            if parts == 1 {
                return task.with_text("Tender pack", chunk.as_str());
            }
            let part = format!("part {} of {parts}", i + 1);
            TaskSpec {
                description: format!("{}\n{}", analyst::DESCRIPTION, analyst::PART_NOTE),
                ..task
            }
            .with_title(format!("{} ({part})", analyst::ROLE))
            .with_text(format!("Tender pack ({part})"), chunk.as_str())
        })
        .collect();

    let auditor_agent = AgentSpec::new(
        auditor::ROLE,
        auditor::GOAL,
        auditor::BACKSTORY,
        config.llm.clone(),
    );
    let mut audit = TaskSpec::new(auditor::DESCRIPTION, auditor::EXPECTED_OUTPUT, auditor_agent);
    for i in 0..parts {
        audit = if parts == 1 {
            audit.with_prior_output("Tender decomposition", i)
        } else {
            audit.with_prior_output(format!("Tender decomposition (part {} of {parts})", i + 1), i)
        };
    }
    tasks.push(audit.with_text("Business profile", profile.text.as_str()));

    Crew::new("decomposition", tasks)
}

/// Run Pipeline A over the Vault.
#[instrument(skip_all, fields(documents = vault.documents().len(), vault_chars = vault.char_len()))]
pub async fn decompose(
    config: &PipelineConfig,
    vault: &Vault,
    profile: &Profile,
    model: &dyn ChatModel,
    progress: &dyn ProgressReporter,
) -> Result<PipelineResult> {
    progress.phase("Decomposing tender pack");
    let window = config.context.window(vault.text());
    info!(
        chunks = window.chunks.len(),
        omitted_chars = window.omitted_chars,
        "context window prepared"
    );

    let crew = build_decomposition_crew(config, &window, profile);
    let output = crew.kickoff(model, progress).await?;
    let result = output.into_result(Vec::new());

    info!(chars = result.raw.len(), "decomposition complete");
    Ok(result)
}

// ---------------------------------------------------------------------------
// Pipeline B
// ---------------------------------------------------------------------------

/// Build the single-task response crew.
pub fn build_response_crew(
    config: &PipelineConfig,
    decomposition: &PipelineResult,
    profile: &Profile,
    plan: &ResponsePlan,
) -> Crew {
    let agent = AgentSpec::new(
        architect::ROLE,
        architect::GOAL,
        architect::BACKSTORY,
        config.llm.clone(),
    );
    let task = TaskSpec::new(architect::DESCRIPTION, architect::EXPECTED_OUTPUT, agent)
        .with_text("Tender decomposition", decomposition.raw.as_str())
        .with_text("Business profile", profile.text.as_str())
        .with_text("Weighted response plan", plan.render());
    Crew::new("responses", vec![task])
}

/// Run Pipeline B. Identifiers the output never mentions are logged and
/// reported in [`PipelineResult::missing_ids`].
#[instrument(skip_all)]
pub async fn generate_responses(
    config: &PipelineConfig,
    decomposition: &PipelineResult,
    profile: &Profile,
    model: &dyn ChatModel,
    progress: &dyn ProgressReporter,
) -> Result<PipelineResult> {
    progress.phase("Drafting weighted responses");
    let plan = ResponsePlan::from_decomposition(&decomposition.raw);
    info!(questions = plan.entries().len(), "response plan built");

    let crew = build_response_crew(config, decomposition, profile, &plan);
    let output = crew.kickoff(model, progress).await?;

    let missing = plan.missing_in(&output.raw());
    if !missing.is_empty() {
        warn!(missing = ?missing, "responses do not cover every question identifier");
    }

    let result = output.into_result(missing);
    info!(chars = result.raw.len(), "responses complete");
    Ok(result)
}
