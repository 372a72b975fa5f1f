//! Sequential task runner.
//!
//! A [`Crew`] executes its tasks strictly in order against one [`ChatModel`].
//! Data flows between tasks only through declared [`TaskInput::PriorOutput`]
//! references; there is no implicit conversational memory.

use std::time::Instant;

use bidflow_llm::ChatModel;
use bidflow_shared::{BidFlowError, PipelineResult, Result, TaskOutput};
use chrono::Utc;
use tracing::{info, instrument};

use crate::agent::{TaskInput, TaskSpec};

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for pipeline stages.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each task is sent to the model.
    fn task_started(&self, title: &str, current: usize, total: usize);
    /// Called when a task's output arrives.
    fn task_finished(&self, title: &str, chars: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn task_started(&self, _title: &str, _current: usize, _total: usize) {}
    fn task_finished(&self, _title: &str, _chars: usize) {}
}

// ---------------------------------------------------------------------------
// Crew
// ---------------------------------------------------------------------------

/// An ordered set of tasks run one after another.
#[derive(Debug, Clone)]
pub struct Crew {
    name: String,
    tasks: Vec<TaskSpec>,
}

/// Outputs of a completed crew run.
#[derive(Debug, Clone)]
pub struct CrewOutput {
    pub tasks: Vec<TaskOutput>,
    pub model: String,
}

impl Crew {
    pub fn new(name: impl Into<String>, tasks: Vec<TaskSpec>) -> Self {
        Self {
            name: name.into(),
            tasks,
        }
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    /// Check that the crew can run: at least one task, and every prior-output
    /// reference points at a task that runs earlier.
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(BidFlowError::validation(format!("crew '{}' has no tasks", self.name)));
        }
        for (idx, task) in self.tasks.iter().enumerate() {
            for input in &task.inputs {
                if let TaskInput::PriorOutput { label, task: source } = input {
                    if *source >= idx {
                        return Err(BidFlowError::validation(format!(
                            "task {idx} ('{}') input '{label}' refers to task {source}, \
                             which has not run yet",
                            task.title
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Run every task in order. The first failing task fails the run.
    #[instrument(skip_all, fields(crew = %self.name, tasks = self.tasks.len()))]
    pub async fn kickoff(
        &self,
        model: &dyn ChatModel,
        progress: &dyn ProgressReporter,
    ) -> Result<CrewOutput> {
        self.validate()?;
        let start = Instant::now();
        let total = self.tasks.len();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(total);
        let mut served_by = String::new();

        for (idx, task) in self.tasks.iter().enumerate() {
            progress.task_started(&task.title, idx + 1, total);

            let resolved: Vec<&str> = task
                .inputs
                .iter()
                .map(|input| match input {
                    TaskInput::Text { body, .. } => body.as_str(),
                    TaskInput::PriorOutput { task, .. } => outputs[*task].raw.as_str(),
                })
                .collect();

            let response = model.complete(task.request(&resolved)).await?;
            progress.task_finished(&task.title, response.content.chars().count());

            if served_by.is_empty() {
                served_by = response.model;
            }
            outputs.push(TaskOutput {
                role: task.agent.role.clone(),
                title: task.title.clone(),
                raw: response.content,
            });
        }

        info!(
            crew = %self.name,
            tasks = outputs.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "crew run complete"
        );

        Ok(CrewOutput {
            tasks: outputs,
            model: served_by,
        })
    }
}

impl CrewOutput {
    /// Accumulated text of all tasks. Multi-task runs get a heading per task.
    pub fn raw(&self) -> String {
        match self.tasks.as_slice() {
            [single] => single.raw.clone(),
            tasks => tasks
                .iter()
                .map(|t| format!("## {}\n\n{}", t.title, t.raw.trim_end()))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    pub fn into_result(self, missing_ids: Vec<String>) -> PipelineResult {
        PipelineResult {
            raw: self.raw(),
            tasks: self.tasks,
            model: self.model,
            completed_at: Utc::now(),
            missing_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentSpec, LlmSettings};
    use crate::testing::ScriptedModel;
    use bidflow_shared::LlmConfig;

    fn agent(role: &str) -> AgentSpec {
        AgentSpec::new(role, "goal", "backstory", LlmSettings::from(&LlmConfig::default()))
    }

    #[tokio::test]
    async fn runs_tasks_in_order_and_passes_outputs_explicitly() {
        let model = ScriptedModel::new(["QUESTIONS: Q1 20%", "RISK: none"]);
        let crew = Crew::new(
            "test",
            vec![
                TaskSpec::new("Decompose.", "list", agent("Analyst")).with_text("Tender", "vault text"),
                TaskSpec::new("Audit.", "report", agent("Auditor"))
                    .with_prior_output("Decomposition", 0)
                    .with_text("Profile", "ISO 27001"),
            ],
        );

        let output = crew.kickoff(&model, &SilentProgress).await.expect("kickoff");
        assert_eq!(output.tasks.len(), 2);
        assert_eq!(output.tasks[1].raw, "RISK: none");

        let prompts = model.user_prompts();
        assert!(prompts[0].contains("### Tender\nvault text"));
        assert!(prompts[1].contains("### Decomposition\nQUESTIONS: Q1 20%"));
        assert!(prompts[1].contains("### Profile\nISO 27001"));
    }

    #[tokio::test]
    async fn accumulated_raw_has_one_heading_per_task() {
        let model = ScriptedModel::new(["first\n", "second"]);
        let crew = Crew::new(
            "test",
            vec![
                TaskSpec::new("a", "a", agent("Analyst")),
                TaskSpec::new("b", "b", agent("Auditor")),
            ],
        );
        let result = crew.kickoff(&model, &SilentProgress).await.expect("kickoff").into_result(vec![]);
        assert_eq!(result.raw, "## Analyst\n\nfirst\n\n## Auditor\n\nsecond");
        assert_eq!(result.model, "scripted");
    }

    #[tokio::test]
    async fn single_task_raw_is_verbatim() {
        let model = ScriptedModel::new(["## Q1\nAnswer"]);
        let crew = Crew::new("test", vec![TaskSpec::new("a", "a", agent("Architect"))]);
        let output = crew.kickoff(&model, &SilentProgress).await.expect("kickoff");
        assert_eq!(output.raw(), "## Q1\nAnswer");
    }

    #[tokio::test]
    async fn forward_reference_fails_before_any_call() {
        let model = ScriptedModel::new(["unused"]);
        let crew = Crew::new(
            "test",
            vec![TaskSpec::new("a", "a", agent("Analyst")).with_prior_output("Later", 0)],
        );
        let err = crew.kickoff(&model, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, BidFlowError::Validation { .. }));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn empty_crew_is_rejected() {
        let crew = Crew::new("empty", vec![]);
        assert!(crew.validate().is_err());
    }

    #[tokio::test]
    async fn backend_failure_stops_the_run() {
        let model = ScriptedModel::failing_after(1, "first");
        let crew = Crew::new(
            "test",
            vec![
                TaskSpec::new("a", "a", agent("Analyst")),
                TaskSpec::new("b", "b", agent("Auditor")),
                TaskSpec::new("c", "c", agent("Architect")),
            ],
        );
        let err = crew.kickoff(&model, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, BidFlowError::ModelBackend(_)));
        assert_eq!(model.calls(), 2);
    }
}
