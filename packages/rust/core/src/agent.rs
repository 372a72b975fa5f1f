//! Declarative agent and task specifications.
//!
//! An [`AgentSpec`] renders into the system prompt, a [`TaskSpec`] into the
//! user prompt. Tasks name their inputs explicitly: literal text, or the
//! output of an earlier task in the same crew run.

use bidflow_llm::{ChatMessage, ChatRequest};
use bidflow_shared::LlmConfig;

/// Model settings an agent runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl From<&LlmConfig> for LlmSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: None,
        }
    }
}

/// A role-scoped agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub llm: LlmSettings,
    /// Whether the agent may defer parts of its task to other roles.
    pub allow_delegation: bool,
}

impl AgentSpec {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        llm: LlmSettings,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            llm,
            allow_delegation: true,
        }
    }

    pub fn without_delegation(mut self) -> Self {
        self.allow_delegation = false;
        self
    }

    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        );
        if !self.allow_delegation {
            prompt.push_str("\nComplete the task yourself; do not defer any part of it to other roles.");
        }
        prompt
    }
}

/// A named piece of context given to a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskInput {
    /// Literal text, e.g. the business profile.
    Text { label: String, body: String },
    /// The output of task `task` (0-based) of the same run.
    PriorOutput { label: String, task: usize },
}

impl TaskInput {
    pub fn label(&self) -> &str {
        match self {
            Self::Text { label, .. } | Self::PriorOutput { label, .. } => label,
        }
    }
}

/// A unit of work bound to one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    /// Section heading for this task's output.
    pub title: String,
    pub description: String,
    pub expected_output: String,
    pub agent: AgentSpec,
    pub inputs: Vec<TaskInput>,
}

impl TaskSpec {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: AgentSpec,
    ) -> Self {
        Self {
            title: agent.role.clone(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent,
            inputs: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_text(mut self, label: impl Into<String>, body: impl Into<String>) -> Self {
        self.inputs.push(TaskInput::Text {
            label: label.into(),
            body: body.into(),
        });
        self
    }

    pub fn with_prior_output(mut self, label: impl Into<String>, task: usize) -> Self {
        self.inputs.push(TaskInput::PriorOutput {
            label: label.into(),
            task,
        });
        self
    }

    /// Render the user prompt. `resolved` holds one body per input, in order.
    pub fn user_prompt(&self, resolved: &[&str]) -> String {
        let mut prompt = self.description.clone();
        for (input, body) in self.inputs.iter().zip(resolved) {
            prompt.push_str(&format!("\n\n### {}\n{}", input.label(), body));
        }
        prompt.push_str(&format!(
            "\n\nThis is the expected criteria for your final answer: {}\n\
             Return the complete content as your final answer, not a summary of it.",
            self.expected_output
        ));
        prompt
    }

    /// Build the chat request for this task.
    pub fn request(&self, resolved: &[&str]) -> ChatRequest {
        ChatRequest {
            model: self.agent.llm.model.clone(),
            messages: vec![
                ChatMessage::system(self.agent.system_prompt()),
                ChatMessage::user(self.user_prompt(resolved)),
            ],
            temperature: Some(self.agent.llm.temperature),
            max_tokens: self.agent.llm.max_tokens,
        }
    }
}
