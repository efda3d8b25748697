//! # Step Context
//!
//! Identity of the Promotion being executed.

/// Context of the Promotion on whose behalf a step runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepContext {
    /// Promotion name, recorded on operations for ownership correlation
    pub promotion: String,
    /// Project (namespace) of the requesting Stage
    pub project: String,
    /// Name of the requesting Stage
    pub stage: String,
    /// Human actor who created the Promotion, if any
    pub actor: Option<String>,
}

impl StepContext {
    #[must_use]
    pub fn new(
        promotion: impl Into<String>,
        project: impl Into<String>,
        stage: impl Into<String>,
    ) -> Self {
        Self {
            promotion: promotion.into(),
            project: project.into(),
            stage: stage.into(),
            actor: None,
        }
    }

    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}
