//! Action types for converging the resource graph

use serde::{Deserialize, Serialize};
use sitestack_core::{ResourceId, ResourceKind};
use std::collections::{BTreeMap, HashMap};

/// Attributes reported by the engine for a converged resource
/// (generated hostnames, physical IDs, ...)
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Represents a planned action for a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Kind of the resource description
    pub resource_kind: ResourceKind,

    /// Logical resource identifier in the graph
    pub resource_id: ResourceId,

    /// Description of the action
    pub description: String,

    /// Additional details about the action
    pub details: HashMap<String, serde_json::Value>,
}

impl Action {
    pub fn new(
        action_type: ActionType,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("{}-{}", action_type, resource_id),
            action_type,
            resource_kind,
            resource_id,
            description: description.into(),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Attributes of every resource known after the apply, by logical ID
    pub attributes: BTreeMap<String, Attributes>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: String, message: String) {
        self.succeeded.push(ActionResult {
            action_id,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: String, error: String) {
        self.failed.push(ActionResult {
            action_id,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }

    /// Error messages of the failed actions, as reported by the engine
    pub fn failure_messages(&self) -> Vec<String> {
        self.failed
            .iter()
            .map(|r| {
                format!(
                    "{}: {}",
                    r.action_id,
                    r.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect()
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// ID of the action
    pub action_id: String,

    /// Whether the action succeeded
    pub success: bool,

    /// Success message
    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// List of actions to perform, in execution order
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Find the action planned for a resource
    pub fn action_for(&self, resource_id: &ResourceId) -> Option<&Action> {
        self.actions.iter().find(|a| &a.resource_id == resource_id)
    }

    /// Whether both plans take the same actions on the same resources, in order
    pub fn same_actions(&self, other: &Plan) -> bool {
        self.actions.len() == other.actions.len()
            && self
                .actions
                .iter()
                .zip(&other.actions)
                .all(|(a, b)| a.action_type == b.action_type && a.resource_id == b.resource_id)
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(action_type: ActionType, id: &str) -> Action {
        Action::new(
            action_type,
            ResourceKind::Storage,
            ResourceId::new(id),
            "test",
        )
    }

    #[test]
    fn test_plan_summary() {
        let plan = Plan::new(vec![
            action(ActionType::Create, "a"),
            action(ActionType::Create, "b"),
            action(ActionType::Update, "c"),
            action(ActionType::NoOp, "d"),
        ]);

        assert!(plan.has_changes);
        assert_eq!(
            plan.summary(),
            PlanSummary {
                create: 2,
                update: 1,
                delete: 0,
                no_change: 1,
            }
        );
        assert_eq!(
            plan.summary().to_string(),
            "2 to create, 1 to update, 0 to delete, 1 unchanged"
        );
        assert_eq!(plan.action_for(&ResourceId::new("c")).unwrap().id, "update-c");
    }

    #[test]
    fn test_same_actions_ignores_descriptions() {
        let reviewed = Plan::new(vec![
            action(ActionType::Create, "a"),
            action(ActionType::Update, "b"),
        ]);
        let mut described = reviewed.clone();
        described.actions[1].description = "Retry failed storage b".into();
        assert!(reviewed.same_actions(&described));

        let converged = Plan::new(vec![
            action(ActionType::NoOp, "a"),
            action(ActionType::Update, "b"),
        ]);
        assert!(!reviewed.same_actions(&converged));
        assert!(!reviewed.same_actions(&Plan::new(vec![action(ActionType::Create, "a")])));
    }

    #[test]
    fn test_plan_without_changes() {
        let plan = Plan::new(vec![action(ActionType::NoOp, "a")]);
        assert!(!plan.has_changes);
        assert!(!Plan::empty().has_changes);
    }

    #[test]
    fn test_apply_result_failures() {
        let mut result = ApplyResult::new();
        result.add_success("create-a".to_string(), "ok".to_string());
        assert!(result.is_success());

        result.add_failure("create-b".to_string(), "quota exceeded".to_string());
        assert!(!result.is_success());
        assert_eq!(result.failure_messages(), vec!["create-b: quota exceeded"]);
    }
}
