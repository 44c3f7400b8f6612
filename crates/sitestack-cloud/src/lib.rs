//! SiteStack Cloud
//!
//! Provisioning layer for SiteStack: hands the synthesized resource graph to
//! a pluggable reconciliation engine and surfaces the stack outputs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  SiteStack CLI                   │
//! │            (sitestack plan/deploy)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               sitestack-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Provisioner (zone lookup + synth)       │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait ReconciliationEngine { ... }       │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │  LocalEngine  │  .sitestack/state.json
//! └───────────────┘
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod local;
pub mod provisioner;
pub mod state;
pub mod zone;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Attributes, Plan, PlanSummary};
pub use engine::{DOMAIN_NAME_ATTRIBUTE, ReconciliationEngine, StackOutputs};
pub use error::{CloudError, Result};
pub use local::{LOCAL_ENGINE_NAME, LocalEngine};
pub use provisioner::Provisioner;
pub use state::{GlobalState, ResourceState, ResourceStatus, StateLock, StateManager, STATE_DIR};
pub use zone::{StaticZoneLookup, ZoneLookup};
