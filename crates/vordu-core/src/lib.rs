//! Vörðu Core - the living roadmap aggregator
//!
//! Turns scenario-level test results into a matrix of
//! project × row × phase completion cells:
//! - Parses row/phase/wip tags off scenarios
//! - Reconciles planned (scanned) scenarios with executed (reported) ones
//! - Rolls scenarios up into rows under a granularity policy
//!
//! # Example
//!
//! ```rust
//! use vordu_core::{merge_scenarios, resolve_all, Aggregator, Component, ScenarioRecord,
//!     ScenarioStatus, SystemDescriptor};
//!
//! let system = SystemDescriptor::new("demo");
//! let components = vec![Component::new("api")];
//!
//! let mut planned = ScenarioRecord::new("Login", "valid credentials");
//! planned.tags = "@component:api @phase:1".to_string();
//!
//! let mut executed = ScenarioRecord::new("Login", "valid credentials");
//! executed.status = ScenarioStatus::Passed;
//! executed.total_steps = 3;
//! executed.passed_steps = 3;
//!
//! let scenarios = resolve_all(merge_scenarios(vec![planned], vec![executed]));
//! let cells = Aggregator::new(&system, &components).aggregate(&scenarios);
//!
//! assert_eq!(cells.len(), 1);
//! assert_eq!(cells[0].completion, 100);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod aggregate;
pub mod error;
pub mod merge;
pub mod payload;
pub mod tags;
pub mod types;

// Re-exports for convenience
pub use aggregate::{completion, derive_status, Aggregator, PhaseTally};
pub use error::{CoreError, CoreResult};
pub use merge::merge_scenarios;
pub use payload::{ComponentConfig, ConfigPayload, SystemConfig};
pub use tags::{resolve, resolve_all, ResolvedScenario, TagSet};
pub use types::{
    CellStatus, Component, Granularity, MatrixCell, ScenarioRecord, ScenarioStatus, StepDetail,
    SystemDescriptor, MAX_PHASE, PHASES,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Vörðu Core
    pub use crate::{
        Aggregator, CellStatus, Component, ConfigPayload, CoreError, Granularity, MatrixCell,
        ScenarioRecord, ScenarioStatus, SystemDescriptor,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
