pub mod action;
pub mod command;
pub mod context;
pub mod health;
pub mod location;
pub mod module;
pub mod page;
pub mod router;

pub use action::{Action, ExportFormat, NotifyLevel, PromptKind};
pub use command::{parse_command, Command};
pub use context::{Context, Notice, Origin, Outgoing, WorkflowRun};
pub use health::{parse_readiness, HealthState};
pub use location::Location;
pub use module::{PageModule, Table};
pub use page::PageId;
pub use router::{Fault, FaultHook, Hook, LifecycleState, Router};
