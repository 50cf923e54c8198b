//! Workflow composition: a small algebra of named, composable tasks with
//! an at-most-once resume contract against a pluggable storage.
//!
//! Tasks are constructed once with an embedded request template and stay
//! stateless across invocations; per-call mutation happens on clones.

pub mod agent_task;
pub mod chain_task;
pub mod lazy_task;
pub mod persistence;
pub mod preload_task;
pub mod structured_task;
pub mod task;
pub mod text_task;
pub mod tool_task;
pub mod typed;
pub mod work;

pub use agent_task::AgentTask;
pub use chain_task::ChainTask;
pub use lazy_task::{LazyTask, LazyTaskCallback};
pub use persistence::{
    AgentStorageHook, AgentTaskState, FileStorage, MemoryStorage, MemoryStorageProvider, Storage,
    StorageProvider,
};
pub use preload_task::preload;
pub use structured_task::StructuredTask;
pub use task::{Task, TaskExt};
pub use text_task::TextTask;
pub use tool_task::{ToolResultFormat, ToolTask};
pub use typed::Typed;
pub use work::FunctionWork;
