pub mod atomic;
pub mod config;
pub mod lock;
pub mod objects;
pub mod paths;
pub mod stack_log;
pub mod stack_store;
pub mod workspace;

pub use atomic::write_atomic;
pub use config::Config;
pub use lock::WorkspaceLock;
pub use objects::ObjectStore;
pub use paths::SheafPaths;
pub use stack_log::StateLogEntry;
pub use stack_store::StackStore;
pub use workspace::Workspace;
