pub mod base;
pub mod context;
pub mod drive;

pub use base::{Base, Updater};
pub use context::ServiceContext;
pub use drive::Drive;
