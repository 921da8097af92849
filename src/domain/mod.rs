pub mod error;
pub mod insights;
pub mod notification;
pub mod project;
pub mod snapshot;
pub mod status;
pub mod subtask;
pub mod tag;
pub mod task;

pub use error::*;
pub use notification::*;
pub use project::*;
pub use snapshot::*;
pub use status::*;
pub use subtask::*;
pub use tag::*;
pub use task::*;
