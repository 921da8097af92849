pub mod error;
pub mod notification_center;
pub mod preferences;
pub mod project_store;
pub mod sync;

pub use error::*;
pub use notification_center::*;
pub use preferences::*;
pub use project_store::*;
pub use sync::*;
