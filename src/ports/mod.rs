pub mod config_store;
pub mod local_store;
pub mod repository;

pub use config_store::*;
pub use local_store::*;
pub use repository::*;
