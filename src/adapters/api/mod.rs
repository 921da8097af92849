pub mod client;
pub mod dto;
pub mod repository;

pub use client::*;
pub use dto::*;
pub use repository::*;
