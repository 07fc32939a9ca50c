pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod gateway;
pub mod identity;
pub mod nav;

pub use context::AppContext;
pub use error::{ClientError, ClientResult};
