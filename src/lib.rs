#![doc = "The `taskkeeper` library crate."]
#![doc = ""]
#![doc = "Domain models, the bearer-token authentication core (token service, revocation"]
#![doc = "ledger and auth gate), persistence backends, routing and error handling for the"]
#![doc = "taskkeeper API. The binary (`main.rs`) wires these together and runs the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use state::{AppState, Stores};
