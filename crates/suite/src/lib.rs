//! ParaBank suite: page objects, API helper, test data, and the registered
//! scenarios the `pb-test` runner executes.

pub mod api;
pub mod data;
pub mod pages;
pub mod scenarios;

pub use api::{ApiClient, ApiResponse};
pub use data::NewUser;
pub use pages::{LoginPage, RegisterPage};
