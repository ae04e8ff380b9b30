//! Typed page objects over [`harness::PageHandle`].

pub mod login;
pub mod register;

pub use login::LoginPage;
pub use register::RegisterPage;
