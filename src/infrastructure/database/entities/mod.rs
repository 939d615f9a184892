//! Database entities module

pub mod user;
pub mod user_role;
