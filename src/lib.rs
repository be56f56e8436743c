pub mod config;
pub mod crypto;
pub mod errors;
pub mod generator;
pub mod mem;
pub mod totp;
pub mod vault;
