pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod search;
pub mod security;
pub mod totp;
pub mod vault;
