//! Configuration: the per-vault `VaultSettings` TOML sidecar.

pub mod settings;

pub use settings::VaultSettings;
