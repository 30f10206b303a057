//! Command implementations

pub mod deprovision;
pub mod kubeconfig;
pub mod provision;
pub mod update;
pub mod wait;
