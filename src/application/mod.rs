pub mod agent;
pub mod client;
pub mod context;
pub mod memory;
pub mod modes;
pub mod provenance;
pub mod resilience;
pub mod stdio;
pub mod tooling;
