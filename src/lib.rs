// Zenith Crisis - Crisis detection and alert dispatch
// Library exports

// Core modules
pub mod config;
pub mod crisis; // Classifier and orchestrator
pub mod dispatch; // Messaging provider fan-out
pub mod location;
pub mod server; // HTTP boundary
