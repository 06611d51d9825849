// Shared raw data and the published snapshot
pub mod data_store;

// Index series acquisition
pub mod index_loader;

// Fetch, derive, publish
pub mod orchestrator;
pub mod refresh_service;

// System wiring and the presenter-facing client
pub mod client;
pub mod system;
