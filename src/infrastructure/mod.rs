// Infrastructure layer - External dependencies and adapters
pub mod benchmark_folder;
pub mod config;
pub mod dana_client;
pub mod git_repository;
pub mod hub_store;
pub mod process;
pub mod transport;
