// Application layer - Ports and the publish/watch use cases
pub mod artifact_store;
pub mod command_runner;
pub mod commit_source;
pub mod dashboard_api;
pub mod publish_service;
pub mod watch_service;
