// Domain layer - Transient DTOs exchanged with the dashboard and the store
pub mod benchmark;
pub mod build;
pub mod commit;
pub mod series;
