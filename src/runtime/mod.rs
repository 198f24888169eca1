//! Runtime adapters and the scheduling entry-point surface.

pub mod api;
pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
