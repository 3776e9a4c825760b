mod coordinator;
mod discovery;
pub mod entities;
pub mod models;

pub use coordinator::{spawn as spawn_coordinator, CoordinatorHandle, Update};
pub use discovery::find_new_devices;
pub use entities::{build_entities, Entity, EntityState};
pub use models::{DpValue, StatusMap};
