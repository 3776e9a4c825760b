pub mod defaults;
pub mod envvars;
pub mod paths;
mod regions;

pub use regions::REGION_ENDPOINTS;
