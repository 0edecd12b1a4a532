pub mod clock;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod legacy_error;
pub mod model;
pub mod pagination;
pub mod params;
pub mod transform;
