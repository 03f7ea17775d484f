pub mod lock;
pub mod paths;
pub mod registry;
