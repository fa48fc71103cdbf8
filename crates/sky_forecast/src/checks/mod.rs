//! Checks applied to every resource regardless of its type.

pub mod existence;
pub mod permissions;

pub use existence::check_existence;
pub use permissions::check_permissions;
