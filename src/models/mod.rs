pub use transfer_types::*;
pub use wizard_errors::*;

pub mod transfer_types;
pub mod wizard_errors;
