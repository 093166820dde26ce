pub mod error;
pub mod ref_id;
