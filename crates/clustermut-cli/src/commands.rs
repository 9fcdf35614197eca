pub mod analyze;
pub mod pack;
