pub mod config;
pub mod set;
pub mod util;

pub use config::*;
pub use set::{Set, SetKey};
