//! Foundation layer: shared primitives grouped for the layered architecture.

pub mod constants;
pub mod error;
pub mod types;
pub mod util;

pub use constants::*;
pub use error::*;
pub use types::*;
pub use util::encoding::{decode_hex_fixed, decode_hex_prefixed, encode_hex_prefixed, truncate_for_log};
