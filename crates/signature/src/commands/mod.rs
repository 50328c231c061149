//! ISO/IEC 7816-8 commands used for signature generation

mod internal_authenticate;
pub mod mse;
pub mod pso;

pub use internal_authenticate::internal_authenticate;
