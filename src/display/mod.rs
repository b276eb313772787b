//! Display module - masking of sensitive fields and chain views

mod mask;
mod view;

pub use mask::*;
pub use view::*;
