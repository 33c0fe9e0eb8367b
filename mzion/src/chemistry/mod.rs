mod element;
#[macro_use]
mod formula;
mod formula_parse;

pub use element::*;
pub use formula::*;
