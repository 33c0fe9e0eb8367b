mod row;
mod searchable;

pub use row::*;
pub use searchable::*;
