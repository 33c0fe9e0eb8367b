mod defaults;
mod global;
mod ion_part;
mod ion_type;
mod library;
mod notation;
mod pool;
mod search;

pub use global::*;
pub use ion_part::*;
pub use ion_type::*;
pub use library::*;
pub use notation::*;
pub use pool::*;
pub use search::*;
