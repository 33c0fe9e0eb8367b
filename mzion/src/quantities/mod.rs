mod tolerance;

pub use tolerance::*;
