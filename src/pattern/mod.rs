// Pattern module - Strum steps, blocks and their text notation

pub mod model;
pub mod notation;
pub mod symbol;

pub use model::{Pattern, PatternBlock, PatternError, PatternResult};
pub use notation::NotationError;
pub use symbol::{StepSymbol, Stroke};
