//! Scrolling spawn window of particle columns around a moving anchor

pub mod wrap;
pub mod column;
pub mod window;

pub use column::{Column, ColumnId};
pub use window::{SpawnWindow, WindowReport};
