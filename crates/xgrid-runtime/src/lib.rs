//! The grid data model (component C5): a ring-buffered time history plus a
//! parallel boundary mask, and marshalling to the record layout C4's
//! generated accessors expect. Ported from `xgrid/__init__.py`'s `Grid`
//! class, whose own data layout was left as a `TODO` in the original.

mod error;
mod foreign;
mod grid;

pub use error::ShapeError;
pub use foreign::ForeignGrid;
pub use grid::Grid;
