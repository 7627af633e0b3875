//! Small primitives shared across the xgrid workspace; no crate in this
//! workspace should reach for `String`/`Vec<T>` generics where one of these
//! narrower types says more about intent.

pub mod location;
pub mod rstring;
pub mod shape;

pub use location::Location;
pub use rstring::RString;
pub use shape::Shape;
