pub mod colors;
pub mod frame;
pub mod geometry;
pub mod scale;
pub mod timestamp;

pub use colors::{COLOR_LAND_DEFAULT, Rgb};
pub use frame::*;
pub use geometry::*;
pub use scale::*;
pub use timestamp::{Timestamp, TimestampParseError};
