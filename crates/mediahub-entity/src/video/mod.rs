//! Video entity and its resolution ladder.

pub mod model;
pub mod privacy;
pub mod resolution;

pub use model::{CreateVideo, Video};
pub use privacy::Privacy;
pub use resolution::Resolution;
