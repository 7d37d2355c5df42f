pub mod offer;
pub mod product;
pub mod system;
pub mod timestamp;
