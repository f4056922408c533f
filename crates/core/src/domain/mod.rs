pub mod analysis;
pub mod concern;
pub mod consultation;
pub mod product;
pub mod profile;
pub mod tags;
