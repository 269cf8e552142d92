pub mod inventory;
pub mod normalize;
pub mod status;
