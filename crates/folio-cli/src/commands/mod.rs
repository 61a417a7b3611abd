pub mod allocation;
pub mod construction;
pub mod profile;
pub mod projection;
