pub mod sectors;
pub mod stays;
