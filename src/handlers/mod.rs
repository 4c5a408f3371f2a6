pub mod health;
pub mod professionals;
