pub mod health;
pub mod preflight;
pub mod submit;
