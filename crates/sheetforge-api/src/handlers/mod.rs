pub mod gangsheets;
pub mod health;
