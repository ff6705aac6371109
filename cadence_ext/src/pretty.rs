pub mod numbered;
pub mod truncate;
