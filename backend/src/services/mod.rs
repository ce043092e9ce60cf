pub mod gallery;
pub mod password_reset;
pub mod uploads;
