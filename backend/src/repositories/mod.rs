pub mod car;
pub mod gallery;
pub mod password_reset;
pub mod user;

pub use gallery::PgGalleryStore;
