pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod lightbox;
pub mod render;
pub mod tasks {
    pub mod lightbox;
    pub mod loader;
    pub mod viewer;
}
