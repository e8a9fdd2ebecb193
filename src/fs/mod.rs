//! Filesystem helpers: directory preparation and static downloads.

pub mod dirs;
pub mod download;

pub use dirs::create_dir_if_not_exist;
pub use download::download_static_file;
