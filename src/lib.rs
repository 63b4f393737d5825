pub mod blob;
pub mod config;
pub mod connect;
pub mod draft;
pub mod http;
pub mod id;
pub mod notes;
pub mod render;
pub mod version;
