pub mod deta_client;

pub use deta_client::Deta;
