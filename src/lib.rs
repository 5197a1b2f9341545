pub mod api;
pub mod client;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod signer;
pub mod token;

pub use client::{PlatformRequest, TuyaClient};
pub use config::{Region, Settings};
pub use device::Device;
pub use error::{Error, Result};
pub use models::PlatformResponse;
