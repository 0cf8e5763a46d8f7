pub mod api1;
pub mod api2;
pub mod client;
pub mod error;
mod transport;
pub mod types;

pub use client::{ReviewServer, make_client};
pub use error::{ReviewBoardError, Result};
pub use types::{
    ApiVersion, ClientOptions, ProxySetting, RepositoryInfo, ReviewField, ReviewFields,
    with_scheme,
};
