mod config;
mod http;
mod traits;

pub use config::{ClientConfig, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS};
pub use http::HttpService;
pub use traits::{RecordService, ServiceError};
