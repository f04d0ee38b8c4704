pub mod dispatch;
pub mod error;
pub mod hw;
pub mod registry;
pub mod session;
pub mod value;

pub use error::{CtlError, MonitorError};
pub use session::{CancelToken, DEFAULT_DEVICE, Session, SessionConfig};
