pub mod config;
pub mod error;
pub mod event_loop;
pub mod input;
pub mod logging;
pub mod status;
pub mod tail;
pub mod view;

pub use config::Config;
pub use error::{Error, Result};
pub use event_loop::{PollLoop, StreamKind};
pub use status::RecordStore;
pub use tail::LogSource;
pub use view::PaginatedView;
