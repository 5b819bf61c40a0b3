pub mod entities;
pub mod errors;
pub mod ports;
pub mod registry;
pub mod steps;

pub use entities::{Event, EventData, EventStatus};
pub use errors::{EventError, HandlerError, NotifierError};
pub use ports::{EventEmitter, EventHandler, EventStore, Notifier};
pub use registry::HandlerRegistry;
pub use steps::StepContext;
