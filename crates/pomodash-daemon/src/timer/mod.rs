pub mod clock;
pub mod engine;
pub mod events;
pub mod manager;

pub use clock::{TickHandle, TickSource};
pub use engine::TimerEngine;
pub use events::{TimerEvent, TimerEventType};
pub use manager::{TimerManager, TimerManagerError};
