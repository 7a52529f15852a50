mod buffer;
mod notification;
mod view;

pub use buffer::Buffer;
pub use notification::{EventCode, HostEvent, NotificationBridge, Source};
pub use view::{View, Views};
