mod channel_dispatcher;

pub use channel_dispatcher::{ChannelDispatcher, LaneReceivers};
