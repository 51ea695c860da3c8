pub mod destination;
pub mod feedback;
pub mod message;
pub mod presence;

pub use destination::{ChannelTag, Destination, DeviceCapability, ProviderKind};
pub use feedback::UnregisteredEvent;
pub use message::Message;
pub use presence::{DeliveryStatus, PresenceEvent};
