//! Prelude module for convenient imports.
pub use crate::client::{ConnectionState, RealtimeClient, StaticToken, TokenProvider};
pub use crate::config::RealtimeConfig;
pub use crate::error::RealtimeError;
pub use crate::listeners::{EventStream, ListenerId, Subscription};
pub use crate::protocol::{
    ClientMessage, Envelope, Notification, ServerEvent, SimulationProgress,
    SimulationStatusUpdate, events,
};
pub use crate::reconnect::ReconnectPolicy;
pub use crate::transport::{Connector, Frame, TungsteniteConnector};
