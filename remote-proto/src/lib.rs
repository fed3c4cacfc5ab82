//! Wire protocol definitions for remotekit integration drivers.
//!
//! This crate is the leaf of the workspace: it knows how frames look on the
//! wire and nothing about connections or driver state. It provides:
//!
//! - [`decode`] / [`encode`]: the envelope codec. Inbound text becomes an
//!   [`InboundFrame`] (request or event); outbound [`OutboundFrame`]s become
//!   wire text.
//! - [`messages`]: typed payloads for every protocol message plus the `msg`
//!   discriminator constants used for dispatch.
//! - [`state`]: the device-connection and driver-setup state enumerations
//!   shared between the engine and the wire.
//!
//! # Envelope shapes
//!
//! ```json
//! {"kind":"req","id":1,"msg":"get_driver_version"}
//! {"kind":"resp","req_id":1,"msg":"driver_version","code":200,"msg_data":{...}}
//! {"kind":"event","msg":"entity_change","msg_data":{...}}
//! ```
//!
//! Note the asymmetry: requests carry `id`, responses echo it as `req_id`.

pub mod envelope;
pub mod error;
pub mod messages;
pub mod state;

pub use envelope::{
    decode, encode, InboundEvent, InboundFrame, OutboundEvent, OutboundFrame, RequestMessage,
    ResponseMessage,
};
pub use error::{ProtoError, Result};
pub use messages::{DriverMetadata, API_VERSION};
pub use state::{DeviceState, DriverSetupState, SetupError, SetupEventType};
