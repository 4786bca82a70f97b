//! Fixed-size frame wire protocol: device-side packetization and
//! host-side decoding over best-effort datagrams.

pub mod decoder;
pub mod frame;
pub mod packetizer;

pub use decoder::{decode_frame, WireError};
pub use frame::{
    saturating_delta, Frame, WireFormat, FRAME_LEN_FIXED, FRAME_LEN_SEQUENCED, INERTIAL_SLOTS,
    RANGING_SLOTS,
};
pub use packetizer::Packetizer;
