use bytes::{Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::paxos::rpc::{PaxosRequest, PaxosResponse};
use crate::util::errors::{PaxosError, Result};

// Constants for message size management
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB - prevent DoS attacks

/// Length-prefixed bincode codec.
///
/// Frames are `[length: 4 bytes BE u32][payload: bincode]`. `In` is the type
/// read off the wire, `Out` the type written to it.
pub struct MessageCodec<In, Out> {
    inner: LengthDelimitedCodec,
    _marker: PhantomData<fn(Out) -> In>,
}

/// Acceptor side: reads requests, writes responses
pub type ServerCodec = MessageCodec<PaxosRequest, PaxosResponse>;

/// Coordinator side: reads responses, writes requests
pub type ClientCodec = MessageCodec<PaxosResponse, PaxosRequest>;

impl<In, Out> MessageCodec<In, Out> {
    pub fn new(max_frame_length: usize) -> Self {
        let inner = LengthDelimitedCodec::builder()
            .length_field_length(4)
            .big_endian()
            .max_frame_length(max_frame_length)
            .new_codec();

        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<In, Out> Default for MessageCodec<In, Out> {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_SIZE)
    }
}

impl<In: DeserializeOwned, Out> Decoder for MessageCodec<In, Out> {
    type Item = In;
    type Error = PaxosError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<In>> {
        let frame = match self.inner.decode(src)? {
            Some(frame) => frame,
            None => return Ok(None),
        };

        if frame.is_empty() {
            return Err(PaxosError::SerializationError(
                "Message size cannot be zero".to_string(),
            ));
        }

        Ok(Some(bincode::deserialize(&frame)?))
    }
}

impl<In, Out: Serialize> Encoder<Out> for MessageCodec<In, Out> {
    type Error = PaxosError;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<()> {
        let payload = bincode::serialize(&item)?;
        self.inner.encode(Bytes::from(payload), dst)?;
        Ok(())
    }
}
