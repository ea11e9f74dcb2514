//! Line codec: one JSON request per line in, one response per line out.

use std::io;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use super::errors::ProtocolError;
use super::response::Response;

#[derive(Debug)]
pub enum InboundFrame {
    Request(String),
    /// A line that was consumed but cannot be dispatched; the connection stays open
    Rejected(ProtocolError),
}

#[derive(Debug)]
pub struct RelayCodec {
    lines: LinesCodec,
    max_length: usize,
}

impl RelayCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
            max_length,
        }
    }

    fn frame(&self, decoded: Result<Option<String>, LinesCodecError>) -> io::Result<Option<InboundFrame>> {
        match decoded {
            Ok(Some(line)) => Ok(Some(InboundFrame::Request(line))),
            Ok(None) => Ok(None),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(InboundFrame::Rejected(ProtocolError::TooLong(self.max_length))))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(InboundFrame::Rejected(ProtocolError::NotUtf8)))
            }
            Err(LinesCodecError::Io(e)) => Err(e),
        }
    }
}

impl Decoder for RelayCodec {
    type Item = InboundFrame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let decoded = self.lines.decode(src);
        self.frame(decoded)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let decoded = self.lines.decode_eof(src);
        self.frame(decoded)
    }
}

impl Encoder<Response> for RelayCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = item.as_bytes();
        dst.reserve(body.len() + 1);
        dst.put_slice(body);
        dst.put_u8(b'\n');
        Ok(())
    }
}
