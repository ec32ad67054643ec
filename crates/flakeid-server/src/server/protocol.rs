//! Wire protocol for the ID service.
//!
//! A request is exactly one opcode byte. The only opcode today is
//! [`Opcode::Generate`] (`0x50`), answered with exactly eight bytes: the
//! generated [`FlakeId`] as a big-endian two's-complement `i64`.
//!
//! All other byte values are reserved. The server never replies to them; it
//! closes the connection instead. Connections are pipelined: a client may
//! send any number of `0x50` bytes and reads one reply per byte, in order.

use bytes::{Buf, BufMut, BytesMut};
use flakeid::{FLAKE_ID_SIZE, FlakeId};
use tokio_util::codec::{Decoder, Encoder};

use crate::server::error::{Error, Result};

/// Request opcodes understood by the service.
///
/// Byte values `0x00..=0x4F` and `0x51..=0xFF` are reserved for future
/// opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Mint one identifier.
    Generate = 0x50,
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x50 => Ok(Self::Generate),
            opcode => Err(Error::Protocol { opcode }),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode as u8
    }
}

/// Server side framing: opcode bytes in, identifiers out.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdCodec;

impl Decoder for IdCodec {
    type Item = Opcode;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }
        Opcode::try_from(src.get_u8()).map(Some)
    }
}

impl Encoder<FlakeId> for IdCodec {
    type Error = Error;

    fn encode(&mut self, id: FlakeId, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(FLAKE_ID_SIZE);
        dst.put_i64(id.to_i64());
        Ok(())
    }
}

/// Client side framing: opcodes out, identifiers in.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProbeCodec;

impl Decoder for ProbeCodec {
    type Item = FlakeId;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < FLAKE_ID_SIZE {
            src.reserve(FLAKE_ID_SIZE - src.len());
            return Ok(None);
        }
        Ok(Some(FlakeId::from_i64(src.get_i64())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(id) => Ok(Some(id)),
            None if src.is_empty() => Ok(None),
            None => Err(Error::ShortRead {
                received: src.len(),
                expected: FLAKE_ID_SIZE,
            }),
        }
    }
}

impl Encoder<Opcode> for ProbeCodec {
    type Error = Error;

    fn encode(&mut self, opcode: Opcode, dst: &mut BytesMut) -> Result<()> {
        dst.put_u8(opcode.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_one_opcode_per_byte() {
        let mut codec = IdCodec;
        let mut buf = BytesMut::from(&[0x50, 0x50][..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Opcode::Generate));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Opcode::Generate));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn empty_buffer_waits_for_more() {
        let mut buf = BytesMut::new();
        assert!(IdCodec.decode(&mut buf).unwrap().is_none());
        assert!(IdCodec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn rejects_reserved_opcodes() {
        for byte in [0x00, 0x4F, 0x51, 0xFF] {
            let mut buf = BytesMut::from(&[byte][..]);
            match IdCodec.decode(&mut buf) {
                Err(Error::Protocol { opcode }) => assert_eq!(opcode, byte),
                other => panic!("expected protocol error, got {other:?}"),
            }
        }
    }

    #[test]
    fn encodes_big_endian_i64() {
        let mut buf = BytesMut::new();
        let id = FlakeId::from_components(1, 2, 3);
        IdCodec.encode(id, &mut buf).unwrap();

        assert_eq!(buf.len(), FLAKE_ID_SIZE);
        assert_eq!(&buf[..], &id.to_i64().to_be_bytes()[..]);
    }

    #[test]
    fn probe_codec_reads_boundary_values() {
        for raw in [0, 1, -1, i64::MAX, i64::MIN] {
            let mut buf = BytesMut::new();
            IdCodec.encode(FlakeId::from_i64(raw), &mut buf).unwrap();
            let id = ProbeCodec.decode(&mut buf).unwrap().unwrap();
            assert_eq!(id.to_i64(), raw);
        }
    }

    #[test]
    fn probe_codec_waits_for_full_frame() {
        let mut buf = BytesMut::from(&[0u8; 7][..]);
        assert!(ProbeCodec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 7);
    }

    #[test]
    fn probe_codec_reports_short_read_at_eof() {
        let mut buf = BytesMut::from(&[0u8; 3][..]);
        match ProbeCodec.decode_eof(&mut buf) {
            Err(Error::ShortRead { received, expected }) => {
                assert_eq!(received, 3);
                assert_eq!(expected, FLAKE_ID_SIZE);
            }
            other => panic!("expected short read, got {other:?}"),
        }
    }

    #[test]
    fn probe_codec_writes_opcode_byte() {
        let mut buf = BytesMut::new();
        ProbeCodec.encode(Opcode::Generate, &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x50]);
    }
}
