//! Frame codec for host communication.
//!
//! A frame is `[u32 LE length][u8 type][payload]`. The length covers the type
//! byte and payload, never the length field itself. Length-prefixing is left to
//! `LengthDelimitedCodec`; [`FrameCodec`] only adds the type byte on top and
//! reports how far a frame got when the stream ends inside it.

use std::io;

use tokio_util::bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use super::protocol::{LENGTH_FIELD_LEN, MessageType};

/// One decoded wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message_type: MessageType,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(message_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            message_type,
            payload: payload.into(),
        }
    }

    pub fn json(payload: impl Into<Bytes>) -> Self {
        Self::new(MessageType::Json, payload)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("truncated frame header: got {available} of 5 bytes")]
    TruncatedHeader { available: usize },

    #[error("truncated frame payload: expected {expected} bytes, got {available}")]
    TruncatedPayload { expected: usize, available: usize },

    #[error("frame declares zero length (type byte missing)")]
    EmptyFrame,

    #[error("payload of {0} bytes does not fit in a frame")]
    Oversized(usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Whether the host went away mid-frame rather than the transport failing.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader { .. } | Self::TruncatedPayload { .. }
        )
    }
}

/// Encode a frame into a contiguous buffer.
pub fn encode(message_type: MessageType, payload: &[u8]) -> Result<Bytes, FrameError> {
    let mut dst = BytesMut::new();
    FrameCodec::new().encode(
        Frame::new(message_type, Bytes::copy_from_slice(payload)),
        &mut dst,
    )?;
    Ok(dst.freeze())
}

/// `tokio_util` codec for [`Frame`]s.
///
/// Wraps a little-endian `LengthDelimitedCodec` whose body is the type byte
/// followed by the payload.
#[derive(Debug)]
pub struct FrameCodec {
    inner: LengthDelimitedCodec,
    /// Declared length of the frame whose length field has been consumed.
    pending: Option<u32>,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .little_endian()
                .length_field_length(LENGTH_FIELD_LEN)
                .max_frame_length(u32::MAX as usize)
                .new_codec(),
            pending: None,
        }
    }

    /// Whether a frame has started but not yet completed.
    pub fn in_frame(&self) -> bool {
        self.pending.is_some()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // The inner codec consumes the length field as soon as it is buffered.
        if self.pending.is_none() && src.len() >= LENGTH_FIELD_LEN {
            self.pending = Some((&src[..LENGTH_FIELD_LEN]).get_u32_le());
        }
        let Some(mut body) = self.inner.decode(src)? else {
            return Ok(None);
        };
        self.pending = None;

        if body.is_empty() {
            return Err(FrameError::EmptyFrame);
        }
        let message_type = MessageType::from(body.get_u8());
        Ok(Some(Frame::new(message_type, body.freeze())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        match self.pending {
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::TruncatedHeader {
                available: src.len(),
            }),
            Some(_) if src.is_empty() => Err(FrameError::TruncatedHeader {
                available: LENGTH_FIELD_LEN,
            }),
            Some(length) => Err(FrameError::TruncatedPayload {
                expected: length as usize - 1,
                available: src.len() - 1,
            }),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.payload.len() >= u32::MAX as usize {
            return Err(FrameError::Oversized(item.payload.len()));
        }
        tracing::trace!(
            message_type = %item.message_type,
            payload_bytes = item.payload.len(),
            "Encoding frame"
        );
        let mut body = BytesMut::with_capacity(1 + item.payload.len());
        body.put_u8(item.message_type.as_u8());
        body.put_slice(&item.payload);
        self.inner.encode(body.freeze(), dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::HEADER_LEN;
    use futures::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    #[test]
    fn encode_writes_length_type_payload() {
        let bytes = encode(MessageType::Json, b"{}").unwrap();
        assert_eq!(&bytes[..], &[3, 0, 0, 0, 1, b'{', b'}']);
        assert_eq!(bytes.len(), HEADER_LEN + 2);
    }

    #[test]
    fn decode_of_encoded_frame_yields_type_and_payload() {
        let payload = b"{\"method\":\"POST\"}";
        for message_type in [MessageType::Json, MessageType::Binary] {
            let bytes = encode(message_type, payload).unwrap();
            assert_eq!(
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
                payload.len() + 1
            );

            let mut buf = BytesMut::from(&bytes[..]);
            let frame = FrameCodec::new().decode(&mut buf).unwrap().unwrap();
            assert_eq!(frame.message_type, message_type);
            assert_eq!(&frame.payload[..], payload);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn empty_payload_is_a_one_byte_frame() {
        let bytes = encode(MessageType::Json, b"").unwrap();
        assert_eq!(&bytes[..], &[1, 0, 0, 0, 1]);

        let mut buf = BytesMut::from(&bytes[..]);
        let frame = FrameCodec::new().decode(&mut buf).unwrap().unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn unknown_type_byte_is_preserved() {
        let mut buf = BytesMut::from(&[2, 0, 0, 0, 9, b'x'][..]);
        let frame = FrameCodec::new().decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.message_type, MessageType::Unknown(9));
    }

    #[test]
    fn zero_length_is_rejected() {
        let mut buf = BytesMut::from(&[0, 0, 0, 0, 1][..]);
        let err = FrameCodec::new().decode(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::EmptyFrame));
    }

    #[test]
    fn decoder_waits_for_full_frame() {
        let mut codec = FrameCodec::new();
        let bytes = encode(MessageType::Json, b"hello").unwrap();

        let mut buf = BytesMut::from(&bytes[..7]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(codec.in_frame());

        buf.extend_from_slice(&bytes[7..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, Frame::json(&b"hello"[..]));
        assert!(buf.is_empty());
        assert!(!codec.in_frame());
    }

    #[test]
    fn decoder_handles_back_to_back_frames() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode(MessageType::Json, b"a").unwrap());
        buf.extend_from_slice(&encode(MessageType::Json, b"bc").unwrap());

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().payload, "a");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().payload, "bc");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn eof_between_frames_is_clean() {
        let mut buf = BytesMut::new();
        assert!(FrameCodec::new().decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn eof_inside_length_field_is_truncated_header() {
        let mut buf = BytesMut::from(&[9, 0][..]);
        let err = FrameCodec::new().decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedHeader { available: 2 }));
    }

    #[test]
    fn eof_before_type_byte_is_truncated_header() {
        let mut buf = BytesMut::from(&[9, 0, 0, 0][..]);
        let err = FrameCodec::new().decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedHeader { available: 4 }));
    }

    #[test]
    fn eof_mid_payload_is_truncated_payload() {
        let mut codec = FrameCodec::new();
        let bytes = encode(MessageType::Json, b"hello").unwrap();
        let mut buf = BytesMut::from(&bytes[..8]);

        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::TruncatedPayload {
                expected: 5,
                available: 3
            }
        ));
        assert!(err.is_truncation());
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (a, b) = tokio::io::duplex(64);
        let mut writer = FramedWrite::new(a, FrameCodec::new());
        let mut reader = FramedRead::new(b, FrameCodec::new());

        writer.send(Frame::json(&b"one"[..])).await.unwrap();
        writer
            .send(Frame::new(MessageType::Binary, &b"two"[..]))
            .await
            .unwrap();
        drop(writer);

        let first = reader.next().await.unwrap().unwrap();
        assert_eq!(first.payload, Bytes::from_static(b"one"));
        let second = reader.next().await.unwrap().unwrap();
        assert_eq!(second.message_type, MessageType::Binary);
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_read_reassembles_split_writes() {
        let (mut a, b) = tokio::io::duplex(64);
        let bytes = encode(MessageType::Json, b"{\"path\":\"/x\"}").unwrap();
        let writer = tokio::spawn(async move {
            for chunk in bytes.chunks(3) {
                a.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let mut reader = FramedRead::new(b, FrameCodec::new());
        let frame = reader.next().await.unwrap().unwrap();
        assert_eq!(frame.payload, Bytes::from_static(b"{\"path\":\"/x\"}"));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn framed_read_partial_payload_is_truncation() {
        let (mut a, b) = tokio::io::duplex(64);
        a.write_all(&[6, 0, 0, 0, 1, b'a', b'b']).await.unwrap();
        drop(a);

        let mut reader = FramedRead::new(b, FrameCodec::new());
        let err = reader.next().await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            FrameError::TruncatedPayload {
                expected: 5,
                available: 2
            }
        ));
    }
}
