//! MQTT 3.1.1 framing on top of [`mqttbytes`].
//!
//! [`decode`] returns `Ok(None)` while a frame is still incomplete, so the
//! connection loop can keep reading into the same buffer.

use bytes::{BufMut, BytesMut};
use mqttbytes::v4::Packet;

use super::error::BrokerError;

/// Fixed two-byte frames of the packets that carry no body.
const PINGREQ: [u8; 2] = [0xC0, 0x00];
const PINGRESP: [u8; 2] = [0xD0, 0x00];
const DISCONNECT: [u8; 2] = [0xE0, 0x00];

/// Takes one complete packet off the front of `buf`.
///
/// # Errors
///
/// Returns [`BrokerError::Codec`] for malformed or oversized frames and for
/// CONNECT packets with an unsupported protocol.
pub fn decode(buf: &mut BytesMut, max_packet: usize) -> Result<Option<Packet>, BrokerError> {
    match mqttbytes::v4::read(buf, max_packet) {
        Ok(packet) => Ok(Some(packet)),
        Err(mqttbytes::Error::InsufficientBytes(_)) => Ok(None),
        Err(e) => Err(BrokerError::Codec(e)),
    }
}

/// Appends the wire form of `packet` to `dst`.
///
/// # Errors
///
/// Returns [`BrokerError::Codec`] if the packet cannot be serialized (for
/// example a QoS 1 PUBLISH with packet id 0).
pub fn encode(packet: &Packet, dst: &mut BytesMut) -> Result<usize, BrokerError> {
    let written = match packet {
        Packet::Connect(p) => p.write(dst),
        Packet::ConnAck(p) => p.write(dst),
        Packet::Publish(p) => p.write(dst),
        Packet::PubAck(p) => p.write(dst),
        Packet::PubRec(p) => p.write(dst),
        Packet::PubRel(p) => p.write(dst),
        Packet::PubComp(p) => p.write(dst),
        Packet::Subscribe(p) => p.write(dst),
        Packet::SubAck(p) => p.write(dst),
        Packet::Unsubscribe(p) => p.write(dst),
        Packet::UnsubAck(p) => p.write(dst),
        Packet::PingReq => Ok(put_fixed(dst, PINGREQ)),
        Packet::PingResp => Ok(put_fixed(dst, PINGRESP)),
        Packet::Disconnect => Ok(put_fixed(dst, DISCONNECT)),
    };
    written.map_err(BrokerError::Codec)
}

fn put_fixed(dst: &mut BytesMut, frame: [u8; 2]) -> usize {
    dst.put_slice(&frame);
    frame.len()
}

/// Control packet name, for logs.
#[must_use]
pub const fn name(packet: &Packet) -> &'static str {
    match packet {
        Packet::Connect(_) => "CONNECT",
        Packet::ConnAck(_) => "CONNACK",
        Packet::Publish(_) => "PUBLISH",
        Packet::PubAck(_) => "PUBACK",
        Packet::PubRec(_) => "PUBREC",
        Packet::PubRel(_) => "PUBREL",
        Packet::PubComp(_) => "PUBCOMP",
        Packet::Subscribe(_) => "SUBSCRIBE",
        Packet::SubAck(_) => "SUBACK",
        Packet::Unsubscribe(_) => "UNSUBSCRIBE",
        Packet::UnsubAck(_) => "UNSUBACK",
        Packet::PingReq => "PINGREQ",
        Packet::PingResp => "PINGRESP",
        Packet::Disconnect => "DISCONNECT",
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use mqttbytes::QoS;
    use mqttbytes::v4::{PubAck, Publish};

    use super::*;

    const MAX: usize = 1024;

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let mut full = BytesMut::new();
        let Ok(_) = encode(
            &Packet::Publish(Publish::new("regions/1", QoS::AtMostOnce, "enter")),
            &mut full,
        ) else {
            panic!("encode failed");
        };
        let tail = full.split_off(3);

        let mut buf = full;
        assert!(matches!(decode(&mut buf, MAX), Ok(None)));

        buf.unsplit(tail);
        let Ok(Some(Packet::Publish(publish))) = decode(&mut buf, MAX) else {
            panic!("expected a PUBLISH once the frame is complete");
        };
        assert_eq!(publish.topic, "regions/1");
        assert_eq!(publish.payload.as_ref(), b"enter");
        assert!(buf.is_empty());
    }

    #[test]
    fn bodiless_packets_round_trip() {
        for packet in [Packet::PingReq, Packet::PingResp, Packet::Disconnect] {
            let mut buf = BytesMut::new();
            assert!(matches!(encode(&packet, &mut buf), Ok(2)));
            let Ok(Some(decoded)) = decode(&mut buf, MAX) else {
                panic!("failed to decode {}", name(&packet));
            };
            assert_eq!(name(&decoded), name(&packet));
        }
    }

    #[test]
    fn two_frames_in_one_buffer_decode_in_order() {
        let mut buf = BytesMut::new();
        assert!(encode(&Packet::PubAck(PubAck::new(7)), &mut buf).is_ok());
        assert!(encode(&Packet::PingReq, &mut buf).is_ok());

        let Ok(Some(Packet::PubAck(ack))) = decode(&mut buf, MAX) else {
            panic!("expected PUBACK first");
        };
        assert_eq!(ack.pkid, 7);
        assert!(matches!(decode(&mut buf, MAX), Ok(Some(Packet::PingReq))));
        assert!(matches!(decode(&mut buf, MAX), Ok(None)));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut buf = BytesMut::new();
        let payload = vec![b'x'; 64];
        assert!(encode(
            &Packet::Publish(Publish::new("big", QoS::AtMostOnce, payload)),
            &mut buf
        )
        .is_ok());
        assert!(matches!(decode(&mut buf, 16), Err(BrokerError::Codec(_))));
    }

    #[test]
    fn unsupported_protocol_level_is_a_codec_error() {
        // CONNECT, "MQTT", level 9, clean session, keep-alive 60, empty id
        let mut buf = BytesMut::from(
            &[
                0x10, 12, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x09, 0x02, 0x00, 0x3C, 0x00, 0x00,
            ][..],
        );
        assert!(matches!(decode(&mut buf, MAX), Err(BrokerError::Codec(_))));
    }
}
