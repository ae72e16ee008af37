//! Message framing shared by the dispatch table, the invocation environment
//! and the pipeline.
//!
//! The helpers here reuse the gRPC wire framing (1 byte compression flag,
//! 4 byte big-endian length, prost payload) so that environments and
//! transport requests carry bytes a real stack would recognize. This crate
//! does not define a wire format of its own.

use bytes::{Bytes, BytesMut};
use http::{Uri, uri::PathAndQuery};
use prost::Message;
use tonic::{Code, Status};

/// Encode a message into a framed payload.
///
/// # Example
/// ```
/// use tonic_svc_mock::codec::{decode_message, encode_message};
/// use tonic_svc_mock::test_utils::TestRequest;
///
/// let request = TestRequest::new("id-1", "payload");
/// let framed = encode_message(&request);
/// let decoded: TestRequest = decode_message(&framed).unwrap();
/// assert_eq!(decoded, request);
/// ```
pub fn encode_message<T>(message: &T) -> Bytes
where
    T: Message,
{
    let mut buf = BytesMut::with_capacity(message.encoded_len() + 5);
    buf.resize(5, 0);

    message
        .encode(&mut buf)
        .expect("BytesMut grows on demand, encoding cannot fail");

    let payload_len = buf.len() - 5;
    buf[0] = 0; // no compression
    buf[1..5].copy_from_slice(&(payload_len as u32).to_be_bytes());

    buf.freeze()
}

/// Decode a framed payload back into a message.
///
/// Fails with `InvalidArgument` on a short or truncated frame and with
/// `Unimplemented` if the compression flag is set.
pub fn decode_message<T>(bytes: &[u8]) -> Result<T, Status>
where
    T: Message + Default,
{
    if bytes.len() < 5 {
        return Err(Status::new(Code::InvalidArgument, "message too short"));
    }

    if bytes[0] != 0 {
        return Err(Status::new(
            Code::Unimplemented,
            "compressed messages are not supported",
        ));
    }

    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    if bytes.len() < 5 + payload_len {
        return Err(Status::new(
            Code::InvalidArgument,
            format!(
                "message incomplete: expected {} bytes, got {}",
                payload_len,
                bytes.len() - 5
            ),
        ));
    }

    T::decode(&bytes[5..5 + payload_len])
        .map_err(|e| Status::new(Code::InvalidArgument, format!("failed to decode message: {e}")))
}

/// Build the `/package.Service/Method` URI for a service method.
///
/// # Example
/// ```
/// use tonic_svc_mock::codec::method_uri;
///
/// let uri = method_uri("example.TestService", "GetData");
/// assert_eq!(uri.path(), "/example.TestService/GetData");
/// ```
pub fn method_uri(service_name: &str, method_name: &str) -> Uri {
    let path = format!("/{service_name}/{method_name}");
    Uri::builder()
        .scheme("http")
        .authority("localhost")
        .path_and_query(PathAndQuery::from_maybe_shared(path).expect("valid method path"))
        .build()
        .expect("valid method uri")
}
