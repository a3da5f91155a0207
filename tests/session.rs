//! Drives a connection against a scripted bus peer over a socket pair,
//! covering the SASL exchange, the Hello handshake, reply correlation,
//! error replies and signal delivery.

use std::num::NonZeroU32;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use wirebus::{BodyBuf, Connection, Message, MessageKind, ObjectPath, SendBuf};

async fn read_line<S>(stream: &mut S) -> Vec<u8>
where
    S: AsyncRead + Unpin,
{
    let mut line = Vec::new();

    loop {
        let byte = stream.read_u8().await.unwrap();

        if byte == b'\n' {
            return line;
        }

        line.push(byte);
    }
}

fn field_u32(bytes: &[u8], little_endian: bool) -> u32 {
    let mut array = [0u8; 4];
    array.copy_from_slice(bytes);

    if little_endian {
        u32::from_le_bytes(array)
    } else {
        u32::from_be_bytes(array)
    }
}

/// Read one message frame, or `None` once the peer has hung up.
async fn read_frame<S>(stream: &mut S) -> Option<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut fixed = [0u8; 16];

    if stream.read_exact(&mut fixed).await.is_err() {
        return None;
    }

    let little_endian = fixed[0] == b'l';
    let body = field_u32(&fixed[4..8], little_endian) as usize;
    let fields = field_u32(&fixed[12..16], little_endian) as usize;
    let padding = (8 - (16 + fields) % 8) % 8;

    let mut frame = vec![0u8; 16 + fields + padding + body];
    frame[..16].copy_from_slice(&fixed);
    stream.read_exact(&mut frame[16..]).await.unwrap();

    Some(frame)
}

async fn write_message(stream: &mut UnixStream, send: &mut SendBuf, message: &Message) {
    send.write_message(message).unwrap();
    let bytes = send.take();
    stream.write_all(&bytes).await.unwrap();
}

/// The server side of the session: SASL, Hello, then scripted replies.
async fn serve(mut stream: UnixStream) {
    assert_eq!(stream.read_u8().await.unwrap(), 0);

    let auth = read_line(&mut stream).await;
    assert!(auth.starts_with(b"AUTH EXTERNAL "));
    stream.write_all(b"OK 123deadbeef\r\n").await.unwrap();

    let begin = read_line(&mut stream).await;
    assert_eq!(begin, b"BEGIN\r");

    let mut send = SendBuf::new();

    while let Some(frame) = read_frame(&mut stream).await {
        let message = Message::decode(&frame).unwrap();

        let MessageKind::MethodCall { member, .. } = message.kind() else {
            panic!("unexpected message: {message:?}");
        };

        match &**member {
            "Hello" => {
                let mut body = BodyBuf::new();
                body.write(":1.99").unwrap();

                let reply = Message::method_return(send.next_serial(), message.serial())
                    .with_body_buf(&body);
                write_message(&mut stream, &mut send, &reply).await;
            }
            "Ping" => {
                let mut body = BodyBuf::new();
                body.write("pong").unwrap();

                let reply = Message::method_return(send.next_serial(), message.serial())
                    .with_body_buf(&body);
                write_message(&mut stream, &mut send, &reply).await;

                let path = ObjectPath::new("/org/example").unwrap();
                let signal = Message::signal(path, "Tick", send.next_serial())
                    .with_interface("org.example.Events");
                write_message(&mut stream, &mut send, &signal).await;
            }
            "Boom" => {
                let mut body = BodyBuf::new();
                body.write("kaboom").unwrap();

                let reply = Message::error(
                    "org.example.Failed",
                    send.next_serial(),
                    message.serial(),
                )
                .with_body_buf(&body);
                write_message(&mut stream, &mut send, &reply).await;
            }
            other => panic!("unexpected method call: {other}"),
        }
    }
}

#[tokio::test]
async fn session_round_trip() {
    timeout(Duration::from_secs(10), async {
        let (client, server) = UnixStream::pair().unwrap();
        let server = tokio::spawn(serve(server));

        let connection = Connection::from_stream(client).await.unwrap();
        assert_eq!(connection.unique_name(), ":1.99");

        let mut signals = connection.signals().unwrap();
        let path = ObjectPath::new("/org/example").unwrap();

        // A method call resolves with the correlated reply.
        let m = Message::method_call(path, "Ping", NonZeroU32::MIN)
            .with_destination("org.example");
        let reply = connection.call(m).await.unwrap();
        assert_eq!(reply.body().read::<str>().unwrap(), "pong");

        // The signal emitted after the reply lands on the side channel.
        let signal = signals.recv().await.unwrap();
        assert!(matches!(
            signal.kind(),
            MessageKind::Signal { member, .. } if &**member == "Tick"
        ));
        assert_eq!(signal.interface(), Some("org.example.Events"));

        // An error reply surfaces as an error naming the peer error.
        let m = Message::method_call(path, "Boom", NonZeroU32::MIN)
            .with_destination("org.example");
        let error = connection.call(m).await.unwrap_err();
        let rendered = error.to_string();
        assert!(rendered.contains("org.example.Failed"), "{rendered}");
        assert!(rendered.contains("kaboom"), "{rendered}");

        drop(connection);
        server.await.unwrap();
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn pending_calls_fail_when_the_peer_hangs_up() {
    timeout(Duration::from_secs(10), async {
        let (client, server) = UnixStream::pair().unwrap();

        let server = tokio::spawn(async move {
            let mut stream = server;
            assert_eq!(stream.read_u8().await.unwrap(), 0);
            let _auth = read_line(&mut stream).await;
            stream.write_all(b"OK 123deadbeef\r\n").await.unwrap();
            let _begin = read_line(&mut stream).await;

            // Answer Hello, then hang up on the next call.
            let frame = read_frame(&mut stream).await.unwrap();
            let hello = Message::decode(&frame).unwrap();

            let mut send = SendBuf::new();
            let mut body = BodyBuf::new();
            body.write(":1.100").unwrap();

            let reply = Message::method_return(send.next_serial(), hello.serial())
                .with_body_buf(&body);
            write_message(&mut stream, &mut send, &reply).await;

            let _ = read_frame(&mut stream).await;
            drop(stream);
        });

        let connection = Connection::from_stream(client).await.unwrap();
        let path = ObjectPath::new("/org/example").unwrap();

        let m = Message::method_call(path, "Ping", NonZeroU32::MIN)
            .with_destination("org.example");
        let error = connection.call(m).await.unwrap_err();
        assert_eq!(error.to_string(), "Connection closed");

        // Later sends fail as well.
        let m = Message::method_call(path, "Ping", NonZeroU32::MIN);
        assert!(connection.call(m).await.is_err());

        server.await.unwrap();
    })
    .await
    .unwrap();
}
