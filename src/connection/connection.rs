use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::io::AsyncWriteExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::error::{ErrorKind, Result};
use crate::message::{Message, MessageKind};
use crate::org_freedesktop_dbus::{self, NameFlag, NameReply};
use crate::{BodyBuf, Error, SendBuf};

use super::transport::{read_frame, session_bus_address, system_bus_address, Transport};

/// How many unrouted messages the signal channel buffers before new ones
/// are dropped.
const SIGNAL_CHANNEL_DEPTH: usize = 64;

/// An asynchronous connection to a message bus.
///
/// The connection multiplexes method calls and their replies over a single
/// stream. A background task decodes incoming messages and wakes the caller
/// whose serial a reply names; everything else is published on a side
/// channel obtainable once through [`signals`].
///
/// [`signals`]: Self::signals
///
/// # Examples
///
/// ```no_run
/// use std::num::NonZeroU32;
///
/// use wirebus::{Connection, Message, ObjectPath};
///
/// const PATH: &ObjectPath = ObjectPath::new_const("/org/freedesktop/DBus");
///
/// # #[tokio::main(flavor = "current_thread")] async fn main() -> wirebus::Result<()> {
/// let c = Connection::session_bus().await?;
///
/// let serial = NonZeroU32::MIN;
/// let m = Message::method_call(PATH, "ListNames", serial)
///     .with_destination("org.freedesktop.DBus");
///
/// let reply = c.call(m).await?;
/// # Ok(()) }
/// ```
pub struct Connection {
    shared: Arc<Shared>,
    signals: StdMutex<Option<mpsc::Receiver<Message>>>,
    name: Box<str>,
    reader: JoinHandle<()>,
}

struct Shared {
    /// The write half of the stream together with the serial counter, so a
    /// serial is allocated and its bytes hit the wire under one lock.
    writer: AsyncMutex<Writer>,
    /// Reply slots for outstanding calls, keyed by serial.
    pending: StdMutex<Pending>,
}

struct Writer {
    stream: OwnedWriteHalf,
    send: SendBuf,
}

#[derive(Default)]
struct Pending {
    replies: HashMap<u32, oneshot::Sender<Result<Message>>>,
    closed: bool,
}

impl Connection {
    /// Connect to the session bus.
    ///
    /// The address is taken from `DBUS_SESSION_BUS_ADDRESS`, falling back
    /// to `$XDG_RUNTIME_DIR/bus`.
    pub async fn session_bus() -> Result<Self> {
        Self::connect(&session_bus_address()?).await
    }

    /// Connect to the system bus.
    ///
    /// The address is taken from `DBUS_SYSTEM_BUS_ADDRESS`, falling back to
    /// the well-known system bus socket path.
    pub async fn system_bus() -> Result<Self> {
        Self::connect(&system_bus_address()).await
    }

    /// Connect to the bus at the given `unix:path=` address.
    ///
    /// This authenticates, starts the background reader and performs the
    /// `Hello` exchange; the connection is handed back ready to use with
    /// its unique name assigned.
    pub async fn connect(address: &str) -> Result<Self> {
        let mut transport = Transport::connect(address).await?;
        transport.authenticate().await?;
        Self::from_transport(transport).await
    }

    /// Establish a connection over an already-connected stream.
    ///
    /// Performs the SASL exchange and the `Hello` call on the given stream
    /// before handing the connection back.
    pub async fn from_stream(stream: tokio::net::UnixStream) -> Result<Self> {
        let mut transport = Transport::from_stream(stream);
        transport.authenticate().await?;
        Self::from_transport(transport).await
    }

    pub(crate) async fn from_transport(transport: Transport) -> Result<Self> {
        let (read, write) = transport.into_split();
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_DEPTH);

        let shared = Arc::new(Shared {
            writer: AsyncMutex::new(Writer {
                stream: write,
                send: SendBuf::new(),
            }),
            pending: StdMutex::new(Pending::default()),
        });

        let reader = tokio::spawn(read_loop(read, Arc::clone(&shared), signal_tx));

        let mut connection = Self {
            shared,
            signals: StdMutex::new(Some(signal_rx)),
            name: Box::from(""),
            reader,
        };

        let hello = Message::method_call(org_freedesktop_dbus::PATH, "Hello", NonZeroU32::MIN)
            .with_destination(org_freedesktop_dbus::DESTINATION)
            .with_interface(org_freedesktop_dbus::INTERFACE);

        let reply = connection.call(hello).await?;
        connection.name = Box::from(reply.body().read::<str>()?);
        tracing::debug!(name = %connection.name, "connected");

        Ok(connection)
    }

    /// The unique name the bus assigned to this connection.
    pub fn unique_name(&self) -> &str {
        &self.name
    }

    /// Send a method call and wait for the reply.
    ///
    /// The serial of the message is replaced with the next serial of this
    /// connection. A method return resolves to the reply message; an error
    /// reply surfaces as an [`Error`] carrying the error name and message.
    ///
    /// Dropping the returned future does not retract the call; the serial
    /// stays registered until a reply arrives or the connection closes.
    pub async fn call(&self, message: Message) -> Result<Message> {
        let (tx, rx) = oneshot::channel();

        {
            let mut writer = self.shared.writer.lock().await;
            let serial = writer.send.next_serial();
            let message = message.with_serial(serial);

            {
                let mut pending = lock_pending(&self.shared);

                if pending.closed {
                    return Err(ErrorKind::ConnectionClosed.into());
                }

                pending.replies.insert(serial.get(), tx);
            }

            if let Err(error) = write_message(&mut writer, &message).await {
                lock_pending(&self.shared).replies.remove(&serial.get());
                return Err(error);
            }

            tracing::trace!(serial = serial.get(), "sent method call");
        }

        match rx.await {
            Ok(result) => result,
            Err(..) => Err(ErrorKind::ConnectionClosed.into()),
        }
    }

    /// Send a message without waiting for a reply.
    ///
    /// The serial of the message is replaced with the next serial of this
    /// connection, which is also returned.
    pub async fn send(&self, message: Message) -> Result<NonZeroU32> {
        let mut writer = self.shared.writer.lock().await;
        let serial = writer.send.next_serial();
        let message = message.with_serial(serial);

        if lock_pending(&self.shared).closed {
            return Err(ErrorKind::ConnectionClosed.into());
        }

        write_message(&mut writer, &message).await?;
        tracing::trace!(serial = serial.get(), "sent message");
        Ok(serial)
    }

    /// Take the receiver for messages which are not replies to outstanding
    /// calls: signals, calls directed at us and unmatched replies.
    ///
    /// The receiver can only be taken once.
    pub fn signals(&self) -> Option<mpsc::Receiver<Message>> {
        match self.signals.lock() {
            Ok(mut guard) => guard.take(),
            Err(mut poisoned) => poisoned.get_mut().take(),
        }
    }

    /// Request a well-known name on the bus.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wirebus::org_freedesktop_dbus::{NameFlag, NameReply};
    /// use wirebus::Connection;
    ///
    /// # #[tokio::main(flavor = "current_thread")] async fn main() -> wirebus::Result<()> {
    /// let c = Connection::session_bus().await?;
    /// let reply = c.request_name("se.example.Crate", NameFlag::DO_NOT_QUEUE).await?;
    /// assert_eq!(reply, NameReply::PRIMARY_OWNER);
    /// # Ok(()) }
    /// ```
    pub async fn request_name(&self, name: &str, flags: NameFlag) -> Result<NameReply> {
        let mut body = BodyBuf::new();
        body.write(name)?;
        body.store(flags)?;

        let m = Message::method_call(org_freedesktop_dbus::PATH, "RequestName", NonZeroU32::MIN)
            .with_destination(org_freedesktop_dbus::DESTINATION)
            .with_body_buf(&body);

        let reply = self.call(m).await?;
        reply.body().load::<NameReply>()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn lock_pending(shared: &Shared) -> MutexGuard<'_, Pending> {
    match shared.pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

async fn write_message(writer: &mut Writer, message: &Message) -> Result<()> {
    writer.send.write_message(message)?;
    let bytes = writer.send.take();
    writer.stream.write_all(&bytes).await?;
    Ok(())
}

/// The background task servicing the read side of the connection.
///
/// Messages are decoded and routed strictly in arrival order; replies are
/// delivered to their waiters synchronously from here.
async fn read_loop(
    mut read: OwnedReadHalf,
    shared: Arc<Shared>,
    signals: mpsc::Sender<Message>,
) {
    loop {
        let message = match read_frame(&mut read).await {
            Ok(frame) => match Message::decode(&frame) {
                Ok(message) => message,
                Err(error) => {
                    tracing::debug!(error = %error, "failed to decode message");
                    break;
                }
            },
            Err(error) => {
                tracing::debug!(error = %error, "transport closed");
                break;
            }
        };

        route(&shared, &signals, message);
    }

    close(&shared);
}

fn route(shared: &Arc<Shared>, signals: &mpsc::Sender<Message>, message: Message) {
    let reply_serial = match message.kind() {
        MessageKind::MethodReturn { reply_serial } | MessageKind::Error { reply_serial, .. } => {
            Some(reply_serial.get())
        }
        _ => None,
    };

    if let Some(reply_serial) = reply_serial {
        let waiter = lock_pending(shared).replies.remove(&reply_serial);

        if let Some(tx) = waiter {
            tracing::trace!(reply_serial, "routing reply");

            let result = match message.kind() {
                MessageKind::Error { .. } => Err(method_error(&message)),
                _ => Ok(message),
            };

            // The waiter may have been cancelled; that is not our problem.
            let _ = tx.send(result);
            return;
        }
    }

    // Signals, calls directed at us and unmatched replies go to the side
    // channel. If nobody listens, drop them.
    if let Err(error) = signals.try_send(message) {
        tracing::trace!(error = %error, "dropping unrouted message");
    }
}

/// Convert a peer-originated error reply into an [`Error`].
///
/// By convention the first body value of an error is a human-readable
/// message string.
fn method_error(message: &Message) -> Error {
    let MessageKind::Error { error_name, .. } = message.kind() else {
        return ErrorKind::ConnectionClosed.into();
    };

    let text = if message.signature().as_str().starts_with('s') {
        message
            .body()
            .read::<str>()
            .map(Box::<str>::from)
            .unwrap_or_default()
    } else {
        Box::from("")
    };

    ErrorKind::ResponseError(error_name.clone(), text).into()
}

/// Mark the connection closed and fail every outstanding call.
fn close(shared: &Shared) {
    let mut pending = lock_pending(shared);
    pending.closed = true;

    for (_, tx) in pending.replies.drain() {
        let _ = tx.send(Err(ErrorKind::ConnectionClosed.into()));
    }
}
