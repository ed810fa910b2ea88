//! Sockets, raw I/O and the command/reply channel.

mod channel;
mod stream;
mod transport;

pub use channel::CommandChannel;
pub use stream::{SmtpStream, connect, connect_tls, create_tls_connector, load_certificates};
pub use transport::{READ_CHUNK_SIZE, Transport};
