//! TCP transport with length-prefixed `bincode` framing.
//!
//! Replaces `original_source/src/util.py`'s `Socket`/`EvaluatorSocket`/
//! `GarblerSocket` (ZeroMQ REQ/REP) one-for-one: `bind`/`connect` mirror
//! the evaluator/garbler socket roles, `Connection::send`/`Connection::recv`
//! mirror `send_wait`/`poll_socket`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::error::GcError;
use crate::message::Message;

/// A framed, bidirectional connection carrying [`Message`] values.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    fn new(stream: TcpStream) -> std::io::Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Connection { stream })
    }

    /// Serialize and send a message, prefixed with its length.
    pub fn send(&mut self, message: &Message) -> Result<(), GcError> {
        let body = bincode::serde::encode_to_vec(message, bincode::config::standard())
            .map_err(|e| GcError::TransportError(e.to_string()))?;
        let len = u32::try_from(body.len())
            .map_err(|_| GcError::TransportError("message too large to frame".to_string()))?;
        self.stream
            .write_all(&len.to_be_bytes())
            .map_err(|e| GcError::TransportError(e.to_string()))?;
        self.stream
            .write_all(&body)
            .map_err(|e| GcError::TransportError(e.to_string()))?;
        self.stream
            .flush()
            .map_err(|e| GcError::TransportError(e.to_string()))
    }

    /// Block until a complete framed message arrives, then decode it.
    pub fn recv(&mut self) -> Result<Message, GcError> {
        let mut len_buf = [0u8; 4];
        self.stream
            .read_exact(&mut len_buf)
            .map_err(|e| GcError::TransportError(e.to_string()))?;
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut body = vec![0u8; len];
        self.stream
            .read_exact(&mut body)
            .map_err(|e| GcError::TransportError(e.to_string()))?;
        let (message, _) =
            bincode::serde::decode_from_slice(&body, bincode::config::standard())
                .map_err(|e| GcError::TransportError(e.to_string()))?;
        Ok(message)
    }
}

/// Evaluator role: bind a listening socket (`tcp://*:PORT` equivalent).
#[derive(Debug)]
pub struct Listener {
    listener: TcpListener,
}

impl Listener {
    /// Bind to `addr` (e.g. `("0.0.0.0", port)` or `"0.0.0.0:54321"`).
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, GcError> {
        let listener = TcpListener::bind(addr).map_err(|e| GcError::TransportError(e.to_string()))?;
        Ok(Listener { listener })
    }

    /// The address this listener is bound to, useful when binding to port 0
    /// and discovering the assigned port afterwards.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept the next incoming garbler connection.
    pub fn accept(&self) -> Result<Connection, GcError> {
        let (stream, _) = self
            .listener
            .accept()
            .map_err(|e| GcError::TransportError(e.to_string()))?;
        Connection::new(stream).map_err(|e| GcError::TransportError(e.to_string()))
    }
}

/// Garbler role: connect to a listening evaluator.
pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Connection, GcError> {
    let stream = TcpStream::connect(addr).map_err(|e| GcError::TransportError(e.to_string()))?;
    Connection::new(stream).map_err(|e| GcError::TransportError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_over_loopback() {
        let listener = Listener::bind("127.0.0.1:0").unwrap();
        let addr = listener.listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let mut conn = listener.accept().unwrap();
            let msg = conn.recv().unwrap();
            match msg {
                Message::Hello => {}
                other => panic!("unexpected message: {other:?}"),
            }
            conn.send(&Message::Ack).unwrap();
        });

        let mut client = connect(addr).unwrap();
        client.send(&Message::Hello).unwrap();
        let reply = client.recv().unwrap();
        assert!(matches!(reply, Message::Ack));

        server.join().unwrap();
    }
}
