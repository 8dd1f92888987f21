//! UDP endpoint for the avatar parameter wire.
//!
//! One socket, one receive thread, one handler. The receive thread only
//! decodes; decoded messages cross back to the owning thread over a channel
//! and are dispatched run-to-completion from `process_incoming`, so all
//! parameter mutation stays on a single thread.

use std::cell::RefCell;
use std::io;
use std::net::UdpSocket;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{codec, OscMessage, OscValue};

/// Control messages are short; anything larger than this is not ours and
/// gets truncated into the buffer, where decode rejects it.
const RECV_BUF_SIZE: usize = 1024;

/// Outbound send capability, injected into the parameter layer so it never
/// reaches for a global socket. Loss is an accepted outcome.
pub trait OscSender {
    fn send(&self, addr: &str, value: &OscValue) -> io::Result<()>;
}

type Handler = Box<dyn FnMut(OscMessage)>;

pub struct OscService {
    socket: Option<UdpSocket>,
    send_target: Option<String>,
    incoming: Option<Receiver<OscMessage>>,
    handler: RefCell<Option<Handler>>,
    _recv_thread: Option<JoinHandle<()>>,
}

impl OscService {
    pub fn new() -> Self {
        Self {
            socket: None,
            send_target: None,
            incoming: None,
            handler: RefCell::new(None),
            _recv_thread: None,
        }
    }

    /// Bind the receive side, fix the send destination, and start the
    /// receive thread. Port 0 binds to an ephemeral port (used by tests).
    pub fn configure(
        &mut self,
        recv_addr: &str,
        recv_port: u16,
        send_addr: &str,
        send_port: u16,
    ) -> io::Result<()> {
        let socket = UdpSocket::bind((recv_addr, recv_port))?;
        let recv_socket = socket.try_clone()?;
        recv_socket.set_read_timeout(Some(Duration::from_millis(50)))?;

        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || receive_loop(recv_socket, tx));

        self.socket = Some(socket);
        self.send_target = Some(format!("{}:{}", send_addr, send_port));
        self.incoming = Some(rx);
        self._recv_thread = Some(handle);
        Ok(())
    }

    /// Local address of the bound receive socket.
    pub fn local_recv_addr(&self) -> io::Result<std::net::SocketAddr> {
        match &self.socket {
            Some(s) => s.local_addr(),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "not configured")),
        }
    }

    /// Install the single inbound handler. Fan-out to multiple consumers is
    /// the parameter set's job, not the transport's.
    pub fn set_handler(&self, handler: Handler) {
        *self.handler.borrow_mut() = Some(handler);
    }

    /// Drain decoded messages on the calling thread, invoking the handler
    /// once per message. Returns how many were dispatched.
    pub fn process_incoming(&self) -> usize {
        let rx = match &self.incoming {
            Some(rx) => rx,
            None => return 0,
        };
        let mut count = 0;
        while let Ok(msg) = rx.try_recv() {
            count += 1;
            if let Some(handler) = self.handler.borrow_mut().as_mut() {
                handler(msg);
            }
        }
        count
    }
}

impl OscSender for OscService {
    /// Fire-and-forget: no acknowledgement, no retry.
    fn send(&self, addr: &str, value: &OscValue) -> io::Result<()> {
        let (socket, target) = match (&self.socket, &self.send_target) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "send before configure",
                ))
            }
        };
        socket.send_to(&codec::encode(addr, value), target.as_str())?;
        Ok(())
    }
}

fn receive_loop(socket: UdpSocket, tx: Sender<OscMessage>) {
    let mut buf = [0u8; RECV_BUF_SIZE];
    loop {
        match socket.recv(&mut buf) {
            Ok(n) => match codec::decode(&buf[..n]) {
                Some(msg) => {
                    if tx.send(msg).is_err() {
                        break; // owner gone
                    }
                }
                None => log::debug!("dropping malformed datagram ({} bytes)", n),
            },
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(_) => break,
        }
    }
}
