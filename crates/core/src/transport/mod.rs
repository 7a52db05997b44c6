use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::{codec, Dispatcher, ParamValue, Result};

/// Size of the reusable receive buffer. Longer datagrams are truncated by the
/// read and then fail to decode.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Pause after a failed socket read before trying again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Outbound side of the connection to the console.
///
/// Sends are fire-and-forget: the returned `Result` only reports what
/// happened so callers can log it. No caller changes course on an error
/// except the liveness probe.
pub trait OscSink: Send + Sync {
    fn send(&self, address: &str, arg: Option<&ParamValue>) -> Result<()>;
}

/// Tally of a batch of fire-and-forget sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    pub attempted: usize,
    pub failed: usize,
}

impl SendReport {
    /// Sends one command through `sink`, logging and counting a failure
    /// instead of returning it.
    pub fn send(&mut self, sink: &dyn OscSink, address: &str, arg: Option<&ParamValue>) {
        self.attempted += 1;
        if let Err(err) = sink.send(address, arg) {
            self.failed += 1;
            tracing::debug!(address, error = %err, "failed to send OSC message");
        }
    }
}

/// UDP socket bound locally and aimed at one fixed console endpoint.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Binds `local` and targets `target` for every send.
    pub fn bind(local: SocketAddr, target: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local)?;
        Ok(Self { socket, target })
    }

    /// Address the socket is bound to, including the OS-chosen port.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Console endpoint every send goes to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Starts the receive loop on its own thread. Every decoded message is
    /// handed to `dispatcher`.
    pub fn spawn_receiver(&self, dispatcher: Dispatcher) -> Result<JoinHandle<()>> {
        let socket = self.socket.try_clone()?;
        let handle = thread::Builder::new()
            .name("osc-receive".to_string())
            .spawn(move || receive_loop(&socket, &dispatcher))?;
        Ok(handle)
    }
}

impl OscSink for UdpTransport {
    fn send(&self, address: &str, arg: Option<&ParamValue>) -> Result<()> {
        let data = codec::encode(address, arg.map(ParamValue::to_osc))?;
        tracing::debug!(address, arg = ?arg, "sending OSC message");
        tracing::trace!(raw = %codec::hex(&data), "raw OSC data");

        self.socket.send_to(&data, self.target)?;
        tracing::trace!(target = %self.target, "OSC message sent");
        Ok(())
    }
}

/// Reads datagrams forever. Read errors are logged and retried after a short
/// pause; the loop itself never exits.
fn receive_loop(socket: &UdpSocket, dispatcher: &Dispatcher) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    loop {
        match socket.recv_from(&mut buf) {
            Ok((n, from)) => {
                tracing::trace!(%from, bytes = n, "datagram received");
                deliver(&buf[..n], dispatcher);
            }
            Err(err) => {
                tracing::debug!(error = %err, "error reading from socket");
                thread::sleep(RECV_ERROR_BACKOFF);
            }
        }
    }
}

/// Decodes one datagram and dispatches its messages. Undecodable datagrams
/// are dropped. Returns how many messages were dispatched.
pub fn deliver(datagram: &[u8], dispatcher: &Dispatcher) -> usize {
    match codec::decode(datagram) {
        Ok(messages) => {
            for message in &messages {
                dispatcher.dispatch(message);
            }
            messages.len()
        }
        Err(err) => {
            tracing::debug!(error = %err, "dropping undecodable datagram");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use rosc::OscType;

    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn sends_encoded_messages_to_the_target() {
        let console = UdpSocket::bind(loopback()).unwrap();
        console
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let transport = UdpTransport::bind(loopback(), console.local_addr().unwrap()).unwrap();

        transport
            .send("/ch/29/mix/on", Some(&ParamValue::Int32(0)))
            .unwrap();

        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let (n, _) = console.recv_from(&mut buf).unwrap();
        let messages = codec::decode(&buf[..n]).unwrap();
        assert_eq!(messages[0].addr, "/ch/29/mix/on");
        assert_eq!(messages[0].args, vec![OscType::Int(0)]);
    }

    #[test]
    fn receiver_dispatches_inbound_messages() {
        let console = UdpSocket::bind(loopback()).unwrap();
        let transport = UdpTransport::bind(loopback(), console.local_addr().unwrap()).unwrap();

        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("/config/mute/2", move |msg| {
            let _ = tx.lock().unwrap().send(msg.args.clone());
        });
        transport.spawn_receiver(dispatcher).unwrap();

        let local = transport.local_addr().unwrap();
        console
            .send_to(&codec::encode("/ch/01/mix/on", None).unwrap(), local)
            .unwrap();
        console
            .send_to(
                &codec::encode("/config/mute/2", Some(OscType::Float(1.0))).unwrap(),
                local,
            )
            .unwrap();

        let args = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(args, vec![OscType::Float(1.0)]);
    }

    #[test]
    fn undecodable_datagrams_reach_no_handler() {
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(crate::dispatch::WILDCARD, move |msg| {
            let _ = tx.lock().unwrap().send(msg.addr.clone());
        });

        assert_eq!(deliver(b"not an osc packet", &dispatcher), 0);
        assert!(rx.try_recv().is_err());
    }
}
