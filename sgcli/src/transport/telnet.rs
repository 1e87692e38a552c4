//! Telnet transport for consoles behind a serial terminal server.
//!
//! The console is a plain text stream framed with [`ConsoleCodec`]. Option
//! negotiation is handled by `libtelnet-rs` with an empty support table, so
//! every `DO` gets a `WONT` and every `WILL` a `DONT`.

use std::collections::VecDeque;

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use libtelnet_rs::Parser;
use libtelnet_rs::events::TelnetEvents;
use libtelnet_rs::telnet::op_command::{DONT, IAC, WILL};
use log::{debug, trace};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, Framed};

use super::Transport;
use super::config::TelnetConfig;
use crate::error::{Result, TransportError};

const NUL: u8 = 0;
const XON: u8 = 0x11;

/// A decoded unit of the console stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleFrame {
    /// Console text with telnet commands removed.
    Text(Bytes),
    /// Negotiation answer owed to the terminal server.
    Reply(Bytes),
}

/// Telnet codec for a console line.
///
/// Decoded events wait in a queue until taken, so nothing parsed from the
/// socket is lost when a read is abandoned.
pub(crate) struct ConsoleCodec {
    parser: Parser,
    queue: VecDeque<ConsoleFrame>,
}

impl ConsoleCodec {
    pub(crate) fn new() -> Self {
        Self {
            parser: Parser::new(),
            queue: VecDeque::new(),
        }
    }

    fn push_event(&mut self, event: TelnetEvents) {
        match event {
            TelnetEvents::DataReceive(data) => {
                let text: Vec<u8> = Parser::unescape_iac(data)
                    .iter()
                    .copied()
                    .filter(|&b| b != NUL && b != XON)
                    .collect();
                if !text.is_empty() {
                    self.queue.push_back(ConsoleFrame::Text(Bytes::from(text)));
                }
            }
            TelnetEvents::DataSend(reply) => {
                trace!("telnet: refusing {:?}", reply);
                self.queue.push_back(ConsoleFrame::Reply(reply));
            }
            _ => {}
        }
    }
}

impl Decoder for ConsoleCodec {
    type Item = ConsoleFrame;
    type Error = TransportError;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<ConsoleFrame>, TransportError> {
        let complete = src.len() - incomplete_tail(src);
        if complete > 0 {
            let chunk = src.split_to(complete);
            for event in self.parser.receive(&chunk) {
                self.push_event(event);
            }
        }
        Ok(self.queue.pop_front())
    }

    fn decode_eof(
        &mut self,
        src: &mut BytesMut,
    ) -> std::result::Result<Option<ConsoleFrame>, TransportError> {
        let frame = self.decode(src)?;
        if frame.is_none() && !src.is_empty() {
            trace!("telnet: dropping {} bytes of a cut-off command", src.len());
            src.clear();
        }
        Ok(frame)
    }
}

/// Length of a command at the end of `buf` that still lacks bytes.
fn incomplete_tail(buf: &[u8]) -> usize {
    let iac_run = |bytes: &[u8]| bytes.iter().rev().take_while(|&&b| b == IAC).count();

    if iac_run(buf) % 2 == 1 {
        return 1;
    }
    match buf {
        [head @ .., IAC, command]
            if (WILL..=DONT).contains(command) && iac_run(head) % 2 == 0 =>
        {
            2
        }
        _ => 0,
    }
}

impl Encoder<ConsoleFrame> for ConsoleCodec {
    type Error = TransportError;

    fn encode(
        &mut self,
        frame: ConsoleFrame,
        dst: &mut BytesMut,
    ) -> std::result::Result<(), TransportError> {
        match frame {
            ConsoleFrame::Text(data) => dst.put(Parser::escape_iac(data)),
            ConsoleFrame::Reply(reply) => dst.put(reply),
        }
        Ok(())
    }
}

/// TCP connection to a terminal server console port.
pub struct TelnetTransport {
    framed: Framed<TcpStream, ConsoleCodec>,
    /// Text decoded but beyond the caller's read limit.
    backlog: BytesMut,
}

impl TelnetTransport {
    /// Connect to the terminal server within the configured timeout.
    pub async fn connect(config: &TelnetConfig) -> Result<Self> {
        debug!("telnet: connecting to {}:{}", config.host, config.port);

        let stream = tokio::time::timeout(
            config.timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        stream.set_nodelay(true).map_err(TransportError::Io)?;

        Ok(Self::from_stream(stream))
    }

    fn from_stream(stream: TcpStream) -> Self {
        Self {
            framed: Framed::new(stream, ConsoleCodec::new()),
            backlog: BytesMut::new(),
        }
    }

    fn take_backlog(&mut self, max: usize) -> Vec<u8> {
        let n = max.min(self.backlog.len());
        self.backlog.split_to(n).to_vec()
    }
}

impl Transport for TelnetTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.framed
            .send(ConsoleFrame::Text(Bytes::copy_from_slice(data)))
            .await?;
        Ok(())
    }

    async fn read(&mut self, max: usize) -> Result<Vec<u8>> {
        let max = max.max(1);
        if !self.backlog.is_empty() {
            return Ok(self.take_backlog(max));
        }

        loop {
            match self.framed.next().await {
                Some(Ok(ConsoleFrame::Text(text))) => {
                    self.backlog.extend_from_slice(&text);
                    return Ok(self.take_backlog(max));
                }
                // Pure negotiation is not end of stream
                Some(Ok(reply @ ConsoleFrame::Reply(_))) => self.framed.send(reply).await?,
                Some(Err(e)) => return Err(e.into()),
                None => {
                    debug!("telnet: connection closed by peer");
                    return Ok(Vec::new());
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        SinkExt::close(&mut self.framed).await?;
        Ok(())
    }
}
