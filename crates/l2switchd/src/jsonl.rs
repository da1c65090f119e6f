//! JSON-lines switch channel transport.
//!
//! Inbound messages, one per line:
//!
//! ```text
//! {"type":"switch_features","datapath_id":1}
//! {"type":"packet_in","datapath_id":1,"in_port":2,"buffer_id":null,"data":[255,255,...]}
//! ```
//!
//! Outbound commands are written one per line as the serialized [`Command`]
//! with the target `datapath_id` alongside.

use crate::commands::Command;
use crate::error::Result;
use crate::events::{BufferId, FrameArrived, SwitchConnected, SwitchEvent};
use sdn_types::{PortNo, SwitchId};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A message received from a switch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    SwitchFeatures {
        datapath_id: SwitchId,
    },
    PacketIn {
        datapath_id: SwitchId,
        in_port: PortNo,
        #[serde(default)]
        buffer_id: Option<BufferId>,
        #[serde(default)]
        data: Vec<u8>,
    },
}

impl InboundMessage {
    /// Converts the message into an engine event, decoding frame headers.
    pub fn into_event(self) -> Result<SwitchEvent> {
        match self {
            InboundMessage::SwitchFeatures { datapath_id } => Ok(SwitchConnected {
                switch_id: datapath_id,
            }
            .into()),
            InboundMessage::PacketIn {
                datapath_id,
                in_port,
                buffer_id,
                data,
            } => Ok(FrameArrived::from_packet_in(datapath_id, in_port, buffer_id, data)?.into()),
        }
    }
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    datapath_id: SwitchId,
    #[serde(flatten)]
    command: &'a Command,
}

/// Parses one inbound line into an event.
pub fn parse_line(line: &str) -> Result<SwitchEvent> {
    let message: InboundMessage = serde_json::from_str(line)?;
    message.into_event()
}

/// Serializes one outbound command, without the trailing newline.
pub fn encode_command(switch_id: SwitchId, command: &Command) -> Result<String> {
    let message = OutboundMessage {
        datapath_id: switch_id,
        command,
    };
    Ok(serde_json::to_string(&message)?)
}

/// Reads events from `reader` until EOF or until `tx` closes.
///
/// Malformed lines are logged and skipped. Returns the number of events
/// forwarded.
pub async fn read_events<R>(reader: R, tx: mpsc::Sender<SwitchEvent>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut forwarded = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match parse_line(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed message");
                continue;
            }
        };

        if tx.send(event).await.is_err() {
            debug!("Event consumer closed, stopping reader");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}

/// Writes every command received on `rx` to `writer`, one JSON object per
/// line, until all senders are dropped. Returns the number of lines written.
pub async fn write_commands<W>(
    mut rx: mpsc::UnboundedReceiver<(SwitchId, Command)>,
    mut writer: W,
) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0usize;

    while let Some((switch_id, command)) = rx.recv().await {
        let mut line = encode_command(switch_id, &command)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MpscChannel, RecordingChannel, SwitchChannel};
    use crate::commands::{Action, FlowRule, MatchSpec};
    use crate::engine::ForwardingEngine;
    use crate::error::{FrameDecodeError, L2SwitchError};
    use pretty_assertions::assert_eq;
    use sdn_types::MacAddress;

    fn packet_in_line(data: &[u8]) -> String {
        serde_json::json!({
            "type": "packet_in",
            "datapath_id": 1,
            "in_port": 2,
            "buffer_id": 42,
            "data": data,
        })
        .to_string()
    }

    fn frame_bytes() -> Vec<u8> {
        let mut frame = vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x02];
        frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
        frame.extend_from_slice(&[0x08, 0x00]);
        frame.extend_from_slice(&[0u8; 46]);
        frame
    }

    #[test]
    fn test_parse_switch_features() {
        let event = parse_line(r#"{"type":"switch_features","datapath_id":7}"#).unwrap();
        assert_eq!(
            event,
            SwitchEvent::Connected(SwitchConnected {
                switch_id: SwitchId::new(7)
            })
        );
    }

    #[test]
    fn test_parse_packet_in_decodes_addresses() {
        let event = parse_line(&packet_in_line(&frame_bytes())).unwrap();
        let SwitchEvent::FrameArrived(frame) = event else {
            panic!("expected a frame event");
        };

        assert_eq!(frame.switch_id, SwitchId::new(1));
        assert_eq!(frame.in_port, PortNo::new(2).unwrap());
        assert_eq!(frame.src, MacAddress::new([0, 0, 0, 0, 0, 1]));
        assert_eq!(frame.dst, MacAddress::new([0, 0, 0, 0, 0, 2]));
        assert_eq!(frame.buffer_id, Some(BufferId::new(42)));
        assert_eq!(frame.payload, frame_bytes());
    }

    #[test]
    fn test_parse_packet_in_without_buffer() {
        let line = format!(
            r#"{{"type":"packet_in","datapath_id":1,"in_port":3,"data":{:?}}}"#,
            frame_bytes()
        );
        let SwitchEvent::FrameArrived(frame) = parse_line(&line).unwrap() else {
            panic!("expected a frame event");
        };
        assert_eq!(frame.buffer_id, None);
    }

    #[test]
    fn test_parse_rejects_short_frame() {
        let err = parse_line(&packet_in_line(&[0u8; 10])).unwrap_err();
        assert!(matches!(
            err,
            L2SwitchError::FrameDecode(FrameDecodeError::Truncated { len: 10, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_reserved_port() {
        let line = format!(
            r#"{{"type":"packet_in","datapath_id":1,"in_port":4294967293,"data":{:?}}}"#,
            frame_bytes()
        );
        assert!(matches!(parse_line(&line), Err(L2SwitchError::Json(_))));
    }

    #[test]
    fn test_frame_from_local_port_is_learned_and_forwarded() {
        let engine = ForwardingEngine::default();
        let channel = RecordingChannel::new();

        // 00:..:01 -> 00:..:02 arrives on the switch's local interface.
        let line = format!(
            r#"{{"type":"packet_in","datapath_id":1,"in_port":4294967294,"data":{:?}}}"#,
            frame_bytes()
        );
        let event = parse_line(&line).unwrap();
        engine.handle(event, &channel);
        assert_eq!(
            engine.registry().lookup(SwitchId::new(1), &MacAddress::new([0, 0, 0, 0, 0, 1])),
            Some(PortNo::LOCAL)
        );

        // The reply is forwarded back out of the local interface.
        let mut reply = frame_bytes();
        reply[..6].copy_from_slice(&[0, 0, 0, 0, 0, 1]);
        reply[6..12].copy_from_slice(&[0, 0, 0, 0, 0, 2]);
        engine.handle(parse_line(&packet_in_line(&reply)).unwrap(), &channel);

        let commands = channel.commands_for(SwitchId::new(1));
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[1].as_install().map(|rule| rule.action),
            Some(Action::ForwardTo {
                port: PortNo::LOCAL
            })
        );
        assert_eq!(
            commands[2].as_emit().map(|packet| packet.action),
            Some(Action::ForwardTo {
                port: PortNo::LOCAL
            })
        );
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(parse_line(r#"{"type":"port_status","datapath_id":1}"#).is_err());
        assert!(parse_line("not json").is_err());
    }

    #[test]
    fn test_encode_command() {
        let command = Command::InstallRule(FlowRule {
            priority: 0,
            match_spec: MatchSpec::Wildcard,
            action: Action::SendToController { buffered: false },
            buffer_id: None,
        });

        let value: serde_json::Value =
            serde_json::from_str(&encode_command(SwitchId::new(5), &command).unwrap()).unwrap();

        assert_eq!(value["datapath_id"], 5);
        assert_eq!(value["type"], "install_rule");
        assert_eq!(value["priority"], 0);
        assert_eq!(value["match_spec"]["kind"], "wildcard");
        assert_eq!(value["action"]["kind"], "send_to_controller");
    }

    #[tokio::test]
    async fn test_read_events_skips_bad_lines() {
        let input = format!(
            "{}\n\nnot json\n{}\n",
            r#"{"type":"switch_features","datapath_id":1}"#,
            packet_in_line(&frame_bytes())
        );
        let (tx, mut rx) = mpsc::channel(8);

        let forwarded = read_events(input.as_bytes(), tx).await.unwrap();

        assert_eq!(forwarded, 2);
        assert!(matches!(rx.recv().await, Some(SwitchEvent::Connected(_))));
        assert!(matches!(rx.recv().await, Some(SwitchEvent::FrameArrived(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_read_events_fails_on_invalid_utf8() {
        let mut input = br#"{"type":"switch_features","datapath_id":1}"#.to_vec();
        input.extend_from_slice(b"\n\xff\xfe\n");
        let (tx, mut rx) = mpsc::channel(8);

        let err = read_events(input.as_slice(), tx).await.unwrap_err();

        assert!(matches!(err, L2SwitchError::Io(_)));
        assert!(matches!(rx.recv().await, Some(SwitchEvent::Connected(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_write_commands_one_per_line() {
        let (channel, rx) = MpscChannel::new();
        let command = Command::InstallRule(FlowRule {
            priority: 0,
            match_spec: MatchSpec::Wildcard,
            action: Action::SendToController { buffered: false },
            buffer_id: None,
        });
        channel.send(SwitchId::new(1), command.clone());
        channel.send(SwitchId::new(2), command);
        drop(channel);

        let mut out = Vec::new();
        let written = write_commands(rx, &mut out).await.unwrap();

        assert_eq!(written, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""datapath_id":1"#));
        assert!(lines[1].contains(r#""datapath_id":2"#));
    }
}
