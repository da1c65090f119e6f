//! JSON-lines input through the dispatcher to recorded commands.

use pretty_assertions::assert_eq;
use sdn_l2switchd::{
    jsonl, Action, Dispatcher, ForwardingEngine, L2SwitchError, RecordingChannel,
};
use sdn_types::{PortNo, SwitchId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn packet_in(switch: u64, in_port: u32, src: u8, dst: u8) -> String {
    let mut data = vec![0, 0, 0, 0, 0, dst, 0, 0, 0, 0, 0, src, 0x08, 0x00];
    data.extend_from_slice(&[0u8; 46]);
    serde_json::json!({
        "type": "packet_in",
        "datapath_id": switch,
        "in_port": in_port,
        "buffer_id": null,
        "data": data,
    })
    .to_string()
}

fn features(switch: u64) -> String {
    serde_json::json!({ "type": "switch_features", "datapath_id": switch }).to_string()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_switches_from_json_lines() {
    let input = [
        features(1),
        features(2),
        packet_in(1, 1, 0x01, 0x02),
        packet_in(2, 5, 0x01, 0x02),
        "garbage".to_string(),
        packet_in(1, 2, 0x02, 0x01),
        packet_in(2, 6, 0x02, 0x01),
    ]
    .join("\n");

    let engine = Arc::new(ForwardingEngine::default());
    let channel = Arc::new(RecordingChannel::new());
    let (tx, rx) = mpsc::channel(4);

    let dispatcher = tokio::spawn(
        Dispatcher::new(Arc::clone(&engine), channel.clone()).run(rx, CancellationToken::new()),
    );
    let forwarded = jsonl::read_events(input.as_bytes(), tx).await.unwrap();
    dispatcher.await.unwrap();

    assert_eq!(forwarded, 6);

    for (switch, first_port) in [(1u64, 1u32), (2, 5)] {
        let commands = channel.commands_for(SwitchId::new(switch));
        assert_eq!(commands.len(), 4, "switch {switch}");
        assert!(commands[0].as_install().is_some());
        assert_eq!(commands[1].as_emit().map(|p| p.action), Some(Action::Flood));
        assert_eq!(
            commands[2].as_install().map(|r| r.action),
            Some(Action::ForwardTo {
                port: PortNo::new(first_port).unwrap()
            })
        );
        assert!(commands[3].as_emit().is_some());
    }

    let stats = engine.stats();
    assert_eq!(stats.switches_connected, 2);
    assert_eq!(stats.frames_processed, 4);
    assert_eq!(stats.flows_installed, 2);
}

#[tokio::test]
async fn test_reader_failure_is_reported_after_dispatcher_drains() {
    let mut input = features(3).into_bytes();
    input.push(b'\n');
    input.extend_from_slice(packet_in(3, 1, 0x01, 0x02).as_bytes());
    input.extend_from_slice(b"\n\xc3\x28\n");

    let engine = Arc::new(ForwardingEngine::default());
    let channel = Arc::new(RecordingChannel::new());
    let (tx, rx) = mpsc::channel(4);
    let cancel = CancellationToken::new();

    let reader = tokio::spawn(async move { jsonl::read_events(input.as_slice(), tx).await });
    Dispatcher::new(Arc::clone(&engine), channel.clone())
        .run(rx, cancel.clone())
        .await;

    // The dispatcher stopped because the reader went away, not on cancel.
    assert!(!cancel.is_cancelled());
    let result = reader.await.unwrap();
    assert!(matches!(result, Err(L2SwitchError::Io(_))));

    // Events read before the failure were still handled.
    assert_eq!(channel.commands_for(SwitchId::new(3)).len(), 2);
    assert_eq!(engine.stats().frames_processed, 1);
}
