//! End-to-end routing scenarios over the built-in sinks.

use std::io::Read;
use std::thread;

use anyhow::Result;
use chanswitch::core::{
    MemorySink, QueueItem, QueueSink, SinkEvent, WriterSink,
};
use chanswitch::{ChannelId, ChannelSwitch, FlushStatus, Outcome, Propagation, Sink};
use chanswitch_testkit::SinkBank;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn ch(name: &str) -> ChannelId {
    ChannelId::from(name)
}

#[test]
fn specific_routes_shadow_defaults() -> Result<()> {
    init_tracing();
    let bank = SinkBank::new(3);
    let switch = ChannelSwitch::new();
    switch.add_route("A", bank.sink(0), "x")?;
    switch.add_route("A", bank.sink(1), "x")?;
    switch.add_default_route_on(bank.sink(2), "catch")?;

    switch.put(&ch("A"), b"to-a", true, false)?;
    switch.put(&ch("B"), b"to-b", true, false)?;

    assert_eq!(bank.sink(0).data(&ch("x")), b"to-a");
    assert_eq!(bank.sink(1).data(&ch("x")), b"to-a");
    assert_eq!(bank.sink(2).data(&ch("catch")), b"to-b");
    assert_eq!(bank.sink(2).data(&ch("x")), b"");
    Ok(())
}

#[test]
fn same_sink_on_two_channels_gets_both() -> Result<()> {
    let sink = MemorySink::new();
    let switch = ChannelSwitch::new();
    switch.add_route("in", &sink, "left")?;
    switch.add_route("in", &sink, "right")?;

    switch.put(&ch("in"), b"dup", false, false)?;

    assert_eq!(
        sink.events(),
        vec![
            SinkEvent::Data {
                channel: ch("left"),
                bytes: b"dup".to_vec()
            },
            SinkEvent::Data {
                channel: ch("right"),
                bytes: b"dup".to_vec()
            },
        ]
    );
    Ok(())
}

#[test]
fn chained_switches_forward_signals_unchanged() -> Result<()> {
    init_tracing();
    let leaf = MemorySink::new();
    let inner = ChannelSwitch::new();
    inner.add_route("mid", &leaf, "leaf")?;

    let outer = ChannelSwitch::new();
    outer.add_route("top", &inner, "mid")?;

    outer.put(&ch("top"), b"deep", false, false)?;
    outer.message_end(&ch("top"), Propagation::depth(1), false)?;
    outer.message_series_end(&ch("top"), Propagation::LOCAL, false)?;
    let status = outer.flush(&ch("top"), false, Propagation::UNLIMITED, false)?;
    assert_eq!(status, FlushStatus::AllClean);

    assert_eq!(
        leaf.events(),
        vec![
            SinkEvent::Data {
                channel: ch("leaf"),
                bytes: b"deep".to_vec()
            },
            SinkEvent::MessageEnd {
                channel: ch("leaf"),
                propagation: Propagation::depth(1)
            },
            SinkEvent::SeriesEnd {
                channel: ch("leaf"),
                propagation: Propagation::LOCAL
            },
            SinkEvent::Flush {
                channel: ch("leaf"),
                complete: false,
                propagation: Propagation::UNLIMITED
            },
        ]
    );
    Ok(())
}

#[test]
fn chained_switch_backpressure_resumes() -> Result<()> {
    let leaf = MemorySink::with_credit(2);
    let inner = ChannelSwitch::with_default_route(&leaf)?;
    let outer = ChannelSwitch::with_default_route(&inner)?;

    let outcome = outer.put(&ch("a"), b"abcd", false, false)?;
    assert!(outcome.is_blocked());
    assert_eq!(inner.pending_channels(), vec![ChannelId::DEFAULT]);

    leaf.unlimit();
    assert_eq!(outer.put(&ch("a"), b"abcd", false, false)?, Outcome::Delivered);
    assert_eq!(leaf.data(&ChannelId::DEFAULT), b"abcd");
    assert!(!inner.is_blocked());
    Ok(())
}

#[test]
fn chained_switch_reports_downstream_errors() -> Result<()> {
    let queue = QueueSink::new(8);
    queue.close();
    let inner = ChannelSwitch::with_default_route(&queue)?;
    let outer = ChannelSwitch::with_default_route(&inner)?;

    let err = outer.put(&ch("a"), b"x", false, false).unwrap_err();
    assert!(matches!(err, chanswitch::SwitchError::Sink { destination: 0, .. }));
    Ok(())
}

#[test]
fn writer_sink_into_file() -> Result<()> {
    let file = tempfile::NamedTempFile::new()?;
    let writer = WriterSink::new(file.reopen()?).with_message_delimiter(b"\n".to_vec());
    let switch = ChannelSwitch::with_default_route(&writer)?;

    switch.put(&ch("log"), b"first", true, true)?;
    switch.put(&ch("log"), b"second", true, true)?;
    assert!(switch
        .message_series_end(&ch("log"), Propagation::UNLIMITED, true)?
        .is_delivered());

    let mut contents = String::new();
    file.reopen()?.read_to_string(&mut contents)?;
    assert_eq!(contents, "first\nsecond\n");
    Ok(())
}

#[test]
fn blocking_put_waits_for_consumer() -> Result<()> {
    init_tracing();
    let fast = MemorySink::new();
    let queue = QueueSink::new(1).with_chunk_size(2);
    let switch = ChannelSwitch::new();
    switch.add_default_route(&queue)?;
    switch.add_default_route(&fast)?;

    let received = thread::scope(|scope| -> Result<Vec<u8>> {
        let consumer = scope.spawn(|| {
            let mut bytes = Vec::new();
            while let Some(item) = queue.recv_blocking() {
                match item {
                    QueueItem::Data { bytes: chunk, .. } => bytes.extend(chunk),
                    QueueItem::MessageEnd { .. } => break,
                    QueueItem::SeriesEnd { .. } => {}
                }
            }
            bytes
        });

        let outcome = switch.put(&ch("in"), b"blocking fan-out", true, true)?;
        assert_eq!(outcome, Outcome::Delivered);
        consumer
            .join()
            .map_err(|_| anyhow::anyhow!("consumer panicked"))
    })?;

    assert_eq!(received, b"blocking fan-out");
    assert_eq!(fast.data(&ChannelId::DEFAULT), b"blocking fan-out");
    Ok(())
}

#[test]
fn non_blocking_put_into_full_queue_resumes() -> Result<()> {
    let queue = QueueSink::new(2).with_chunk_size(2);
    let switch = ChannelSwitch::with_default_route(&queue)?;

    let Outcome::Blocked(state) = switch.put(&ch("in"), b"abcdefgh", false, false)? else {
        anyhow::bail!("expected the queue to push back");
    };
    assert_eq!(state.offset, 4);

    queue.drain();
    assert!(switch.put(&ch("in"), b"abcdefgh", false, false)?.is_delivered());
    let tail: Vec<u8> = queue
        .drain()
        .into_iter()
        .flat_map(|item| match item {
            QueueItem::Data { bytes, .. } => bytes,
            _ => Vec::new(),
        })
        .collect();
    assert_eq!(tail, b"efgh");
    Ok(())
}

#[test]
fn put_space_from_sole_destination() -> Result<()> {
    let sink = MemorySink::new();
    let switch = ChannelSwitch::with_default_route(&sink)?;

    let mut buf = switch.create_put_space(&ch("a"), 32)?;
    buf.extend_from_slice(b"filled in place");
    switch.put(&ch("a"), &buf, false, false)?;
    assert_eq!(sink.data(&ChannelId::DEFAULT), b"filled in place");

    let via_trait = Sink::reserve_space(&switch, &ch("a"), 8);
    assert!(via_trait.capacity() >= 8);
    Ok(())
}
