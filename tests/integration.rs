//! Integration tests for analog-stream.
//!
//! These tests drive the device side and host side together.

use std::time::Duration;

use analog_stream::acquisition::{
    period_for_rate, AcquisitionConfig, AcquisitionSession, AnalogInput, FrameEncoder,
    MonotonicClock, TickScheduler,
};
use analog_stream::consumer::CollectingConsumer;
use analog_stream::protocol::{
    build_frame, decode_payload, FrameBuffer, DEFAULT_MARKER, HEADER_SIZE, MAX_FRAME_SAMPLES,
};
use analog_stream::reader::{FrameReader, ReaderConfig};
use analog_stream::{Receiver, SampleHistory, StreamError};
use tokio::io::AsyncWriteExt;

/// Clock that moves forward by a repeating jitter pattern per read.
struct JitterClock {
    now: u32,
    steps: Vec<u32>,
    index: usize,
}

impl MonotonicClock for JitterClock {
    fn now_us(&mut self) -> u32 {
        let value = self.now;
        self.now = self.now.wrapping_add(self.steps[self.index % self.steps.len()]);
        self.index += 1;
        value
    }
}

/// Unsigned readings 0, 1, 2, ... wrapping at 16 bits.
struct Counter(u16);

impl AnalogInput for Counter {
    type Error = std::convert::Infallible;

    fn read_u16(&mut self) -> Result<u16, Self::Error> {
        let value = self.0;
        self.0 = self.0.wrapping_add(1);
        Ok(value)
    }
}

/// Input that fails after a fixed number of reads.
struct FailsAfter(u32);

impl AnalogInput for FailsAfter {
    type Error = &'static str;

    fn read_u16(&mut self) -> Result<u16, Self::Error> {
        if self.0 == 0 {
            return Err("adc not ready");
        }
        self.0 -= 1;
        Ok(32_768)
    }
}

/// Test that deadlines stay on the period grid under jittered polling.
#[test]
fn test_deadlines_span_n_periods_under_jitter() {
    let period = period_for_rate(5_000).unwrap();
    assert_eq!(period, 200);

    let mut scheduler = TickScheduler::new(period, 1_000);
    let mut clock = JitterClock {
        now: 1_000,
        steps: vec![3, 17, 41, 5, 90],
        index: 0,
    };

    while scheduler.ticks() < 1_000 {
        scheduler.poll(clock.now_us());
    }

    assert_eq!(scheduler.next_deadline(), 1_000 + 1_000 * 200);
}

/// Test that scheduling is correct across the 32-bit counter wrap.
#[test]
fn test_schedule_across_wraparound() {
    let start = u32::MAX - 250;
    let mut scheduler = TickScheduler::new(200, start);

    assert!(scheduler.poll(start));
    assert!(!scheduler.poll(start.wrapping_add(199)));
    assert!(scheduler.poll(start.wrapping_add(200)));
    // Deadline is now past the wrap.
    assert!(scheduler.next_deadline() < 1_000);
    assert!(!scheduler.poll(u32::MAX));
    assert!(scheduler.poll(start.wrapping_add(400)));
    assert_eq!(scheduler.ticks(), 3);
}

/// Test the exact bytes of the first frame at 5000 Hz with a ramp input.
#[test]
fn test_reference_frame_bytes() {
    let mut encoder = FrameEncoder::new(DEFAULT_MARKER, MAX_FRAME_SAMPLES).unwrap();
    let mut frame = None;
    for i in 0..512i16 {
        if let Some(bytes) = encoder.observe(i) {
            frame = Some(bytes.to_vec());
        }
    }
    let frame = frame.unwrap();

    assert_eq!(frame.len(), 1_028);
    assert_eq!(&frame[..8], &[0xAA, 0x55, 0x00, 0x02, 0x00, 0x00, 0x01, 0x00]);
    assert_eq!(&frame[1_026..], &[0xFF, 0x01]);
}

/// Test round trip from encoder to decoder across frame sizes.
#[test]
fn test_encode_decode_round_trip_all_sizes() {
    for k in [1u16, 2, 7, 255, 256, 511, 512] {
        let samples: Vec<i16> = (0..k).map(|i| (i as i16).wrapping_mul(-97)).collect();
        let mut encoder = FrameEncoder::new(DEFAULT_MARKER, k).unwrap();
        let mut bytes = Vec::new();
        for &s in &samples {
            if let Some(frame) = encoder.observe(s) {
                bytes = frame.to_vec();
            }
        }

        let decoded = decode_payload(k, &bytes[HEADER_SIZE..]).unwrap();
        assert_eq!(decoded.samples(), &samples[..], "k = {}", k);
    }
}

/// Test that leading noise is skipped and the frame recovered.
#[test]
fn test_noise_then_frame() {
    let mut stream = vec![0x00, 0xAA, 0x13, 0x55, 0xFF, 0xAA, 0xAA];
    stream.extend(build_frame(DEFAULT_MARKER, &[10, -10, 20]));

    let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
    let frames = buffer.push(&stream);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].samples(), &[10, -10, 20]);
    assert!(buffer.stats().discarded_bytes > 0);
}

/// Test that marker bytes inside a payload do not resynchronize mid-frame.
#[test]
fn test_marker_inside_payload() {
    // 0x55AA little-endian is AA 55 on the wire.
    let tricky = [0x55AAu16 as i16, 0x55AAu16 as i16, 3];
    let mut stream = build_frame(DEFAULT_MARKER, &tricky);
    stream.extend(build_frame(DEFAULT_MARKER, &[4]));

    let mut buffer = FrameBuffer::new(DEFAULT_MARKER);
    let frames = buffer.push(&stream);

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].samples(), &tricky);
    assert_eq!(frames[1].samples(), &[4]);
    assert_eq!(buffer.stats().discarded_bytes, 0);
}

/// Test truncated frame, silent gap, then a full frame.
#[tokio::test(start_paused = true)]
async fn test_truncated_frame_gap_then_frame() {
    let (mut tx, rx) = tokio::io::duplex(4_096);
    let config = ReaderConfig {
        read_timeout: Duration::from_millis(100),
        ..ReaderConfig::default()
    };
    let mut reader = FrameReader::with_config(rx, DEFAULT_MARKER, config);

    let full: Vec<i16> = (0..512).collect();
    let first = build_frame(DEFAULT_MARKER, &full);
    tx.write_all(&first[..first.len() - 1]).await.unwrap();

    match reader.read_frame().await {
        Err(StreamError::ShortPayload { expected, received }) => {
            assert_eq!(expected, 1_024);
            assert_eq!(received, 1_023);
        }
        other => panic!("expected short payload, got {:?}", other.map(|f| f.len())),
    }

    tx.write_all(&build_frame(DEFAULT_MARKER, &full)).await.unwrap();
    let frame = reader.read_frame().await.unwrap();
    assert_eq!(frame.samples(), &full[..]);
    assert_eq!(reader.stats().dropped_frames, 1);
    assert_eq!(reader.stats().frames, 1);
}

/// Test that the history keeps the newest samples in arrival order.
#[test]
fn test_history_window_keeps_latest() {
    let mut history = SampleHistory::new(1_000, 200);
    let all: Vec<i16> = (0..2_560).map(|i| i as i16).collect();
    for chunk in all.chunks(512) {
        history.extend(chunk);
    }

    assert_eq!(history.snapshot(), &all[1_560..]);
    assert_eq!(history.duration(), Duration::from_secs(5));
}

/// Test the device session feeding a host receiver end to end.
#[tokio::test]
async fn test_session_to_receiver() {
    let config = AcquisitionConfig {
        sample_rate_hz: 5_000,
        frame_samples: 128,
        marker: DEFAULT_MARKER,
    };
    let clock = JitterClock {
        now: u32::MAX - 10_000,
        steps: vec![50, 70, 30],
        index: 0,
    };
    let mut session = AcquisitionSession::new(clock, Counter(32_768), Vec::new(), config).unwrap();
    session.run_frames(4).unwrap();
    let mut bytes = session.into_sink();

    // Line noise ahead of the stream and a torn frame at the end.
    let mut stream = vec![0x55, 0xAA, 0x00];
    stream.append(&mut bytes);
    stream.extend(&build_frame(DEFAULT_MARKER, &[1, 2, 3])[..7]);

    let receiver = Receiver::builder()
        .sample_rate(5_000)
        .window_seconds(0.05)
        .start(std::io::Cursor::new(stream), CollectingConsumer::new())
        .unwrap();
    let history = receiver.history();
    let (stats, consumer) = receiver.wait().await.unwrap();

    let expected: Vec<i16> = (0..512).collect();
    assert_eq!(consumer.samples(), &expected[..]);
    assert_eq!(consumer.frames(), 4);
    assert_eq!(stats.frames, 4);
    assert_eq!(stats.dropped_frames, 1);

    // 0.05 s at 5000 Hz is 250 samples.
    assert_eq!(history.snapshot(), &expected[262..]);
}

/// Test that an input fault stops the session.
#[test]
fn test_input_fault_ends_session() {
    let clock = JitterClock {
        now: 0,
        steps: vec![200],
        index: 0,
    };
    let config = AcquisitionConfig {
        sample_rate_hz: 5_000,
        frame_samples: 4,
        marker: DEFAULT_MARKER,
    };
    let mut session = AcquisitionSession::new(clock, FailsAfter(6), Vec::new(), config).unwrap();

    let err = session.run_frames(3).unwrap_err();
    assert!(matches!(err, StreamError::AcquisitionFault(_)));
    assert_eq!(session.frames_written(), 1);
    assert_eq!(session.sink().len(), HEADER_SIZE + 8);
}
