//! Integration benchmark for the acquisition session.
//!
//! Feeds raw records through `run_session` with a fake source and a fake
//! transport, the same way the session tests do.

use beacon_forwarder::{
    CaptureError, Decoder, DecoderPolicy, Encoding, Pipeline, SessionState, Source, Transport,
    TransportError, run_session,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

const PEBBLEBEE_LINE: &str = "> 04 3E 20 02 01 00 00 07 08 09 0A 0B 0C 14 02 01 06 03 19 \
                              00 02 02 0A 06 09 FF 0E 00 01 02 03 04 00 55 B5";

const URIBEACON_LINE: &str = "> 04 3E 1E 02 01 00 00 E3 E3 03 5B 02 00 12 03 03 D8 FE 0D \
                              16 D8 FE 00 14 02 63 73 72 2E 63 6F 6D A7";

/// Replays a fixed list of raw records.
struct FakeSource {
    records: Vec<String>,
}

impl FakeSource {
    fn new(records: Vec<String>) -> Self {
        Self { records }
    }
}

impl Source for FakeSource {
    fn start(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<mpsc::Receiver<String>, CaptureError>> + Send + '_>>
    {
        let records = self.records.clone();
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(records.len().max(1));
            tokio::spawn(async move {
                for record in records {
                    let _ = tx.send(record).await;
                }
            });
            Ok(rx)
        })
    }
}

/// Counts sent bytes instead of touching the network.
#[derive(Default)]
struct CountingTransport {
    bytes: AtomicUsize,
}

impl Transport for CountingTransport {
    fn send<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>> {
        Box::pin(async move {
            self.bytes.fetch_add(payload.len(), Ordering::Relaxed);
            Ok(())
        })
    }
}

fn pipeline(encoding: Encoding) -> Pipeline {
    Pipeline::new(
        Decoder::new(DecoderPolicy::default()),
        encoding.encoder(),
        "bench".to_string(),
    )
}

fn run(rt: &Runtime, pipeline: &Pipeline, records: Vec<String>) -> SessionState {
    let source = FakeSource::new(records);
    let transport = CountingTransport::default();
    let mut state = SessionState::new(None);
    rt.block_on(async {
        run_session(pipeline, &source, &transport, &mut state)
            .await
            .unwrap();
    });
    state
}

/// Mixed Pebblebee and UriBeacon batches through the whole session loop
fn bench_session_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_batches");
    let rt = Runtime::new().unwrap();

    for encoding in [Encoding::Envelope, Encoding::Json] {
        let pipeline = pipeline(encoding);
        for batch_size in [1, 10, 100] {
            let records: Vec<String> = (0..batch_size)
                .map(|i| {
                    if i % 2 == 0 { PEBBLEBEE_LINE } else { URIBEACON_LINE }.to_string()
                })
                .collect();

            group.throughput(Throughput::Elements(batch_size as u64));
            group.bench_with_input(
                BenchmarkId::new(encoding.to_string(), batch_size),
                &records,
                |b, records| b.iter(|| black_box(run(&rt, &pipeline, records.clone()))),
            );
        }
    }

    group.finish();
}

/// Mostly undecodable input, the realistic case next to busy non-beacon traffic
fn bench_unknown_traffic(c: &mut Criterion) {
    let mut group = c.benchmark_group("unknown_traffic");
    let rt = Runtime::new().unwrap();
    let pipeline = pipeline(Encoding::Envelope);

    let records: Vec<String> = (0..100)
        .map(|i| {
            if i % 10 == 0 {
                PEBBLEBEE_LINE.to_string()
            } else {
                "> 04 3E 0C 02 01 04 00 AA BB CC DD EE FF 00 C0".to_string()
            }
        })
        .collect();

    group.throughput(Throughput::Elements(100));
    group.bench_function("100_mostly_unknown", |b| {
        b.iter(|| {
            let state = run(&rt, &pipeline, records.clone());
            debug_assert_eq!(state.forwarded, 10);
            black_box(state)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_session_batches, bench_unknown_traffic);
criterion_main!(benches);
