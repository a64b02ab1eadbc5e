//! Performance benchmarks for a3s-runner
//!
//! Run with: cargo bench

use a3s_runner::protocol::{ExecuteStepRequest, Parameter, ParameterType};
use a3s_runner::transport::{frame, FrameCodec};
use a3s_runner::{normalize, Message, MessageType};
use criterion::{criterion_group, criterion_main, Criterion};
use prost::Message as _;

fn sample_request() -> Message {
    Message {
        execute_step_request: Some(ExecuteStepRequest {
            actual_step_text: "Login as \"alice\" with password \"secret\"".into(),
            parsed_step_text: "Login as {} with password {}".into(),
            scenario_failing: false,
            parameters: ["alice", "secret"]
                .iter()
                .map(|v| Parameter {
                    parameter_type: ParameterType::Static as i32,
                    value: v.to_string(),
                    ..Default::default()
                })
                .collect(),
        }),
        ..Message::new(MessageType::ExecuteStep, 1)
    }
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize placeholders", |b| {
        b.iter(|| normalize("Login as <user> with password <password>").unwrap());
    });

    c.bench_function("normalize quoted", |b| {
        b.iter(|| normalize("Check \"10\" items in \"the \\\"big\\\" basket\"").unwrap());
    });
}

fn bench_frame(c: &mut Criterion) {
    let payload = sample_request().encode_to_vec();

    c.bench_function("frame encode", |b| {
        b.iter(|| frame::encode(&payload));
    });

    let encoded = frame::encode(&payload);
    c.bench_function("frame decode", |b| {
        b.iter(|| frame::decode(&encoded).unwrap().unwrap());
    });

    c.bench_function("envelope decode", |b| {
        b.iter(|| Message::decode(payload.as_slice()).unwrap());
    });
}

fn bench_codec_roundtrip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let payload = sample_request().encode_to_vec();

    c.bench_function("codec write+read over duplex", |b| {
        b.to_async(&rt).iter(|| async {
            let (host, runner) = tokio::io::duplex(64 * 1024);
            let (ar, aw) = tokio::io::split(host);
            let (br, bw) = tokio::io::split(runner);
            let mut left = FrameCodec::new(ar, aw);
            let mut right = FrameCodec::new(br, bw);
            left.write_frame(&payload).await.unwrap();
            right.read_frame().await.unwrap().unwrap()
        });
    });
}

criterion_group!(benches, bench_normalize, bench_frame, bench_codec_roundtrip);
criterion_main!(benches);
