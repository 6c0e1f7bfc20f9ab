use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sc3dmc_core::{decode_mesh, EncodeParams, EncoderBuffer, IndexedFaceSet, Sc3dmcEncoder, StreamType};

fn wavy_grid(n: u32) -> IndexedFaceSet {
    let mut mesh = IndexedFaceSet::new();
    for r in 0..n {
        for c in 0..n {
            let (x, y) = (c as f32 * 0.1, r as f32 * 0.1);
            mesh.add_coord([x, y, (x * 3.0).sin() * (y * 2.0).cos()]).unwrap();
            mesh.add_normal([0.0, 0.0, 1.0]).unwrap();
            mesh.add_color([c as f32 / n as f32, r as f32 / n as f32, 0.5]).unwrap();
        }
    }
    let at = |r: u32, c: u32| r * n + c;
    for r in 0..n - 1 {
        for c in 0..n - 1 {
            mesh.add_triangle([at(r, c), at(r + 1, c), at(r, c + 1)]).unwrap();
            mesh.add_triangle([at(r, c + 1), at(r + 1, c), at(r + 1, c + 1)]).unwrap();
        }
    }
    mesh
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("sc3dmc");
    for n in [32u32, 128] {
        let mesh = wavy_grid(n);
        group.throughput(Throughput::Elements(mesh.num_triangles() as u64));

        for stream_type in [StreamType::Binary, StreamType::Ascii] {
            let params = EncodeParams::new().with_stream_type(stream_type);
            let mut encoder = Sc3dmcEncoder::new();
            let label = format!("{}/{}", stream_type, n);

            group.bench_with_input(BenchmarkId::new("encode", &label), &mesh, |b, mesh| {
                b.iter(|| {
                    let mut buffer = EncoderBuffer::new();
                    encoder.encode(&params, black_box(mesh), &mut buffer).unwrap();
                    buffer
                })
            });

            let mut buffer = EncoderBuffer::new();
            encoder.encode(&params, &mesh, &mut buffer).unwrap();
            group.bench_with_input(BenchmarkId::new("decode", &label), buffer.data(), |b, data| {
                b.iter(|| decode_mesh(black_box(data), stream_type).unwrap())
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
