use datasource::{BufferSource, ByteSink, ByteSource, StreamSink, StreamSource, VecSink};

const SAMPLES: [u32; 10] = [
    0,
    1,
    0xff,
    0x100,
    0x7fff_ffff,
    0x8000_0000,
    0x0102_0304,
    0xdead_beef,
    0xffff_fffe,
    u32::MAX,
];

#[test]
fn u32_composition() {
    let data = [0x11, 0x22, 0x33, 0x44, 0x55];
    for start in 0..2 {
        let b = &data[start..];
        let mut src = BufferSource::new(b);
        let le = b[0] as u32 | (b[1] as u32) << 8 | (b[2] as u32) << 16 | (b[3] as u32) << 24;
        let be = (b[0] as u32) << 24 | (b[1] as u32) << 16 | (b[2] as u32) << 8 | b[3] as u32;
        assert_eq!(src.read_u32().unwrap(), le);
        src.seek(0).unwrap();
        assert_eq!(src.read_u32_be().unwrap(), be);
    }
}

#[test]
fn u24_top_byte_clear() {
    let data = [0xff; 8];
    let mut src = BufferSource::new(&data);
    while src.remaining().unwrap() >= 3 {
        let v = src.read_u24().unwrap();
        assert_eq!(v & 0xff00_0000, 0);
        assert_eq!(v, 0xff_ffff);
    }
}

#[test]
fn signed_24_bit() {
    let mut src = BufferSource::new(&[0xff, 0xff, 0x7f]);
    assert_eq!(src.read_sint(3).unwrap(), 0x7f_ffff);
    let mut src = BufferSource::new(&[0x00, 0x00, 0x80]);
    assert!(src.read_sint(3).unwrap() < 0);
    assert_eq!(src.position().unwrap(), 3);
}

#[test]
fn buffer_round_trip() {
    let mut sink = VecSink::new();
    for v in SAMPLES {
        sink.write_u32(v).unwrap();
        sink.write_u32_be(v).unwrap();
    }
    let bytes = sink.into_bytes();
    let mut src = BufferSource::new(&bytes);
    for v in SAMPLES {
        assert_eq!(src.read_u32().unwrap(), v);
        assert_eq!(src.read_u32_be().unwrap(), v);
    }
    assert!(src.is_at_end());
}

#[test]
fn stream_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("values.bin");

    let mut sink = StreamSink::create(&path).unwrap();
    for v in SAMPLES {
        sink.write_u32(v).unwrap();
    }
    sink.write_f32(-0.0).unwrap();
    sink.write_uint(3, 0x12_3456).unwrap();
    sink.finish().unwrap();

    let mut src = StreamSource::open(&path).unwrap();
    assert_eq!(src.size().unwrap(), SAMPLES.len() as u64 * 4 + 7);
    for (i, v) in SAMPLES.iter().enumerate().rev() {
        src.seek(i as u64 * 4).unwrap();
        assert_eq!(src.read_u32().unwrap(), *v);
    }
    src.seek(SAMPLES.len() as u64 * 4).unwrap();
    assert_eq!(src.read_f32().unwrap().to_bits(), (-0.0f32).to_bits());
    assert_eq!(src.read_uint(3).unwrap(), 0x12_3456);
    assert!(src.read_u8().is_err());
}

#[test]
fn seek_then_position() {
    let data: Vec<u8> = (0..32).collect();
    let mut src = BufferSource::new(&data);
    let size = src.size().unwrap();
    for p in (0..=size).rev() {
        src.seek(p).unwrap();
        assert_eq!(src.position().unwrap(), p);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seek.bin");
    std::fs::write(&path, &data).unwrap();
    let mut src = StreamSource::open(&path).unwrap();
    for p in 0..=size {
        src.seek(p).unwrap();
        assert_eq!(src.position().unwrap(), p);
    }
}

#[test]
fn stream_size_is_stable_and_restores_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("size.bin");
    std::fs::write(&path, [1u8, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();

    let mut src = StreamSource::open(&path).unwrap();
    let before = src.size().unwrap();
    assert_eq!(src.position().unwrap(), 0);

    src.read_u16().unwrap();
    assert_eq!(src.size().unwrap(), before);
    assert_eq!(src.position().unwrap(), 2);
    // The read after a size query must continue where it left off.
    assert_eq!(src.read_u8().unwrap(), 3);

    src.skip(3).unwrap();
    assert_eq!(src.size().unwrap(), 9);
    assert_eq!(src.position().unwrap(), 6);
    assert_eq!(src.read_u24().unwrap(), 0x09_0807);
}

#[test]
fn stream_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.bin");
    std::fs::write(&path, [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06]).unwrap();

    let mut src = StreamSource::open(&path).unwrap();
    assert_eq!(src.read_u16().unwrap(), 0x0201);
    assert_eq!(src.position().unwrap(), 2);
    src.skip(2).unwrap();
    assert_eq!(src.position().unwrap(), 4);
    assert_eq!(src.read_u16_be().unwrap(), 0x0506);
}

#[test]
fn open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = StreamSource::open(dir.path().join("missing.bin")).unwrap_err();
    assert!(matches!(err, datasource::Error::Open { .. }));
    assert!(err.to_string().contains("missing.bin"));
}

#[test]
fn generic_over_backends() {
    fn header<S: ByteSource + ?Sized>(src: &mut S) -> datasource::Result<(u16, u32)> {
        Ok((src.read_u16()?, src.read_uint(3)?))
    }

    let bytes = [0x34u8, 0x12, 0x01, 0x02, 0x03];
    let mut buf = BufferSource::new(&bytes);
    let mut stream = StreamSource::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let sources: [&mut dyn ByteSource; 2] = [&mut buf, &mut stream];
    for src in sources {
        assert_eq!(header(src).unwrap(), (0x1234, 0x030201));
    }
}
