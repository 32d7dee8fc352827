#![no_main]
use libfuzzer_sys::fuzz_target;
use snapdelta::delta::BlockSizes;
use snapdelta::frame::Frame;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let offset = u32::from(data[0] % 32) + 1;
    let value = u32::from(data[1] % 64) + 1;
    let checksum = data[2] & 1 != 0;
    let sizes = BlockSizes::new(offset, value).unwrap();

    // Interleave: even 4-byte chunks are baseline words, odd ones current.
    let words: Vec<i32> = data[3..]
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let half = words.len() / 2;
    let baseline = &words[..half];
    let current = &words[half..half * 2];

    let (frame, stats) = Frame::pack(current, baseline, sizes, checksum).unwrap();
    let mut encoded = Vec::new();
    frame.encode(&mut encoded).unwrap();
    assert_eq!(encoded.len(), frame.encoded_len());

    let decoded = Frame::decode(&mut encoded.as_slice()).unwrap();
    assert_eq!(decoded.payload.bit_len(), stats.bits);
    assert_eq!(decoded.unpack(baseline).unwrap(), current);
});
