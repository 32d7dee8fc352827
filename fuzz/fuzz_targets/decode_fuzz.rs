#![no_main]
use libfuzzer_sys::fuzz_target;
use snapdelta::delta::{self, BlockSizes};
use snapdelta::frame::Frame;

fuzz_target!(|data: &[u8]| {
    // Framed input: header parsing and payload decoding must only return errors.
    if let Ok(frame) = Frame::decode(&mut &data[..]) {
        let baseline = vec![0; frame.word_count.min(1 << 16) as usize];
        let _ = frame.unpack(&baseline);
    }

    // Raw stream: first byte picks block sizes and snapshot length.
    if data.len() < 2 {
        return;
    }
    let offset = u32::from(data[0] % 32) + 1;
    let value = u32::from(data[1] % 64) + 1;
    let Ok(sizes) = BlockSizes::new(offset, value) else {
        return;
    };
    let words: Vec<u64> = data[2..]
        .chunks(8)
        .map(|c| {
            let mut w = [0u8; 8];
            w[..c.len()].copy_from_slice(c);
            u64::from_le_bytes(w)
        })
        .collect();
    let bit_count = (data.len() as u64 - 2) * 8;
    let len = usize::from(data[0]) * 4;
    let baseline = vec![0; len];
    let mut target = vec![0; len];
    let _ = delta::unpack(&mut target, &baseline, bit_count, &words, sizes);
    let _ = delta::pairs(&words, bit_count, sizes);
});
