/// SplitMix64 PRNG step for stable, fast mixing.
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// Domain tags (arbitrary but fixed)
const DOM_LO: u64 = 0x501_2C0A_0000_0001;
const DOM_HI: u64 = 0x501_2C0A_0000_00F0;

#[inline]
fn mix_into(acc_a: &mut u64, acc_b: &mut u64, data: u64) {
    let m1 = splitmix64(data ^ DOM_LO ^ acc_a.rotate_left(7));
    let m2 = splitmix64(m1 ^ DOM_HI);
    *acc_a ^= m1.rotate_left(17);
    *acc_b = acc_b.rotate_left(13) ^ m2;
}

/// Order-sensitive 128-bit digest of a byte encoding. Bytes are consumed in
/// 8-byte little-endian words; the length is mixed last so encodings that
/// differ only by trailing zeros stay distinct.
pub fn digest128(bytes: &[u8]) -> u128 {
    let mut a: u64 = 0xC0FF_EE00_D15E_CAFE;
    let mut b: u64 = 0xDEAD_BEEF_F00D_FACE;
    for chunk in bytes.chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        mix_into(&mut a, &mut b, u64::from_le_bytes(word));
    }
    mix_into(&mut a, &mut b, bytes.len() as u64);
    ((a as u128) << 64) | (b as u128)
}

/// Shard selector for sharded tables keyed by a 128-bit digest.
#[inline]
pub fn shard_of(key: u128, mask: usize) -> usize {
    (key as u64 as usize) & mask
}
