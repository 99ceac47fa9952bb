use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Deterministic RNG for dealing game `seed`.
#[inline]
pub fn rng_for_deal(seed: u64) -> Pcg64 {
    Pcg64::seed_from_u64(seed)
}

/// Deterministic RNG for training scenario `index` of stage `hidden`.
///
/// The three inputs are folded with distinct multipliers so neighbouring
/// (hidden, index) pairs do not collide the way a plain xor would.
#[inline]
pub fn rng_for_scenario(seed: u64, hidden: u8, index: u64) -> Pcg64 {
    let derived = seed
        ^ (hidden as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ index.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    Pcg64::seed_from_u64(derived)
}
