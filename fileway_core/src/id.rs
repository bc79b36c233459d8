//! Unguessable opaque identifiers.
use rand::{rngs::OsRng, Rng};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Returns a string of `len` characters sampled uniformly from
/// `[A-Za-z0-9]`, drawn from the OS's cryptographic randomness source.
pub fn gen_random_string(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}
