//! Random string generation.

use rand::Rng;

/// Symbols drawn by [`random_string`]: the URL-safe base64 alphabet, which is
/// also safe in file names on every mainstream filesystem.
pub const RANDOM_ALPHABET: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-";

/// Return `n` characters sampled uniformly from [`RANDOM_ALPHABET`].
///
/// Uses the thread-local CSPRNG.
pub fn random_string(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| RANDOM_ALPHABET[rng.gen_range(0..RANDOM_ALPHABET.len())] as char)
        .collect()
}
