//! Rolling-key XOR stream cipher.
//!
//! Several engines obscure their file tables and script payloads by XORing
//! every byte with a key that grows by an increment which itself grows by a
//! fixed delta. The key sequence depends only on the byte position and the
//! three starting values, so one pass encrypts and the same pass decrypts.

/// Starting parameters of a rolling-key transform.
///
/// All arithmetic wraps modulo 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamCipher {
    /// Key XORed with the first byte.
    pub key: u8,
    /// Amount added to the key after each byte.
    pub increment: u8,
    /// Amount added to the increment after each byte.
    pub delta: u8,
}

impl StreamCipher {
    /// Create a cipher from its starting parameters.
    #[inline]
    pub const fn new(key: u8, increment: u8, delta: u8) -> Self {
        Self {
            key,
            increment,
            delta,
        }
    }

    /// Transform `buffer` in place, starting from this cipher's parameters.
    ///
    /// `self` is not modified, so the same value can be applied to any number
    /// of buffers.
    pub fn apply(&self, buffer: &mut [u8]) {
        let mut key = self.key;
        let mut increment = self.increment;
        for byte in buffer.iter_mut() {
            *byte ^= key;
            key = key.wrapping_add(increment);
            increment = increment.wrapping_add(self.delta);
        }
    }

    /// Transform a copy of `data`.
    pub fn applied(&self, data: &[u8]) -> Vec<u8> {
        let mut buffer = data.to_vec();
        self.apply(&mut buffer);
        buffer
    }
}

/// Transform `buffer` in place with the given starting parameters.
#[inline]
pub fn transform(buffer: &mut [u8], key: u8, increment: u8, delta: u8) {
    StreamCipher::new(key, increment, delta).apply(buffer);
}
