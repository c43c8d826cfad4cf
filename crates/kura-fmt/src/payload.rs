//! Name-keyed payload transforms.
//!
//! Some archives store selected payloads encrypted with their own rolling
//! cipher. Which cipher applies is decided by the entry name alone.

use kura_common::{RawFile, StreamCipher};

/// Decrypt payloads whose name contains `pattern`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadRule {
    /// Substring of the entry name that selects this rule.
    pub pattern: &'static str,
    /// Cipher the payload is decrypted with.
    pub cipher: StreamCipher,
    /// Extension given to the decrypted file.
    pub extension: Option<&'static str>,
}

impl PayloadRule {
    /// Create a rule.
    pub const fn new(
        pattern: &'static str,
        cipher: StreamCipher,
        extension: Option<&'static str>,
    ) -> Self {
        Self {
            pattern,
            cipher,
            extension,
        }
    }

    /// Check if the rule applies to `name`.
    #[inline]
    pub fn matches(&self, name: &str) -> bool {
        name.contains(self.pattern)
    }
}

/// Apply the first rule matching the file name, if any.
///
/// Returns `true` when a rule was applied.
pub fn apply_payload_rules(file: &mut RawFile, rules: &[PayloadRule]) -> bool {
    let Some(rule) = rules.iter().find(|rule| rule.matches(&file.name)) else {
        return false;
    };

    log::debug!("{}: decrypting payload ({})", file.name, rule.pattern);
    rule.cipher.apply(&mut file.data);
    if let Some(extension) = rule.extension {
        file.change_extension(extension);
    }
    true
}
