//! Random password generation.
//!
//! Draws characters uniformly from the enabled classes, guarantees at
//! least one character of every enabled class, then shuffles so the
//! guaranteed characters do not sit at predictable positions.  All
//! randomness comes from the OS RNG.

use rand::rngs::OsRng;
use rand::Rng;

use crate::errors::{Result, VaultError};

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()";

/// Character classes to draw from.  Lowercase letters are always
/// included.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorOptions {
    pub uppercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            uppercase: true,
            digits: true,
            symbols: true,
        }
    }
}

/// Generate a random password of `len` characters.
///
/// `len` must be at least the number of enabled classes so every class
/// can be represented.
pub fn generate(len: usize, options: &GeneratorOptions) -> Result<String> {
    let mut classes: Vec<&[u8]> = vec![LOWER];
    if options.uppercase {
        classes.push(UPPER);
    }
    if options.digits {
        classes.push(DIGITS);
    }
    if options.symbols {
        classes.push(SYMBOLS);
    }

    if len < classes.len() {
        return Err(VaultError::Generator(format!(
            "length {len} is too short for {} required character classes",
            classes.len()
        )));
    }

    let pool: Vec<u8> = classes.concat();
    let mut rng = OsRng;
    let mut password = Vec::with_capacity(len);

    // One guaranteed character per enabled class.
    for class in &classes {
        password.push(class[rng.gen_range(0..class.len())]);
    }

    // Fill the rest from the combined pool.
    while password.len() < len {
        password.push(pool[rng.gen_range(0..pool.len())]);
    }

    // Fisher-Yates shuffle.
    for i in (1..password.len()).rev() {
        let j = rng.gen_range(0..=i);
        password.swap(i, j);
    }

    String::from_utf8(password).map_err(|e| VaultError::Generator(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_length() {
        let pw = generate(24, &GeneratorOptions::default()).unwrap();
        assert_eq!(pw.len(), 24);
    }

    #[test]
    fn every_enabled_class_is_present() {
        let options = GeneratorOptions::default();
        for _ in 0..20 {
            let pw = generate(8, &options).unwrap();
            assert!(pw.bytes().any(|b| b.is_ascii_lowercase()));
            assert!(pw.bytes().any(|b| b.is_ascii_uppercase()));
            assert!(pw.bytes().any(|b| b.is_ascii_digit()));
            assert!(pw.bytes().any(|b| SYMBOLS.contains(&b)));
        }
    }

    #[test]
    fn lowercase_only_when_all_classes_disabled() {
        let options = GeneratorOptions {
            uppercase: false,
            digits: false,
            symbols: false,
        };
        let pw = generate(16, &options).unwrap();
        assert!(pw.bytes().all(|b| b.is_ascii_lowercase()));
    }

    #[test]
    fn too_short_length_is_rejected() {
        let result = generate(2, &GeneratorOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn successive_passwords_differ() {
        let options = GeneratorOptions::default();
        let a = generate(32, &options).unwrap();
        let b = generate(32, &options).unwrap();
        assert_ne!(a, b);
    }
}
