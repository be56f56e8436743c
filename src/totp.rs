//! RFC 6238 time-based one-time passwords.
//!
//! Entries can carry a base32-encoded TOTP secret alongside the stored
//! password.  Codes are 6 digits over a 30-second period with
//! HMAC-SHA1 — the defaults every authenticator app ships with.
//!
//! The base32 decoder is lenient: lowercase input is accepted and
//! padding, spaces, and separators are skipped, since provisioning
//! strings come in all of those shapes.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha1::Sha1;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};
use crate::mem::SecretBuffer;

/// Code validity window in seconds.
pub const PERIOD_SECS: u64 = 30;

/// Number of digits in a generated code.
const DIGITS: u32 = 6;

/// Generate the TOTP code for `base32_secret` at the current time.
pub fn generate_code(base32_secret: &str) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| VaultError::Totp(format!("system clock is before the epoch: {e}")))?;
    generate_code_at(base32_secret, now.as_secs())
}

/// Generate the TOTP code for `base32_secret` at `unix_time` seconds.
///
/// Deterministic: the same secret and time step always yield the same
/// code, so authenticator apps agree with us.
pub fn generate_code_at(base32_secret: &str, unix_time: u64) -> Result<String> {
    let secret = base32_decode(base32_secret)?;

    let counter = (unix_time / PERIOD_SECS).to_be_bytes();

    // HMAC accepts any key length.
    let mut mac = Hmac::<Sha1>::new_from_slice(&secret)
        .map_err(|e| VaultError::Totp(format!("HMAC init failed: {e}")))?;
    mac.update(&counter);

    let mut hash: [u8; 20] = mac.finalize().into_bytes().into();

    // Dynamic truncation per RFC 4226 §5.3.
    let offset = usize::from(hash[19] & 0x0f);
    let binary = u32::from_be_bytes([
        hash[offset],
        hash[offset + 1],
        hash[offset + 2],
        hash[offset + 3],
    ]) & 0x7fff_ffff;
    hash.zeroize();

    let code = binary % 10u32.pow(DIGITS);
    Ok(format!("{code:06}"))
}

/// Decode a base32 secret into raw key bytes.
///
/// Characters outside the RFC 4648 alphabet (padding, whitespace,
/// dashes) are skipped rather than rejected.
fn base32_decode(encoded: &str) -> Result<SecretBuffer> {
    let mut out = Vec::with_capacity(encoded.len() * 5 / 8 + 1);
    let mut buffer: u32 = 0;
    let mut bits_left = 0;

    for ch in encoded.bytes() {
        let value = match ch {
            b'A'..=b'Z' => ch - b'A',
            b'a'..=b'z' => ch - b'a',
            b'2'..=b'7' => ch - b'2' + 26,
            _ => continue,
        };

        buffer = (buffer << 5) | u32::from(value);
        bits_left += 5;
        if bits_left >= 8 {
            out.push(((buffer >> (bits_left - 8)) & 0xff) as u8);
            bits_left -= 8;
        }
    }

    if out.is_empty() {
        return Err(VaultError::Totp(
            "secret contains no base32 characters".into(),
        ));
    }

    Ok(SecretBuffer::from_vec(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B vectors, truncated to 6 digits.  The shared
    // secret is the ASCII string "12345678901234567890" in base32.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn rfc6238_vectors() {
        assert_eq!(generate_code_at(RFC_SECRET, 59).unwrap(), "287082");
        assert_eq!(generate_code_at(RFC_SECRET, 1_111_111_109).unwrap(), "081250");
        assert_eq!(generate_code_at(RFC_SECRET, 1_234_567_890).unwrap(), "005924");
        assert_eq!(generate_code_at(RFC_SECRET, 2_000_000_000).unwrap(), "279037");
    }

    #[test]
    fn code_is_stable_within_a_period() {
        let a = generate_code_at(RFC_SECRET, 90).unwrap();
        let b = generate_code_at(RFC_SECRET, 119).unwrap();
        assert_eq!(a, b, "codes inside one 30s step must match");
    }

    #[test]
    fn lowercase_secret_is_accepted() {
        let upper = generate_code_at(RFC_SECRET, 59).unwrap();
        let lower = generate_code_at(&RFC_SECRET.to_lowercase(), 59).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn padding_and_spaces_are_skipped() {
        let padded = format!("{} ==", RFC_SECRET);
        assert_eq!(generate_code_at(&padded, 59).unwrap(), "287082");
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(generate_code_at("", 59).is_err());
        assert!(generate_code_at("---", 59).is_err());
    }

    #[test]
    fn codes_are_six_digits() {
        for t in [0, 59, 1_000_000, 9_999_999_999] {
            let code = generate_code_at(RFC_SECRET, t).unwrap();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }
}
