//! Shared secret generation.

use cmpgate_core::{AuthError, Result};
use ring::rand::SecureRandom;

/// Length of generated passwords.
pub const PASSWORD_LENGTH: usize = 12;

const FIRST_PRINTABLE: u8 = 0x21;
const PRINTABLE_COUNT: u8 = 0x7e - FIRST_PRINTABLE + 1;
/// Largest multiple of `PRINTABLE_COUNT` that fits a byte; bytes at or above
/// it are discarded so every character is equally likely.
const ACCEPT_BELOW: u8 = PRINTABLE_COUNT * (u8::MAX / PRINTABLE_COUNT);

/// Generate a random password of printable ASCII characters (`!` to `~`).
pub fn generate_password(rng: &dyn SecureRandom) -> Result<String> {
    let mut password = String::with_capacity(PASSWORD_LENGTH);
    let mut buf = [0u8; 32];
    while password.len() < PASSWORD_LENGTH {
        rng.fill(&mut buf).map_err(|_| AuthError::RandomSource)?;
        for &b in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
            if password.len() == PASSWORD_LENGTH {
                break;
            }
            password.push(char::from(FIRST_PRINTABLE + b % PRINTABLE_COUNT));
        }
    }
    Ok(password)
}
