//! Initial password generation for newly created accounts.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use secrecy::SecretString;
use xavyo_connector::error::{ConnectorError, ConnectorResult};

const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_=+";

/// Produces the one-time secret handed to a new account.
pub trait CredentialGenerator: Send + Sync {
    /// Generate a new secret.
    fn generate(&self) -> ConnectorResult<SecretString>;
}

/// Random password containing at least one character of every class.
///
/// Metabase rejects passwords that are too short or too common.
#[derive(Debug, Clone, Copy)]
pub struct RandomPasswordGenerator {
    length: usize,
}

impl RandomPasswordGenerator {
    pub const DEFAULT_LENGTH: usize = 20;
    const MIN_LENGTH: usize = 8;

    #[must_use]
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomPasswordGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LENGTH)
    }
}

impl CredentialGenerator for RandomPasswordGenerator {
    fn generate(&self) -> ConnectorResult<SecretString> {
        if self.length < Self::MIN_LENGTH {
            return Err(ConnectorError::InvalidConfiguration {
                message: format!(
                    "Password length must be at least {}, got {}",
                    Self::MIN_LENGTH,
                    self.length
                ),
            });
        }

        let mut rng = OsRng;
        let classes = [LOWER, UPPER, DIGITS, SYMBOLS];
        let all: Vec<u8> = classes.concat();

        let mut chars: Vec<u8> = classes
            .iter()
            .map(|class| class[rng.gen_range(0..class.len())])
            .collect();
        let fill = self.length - chars.len();
        chars.extend((0..fill).map(|_| all[rng.gen_range(0..all.len())]));
        chars.shuffle(&mut rng);

        Ok(SecretString::from(
            chars.into_iter().map(char::from).collect::<String>(),
        ))
    }
}
