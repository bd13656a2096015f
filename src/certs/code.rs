use rand::Rng;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Crockford base32: no I, L, O or U, so printed codes survive being read aloud.
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Fewest random symbols a code may carry (80 bits with a 32-symbol alphabet).
pub const MIN_CODE_SYMBOLS: usize = 16;

pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// Layout of a generated code: `groups` blocks of `group_len` symbols joined by `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFormat {
    pub groups: usize,
    pub group_len: usize,
}

impl Default for CodeFormat {
    fn default() -> Self {
        Self {
            groups: 4,
            group_len: 4,
        }
    }
}

impl CodeFormat {
    pub fn symbols(&self) -> usize {
        self.groups * self.group_len
    }

    pub fn is_strong_enough(&self) -> bool {
        self.group_len > 0 && self.symbols() >= MIN_CODE_SYMBOLS
    }

    pub fn encoded_len(&self) -> usize {
        self.symbols() + self.groups.saturating_sub(1)
    }
}

/// Draws codes from the OS RNG. Nothing about the user or course goes into a code.
#[derive(Debug, Clone, Default)]
pub struct RandomCodes {
    format: CodeFormat,
}

impl RandomCodes {
    pub fn new(format: CodeFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> CodeFormat {
        self.format
    }
}

impl CodeSource for RandomCodes {
    fn next_code(&self) -> String {
        let mut rng = OsRng;
        let mut code = String::with_capacity(self.format.encoded_len());

        for group in 0..self.format.groups {
            if group > 0 {
                code.push('-');
            }
            for _ in 0..self.format.group_len {
                let idx = rng.gen_range(0..ALPHABET.len());
                code.push(ALPHABET[idx] as char);
            }
        }

        code
    }
}

/// Short stable tag for a code, safe to put in logs and errors.
pub fn fingerprint(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    hex::encode(&digest[..6])
}
