//! Random parameter values, one generator branch per [`ParameterType`].

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::endpoint::ParameterType;

const MIN_STRING_LEN: usize = 1;
const MAX_STRING_LEN: usize = 24;

/// Printable ASCII minus the characters that delimit URL components,
/// including `\`, which http(s) URLs treat as a path separator.
/// Quotes, angle brackets, semicolons and the like are kept as probes.
const STRING_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!\"$'()*+,-.:;<>@[]^_`|~";

/// A synthesized value for a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum FuzzValue {
    String(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for FuzzValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuzzValue::String(s) => f.write_str(s),
            FuzzValue::Integer(i) => write!(f, "{}", i),
            // Plain notation for extreme magnitudes runs to hundreds of digits.
            FuzzValue::Float(x) if *x != 0.0 && !(1e-6..1e16).contains(&x.abs()) => {
                write!(f, "{:e}", x)
            }
            FuzzValue::Float(x) => write!(f, "{}", x),
        }
    }
}

pub struct ValueGenerator {
    rng: StdRng,
}

impl ValueGenerator {
    pub fn from_entropy() -> Self {
        ValueGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    /// Same seed, same sequence of values.
    pub fn seeded(seed: u64) -> Self {
        ValueGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, param_type: ParameterType) -> FuzzValue {
        match param_type {
            ParameterType::String => FuzzValue::String(self.string()),
            ParameterType::Integer => FuzzValue::Integer(self.integer()),
            ParameterType::Float => FuzzValue::Float(self.float()),
        }
    }

    /// `.` and `..` are redrawn: URL normalization would drop them as path
    /// segments.
    pub fn string(&mut self) -> String {
        loop {
            let len = self.rng.gen_range(MIN_STRING_LEN..=MAX_STRING_LEN);
            let value: String = (0..len)
                .map(|_| STRING_ALPHABET[self.rng.gen_range(0..STRING_ALPHABET.len())] as char)
                .collect();
            if value != "." && value != ".." {
                return value;
            }
        }
    }

    /// Uniform over the whole `i64` range.
    pub fn integer(&mut self) -> i64 {
        self.rng.gen()
    }

    /// Uniform over bit patterns, so subnormals and extreme exponents show up
    /// as often as ordinary values. NaN and infinities are redrawn.
    pub fn float(&mut self) -> f64 {
        loop {
            let value = f64::from_bits(self.rng.gen());
            if value.is_finite() {
                return value;
            }
        }
    }

    /// Access to the underlying RNG, e.g. for shuffling with the same seed.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
