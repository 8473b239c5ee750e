//! Quantized activation tables
//!
//! An elementwise function over affine-quantized `u8` values only ever sees 256
//! distinct inputs, so it can be precomputed into a [`LookupTable`]:
//!
//! ```text
//! T[q] = quantize_out(f(dequantize_in(q)))
//! dequantize(q) = (q - zero_point) * scale
//! quantize(x)   = clamp(round_half_even(x / scale) + zero_point, 0, 255)
//! ```
//!
//! Applying the function to a whole tensor is then a single byte lookup.

use crate::error::{LutError, LutResult};
use crate::table::LookupTable;
use std::fmt;
use std::str::FromStr;

/// Affine quantization parameters for `u8` data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    scale: f32,
    zero_point: u8,
}

impl QuantParams {
    /// # Errors
    /// Returns [`LutError::InvalidScale`] unless `scale` is finite and positive.
    pub fn new(scale: f32, zero_point: u8) -> LutResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(LutError::InvalidScale(scale));
        }
        Ok(Self { scale, zero_point })
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn zero_point(&self) -> u8 {
        self.zero_point
    }

    #[inline]
    pub fn dequantize(&self, q: u8) -> f32 {
        (q as i32 - self.zero_point as i32) as f32 * self.scale
    }

    /// Round half to even, then saturate to `[0, 255]`. NaN maps to 0.
    #[inline]
    pub fn quantize(&self, x: f32) -> u8 {
        let q = (x / self.scale).round_ties_even() + self.zero_point as f32;
        // `as` saturates and sends NaN to 0
        q.clamp(0.0, 255.0) as u8
    }
}

/// Build `T[q] = output.quantize(f(input.dequantize(q)))`
pub fn build_quantized_table<F: Fn(f32) -> f32>(
    input: &QuantParams,
    output: &QuantParams,
    f: F,
) -> LookupTable {
    LookupTable::from_fn(|q| output.quantize(f(input.dequantize(q))))
}

/// Elementwise activations that are commonly lowered to byte lookups
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    /// `x` if positive, `alpha * x` otherwise
    LeakyRelu { alpha: f32 },
    /// `clamp(alpha * x + beta, 0, 1)`
    HardSigmoid { alpha: f32, beta: f32 },
}

impl Activation {
    pub const DEFAULT_LEAKY_ALPHA: f32 = 0.01;
    pub const DEFAULT_HARD_SIGMOID_ALPHA: f32 = 0.2;
    pub const DEFAULT_HARD_SIGMOID_BETA: f32 = 0.5;

    pub fn apply(&self, x: f32) -> f32 {
        match *self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu { alpha } => {
                if x >= 0.0 {
                    x
                } else {
                    alpha * x
                }
            }
            Activation::HardSigmoid { alpha, beta } => (alpha * x + beta).clamp(0.0, 1.0),
        }
    }

    /// Replace `alpha` for activations that take one; others are unchanged
    pub fn with_alpha(self, alpha: f32) -> Self {
        match self {
            Activation::LeakyRelu { .. } => Activation::LeakyRelu { alpha },
            Activation::HardSigmoid { beta, .. } => Activation::HardSigmoid { alpha, beta },
            other => other,
        }
    }

    /// Replace `beta` for hard-sigmoid; others are unchanged
    pub fn with_beta(self, beta: f32) -> Self {
        match self {
            Activation::HardSigmoid { alpha, .. } => Activation::HardSigmoid { alpha, beta },
            other => other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::LeakyRelu { .. } => "leaky-relu",
            Activation::HardSigmoid { .. } => "hard-sigmoid",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = LutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "relu" => Ok(Activation::Relu),
            "leaky-relu" | "leakyrelu" => Ok(Activation::LeakyRelu {
                alpha: Self::DEFAULT_LEAKY_ALPHA,
            }),
            "hard-sigmoid" | "hardsigmoid" => Ok(Activation::HardSigmoid {
                alpha: Self::DEFAULT_HARD_SIGMOID_ALPHA,
                beta: Self::DEFAULT_HARD_SIGMOID_BETA,
            }),
            _ => Err(LutError::UnknownActivation(s.to_string())),
        }
    }
}

/// Lookup table applying `activation` between two quantized domains
pub fn build_activation_table(
    activation: Activation,
    input: &QuantParams,
    output: &QuantParams,
) -> LookupTable {
    build_quantized_table(input, output, |x| activation.apply(x))
}
