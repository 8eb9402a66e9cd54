//! Human-shareable order codes.

use rand::Rng;

pub const ORDER_CODE_PREFIX: &str = "D2Y";

/// Source of candidate order codes.
///
/// Candidates need not be unique; the engine checks and retries.
pub trait OrderCodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// `D2Y` followed by six random digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrderCode;

impl OrderCodeGenerator for RandomOrderCode {
    fn generate(&self) -> String {
        let n: u32 = rand::rng().random_range(100_000..1_000_000);
        format!("{ORDER_CODE_PREFIX}{n}")
    }
}
