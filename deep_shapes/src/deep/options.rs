/// Limits of a [DeepShapeStore](crate::deep::DeepShapeStore).
///
/// # Examples
///
/// ```
/// # use deep_shapes::deep::*;
/// let options = StoreOptions::new().with_max_variants(10_000);
/// assert_eq!(options.max_variants, 10_000);
/// assert_eq!(options.max_working_set, StoreOptions::default().max_working_set);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreOptions {
    /// Maximum number of variants (base and refined) the store registers.
    pub max_variants: usize,
    /// Maximum number of shapes held by all published layers together.
    pub max_working_set: usize,
}

impl StoreOptions {
    #[inline]
    pub fn new() -> Self {
        StoreOptions {
            max_variants: 1 << 20,
            max_working_set: 1 << 28,
        }
    }

    #[inline]
    pub fn with_max_variants(mut self, max_variants: usize) -> Self {
        self.max_variants = max_variants;
        self
    }

    #[inline]
    pub fn with_max_working_set(mut self, max_working_set: usize) -> Self {
        self.max_working_set = max_working_set;
        self
    }
}

impl Default for StoreOptions {
    #[inline]
    fn default() -> Self {
        StoreOptions::new()
    }
}
