//! Comparison engine options.

/// How validity masks affect comparison results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskPolicy {
    /// A result position is missing when either input position is missing.
    /// Missing compared with missing is missing, not true or false.
    #[default]
    Propagate,
    /// Masks are ignored and the underlying data is compared.
    Ignore,
}

/// Handling of byte-string versus code-point-string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPolicy {
    /// Byte units are widened to code points for `==` and `!=`.
    #[default]
    Promote,
    /// Mixed text kinds are not comparable.
    Reject,
}

/// Options for a [`Comparator`](crate::Comparator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareOptions {
    pub mask_policy: MaskPolicy,
    pub text_policy: TextPolicy,
    /// Ignore trailing whitespace and NULs in text comparisons.
    pub rstrip: bool,
}

impl CompareOptions {
    pub fn with_mask_policy(mut self, policy: MaskPolicy) -> Self {
        self.mask_policy = policy;
        self
    }

    pub fn with_text_policy(mut self, policy: TextPolicy) -> Self {
        self.text_policy = policy;
        self
    }

    pub fn with_rstrip(mut self, rstrip: bool) -> Self {
        self.rstrip = rstrip;
        self
    }
}
