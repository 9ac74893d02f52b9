/// Reallocation rule applied by [`DynamicBuffer::update`](super::DynamicBuffer::update).
///
/// Index streams and streams whose length gates a draw call must use
/// `ExactFit`; a shrinking write into a larger allocation would otherwise leave
/// stale elements inside the range the GPU reads. Plain attribute streams only
/// need enough room, so they use one of the growing policies.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SizePolicy {
    /// Orphan whenever the required byte size differs from the capacity.
    ExactFit,
    /// Orphan only when the required byte size exceeds the capacity; the new
    /// allocation is sized exactly to the data.
    GrowOnly,
    /// Like `GrowOnly`, but the new allocation is rounded up to the next power
    /// of two and never smaller than `min_bytes`.
    Geometric { min_bytes: u64 },
}

impl SizePolicy {
    /// Returns `true` if a buffer of `capacity` bytes must be replaced to hold
    /// `required` bytes.
    #[inline]
    pub fn needs_orphan(self, capacity: u64, required: u64) -> bool {
        match self {
            SizePolicy::ExactFit => required != capacity,
            SizePolicy::GrowOnly | SizePolicy::Geometric { .. } => required > capacity,
        }
    }

    /// Byte capacity of the replacement allocation for `required` bytes.
    #[inline]
    pub fn orphan_capacity(self, required: u64) -> u64 {
        match self {
            SizePolicy::ExactFit | SizePolicy::GrowOnly => required,
            SizePolicy::Geometric { min_bytes } => required.next_power_of_two().max(min_bytes),
        }
    }

    /// Whether the buffer's capacity always equals the last written byte size.
    #[inline]
    pub fn tracks_length(self) -> bool {
        matches!(self, SizePolicy::ExactFit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_orphans_on_any_size_change() {
        assert!(SizePolicy::ExactFit.needs_orphan(8, 16));
        assert!(SizePolicy::ExactFit.needs_orphan(16, 8));
        assert!(!SizePolicy::ExactFit.needs_orphan(16, 16));
    }

    #[test]
    fn grow_only_orphans_only_when_growing() {
        assert!(SizePolicy::GrowOnly.needs_orphan(24, 32));
        assert!(!SizePolicy::GrowOnly.needs_orphan(32, 24));
        assert!(!SizePolicy::GrowOnly.needs_orphan(32, 32));
    }

    #[test]
    fn grow_only_allocates_exactly_what_is_required() {
        assert_eq!(SizePolicy::GrowOnly.orphan_capacity(40), 40);
        assert_eq!(SizePolicy::ExactFit.orphan_capacity(0), 0);
    }

    #[test]
    fn geometric_rounds_up_with_floor() {
        let p = SizePolicy::Geometric { min_bytes: 64 };
        assert_eq!(p.orphan_capacity(8), 64);
        assert_eq!(p.orphan_capacity(65), 128);
        assert_eq!(p.orphan_capacity(128), 128);
        assert!(!p.needs_orphan(128, 100));
        assert!(p.needs_orphan(128, 129));
    }

    #[test]
    fn only_exact_fit_tracks_length() {
        assert!(SizePolicy::ExactFit.tracks_length());
        assert!(!SizePolicy::GrowOnly.tracks_length());
        assert!(!SizePolicy::Geometric { min_bytes: 0 }.tracks_length());
    }
}
