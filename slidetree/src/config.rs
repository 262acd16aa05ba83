// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use log::warn;
use suftree::{Error, Result};

/// How stale edge-label offsets are corrected as the window slides.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ElmMethod {
    /// Refresh every label from the leaves once per active-part length of advance (Senft)
    #[default]
    Batch,
    /// Propagate one-bit credits toward the root on every structural change (Fiala and Greene)
    Credit,
    /// Larsson's method. Recognized but not supported: selecting it is a configuration error.
    Larsson,
}

/// How the node for the next shorter suffix is found after the active point moves.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Variation {
    /// Follow the active node's suffix link and descend from there
    #[default]
    TopDown,
    /// Follow the suffix link of the node below the active point and climb back up, falling back
    /// to a descent when that node has no link yet
    BottomUp,
}

/// How the children of a branching node are stored.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Representation {
    /// Intrusive linked lists of siblings
    Slli,
    /// One open-addressing hash table keyed by parent and first letter
    #[default]
    Shti,
}

/// How the edge hash table resolves collisions.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CollisionResolution {
    /// Several independent hash functions with bounded relocation chains
    #[default]
    Cuckoo,
    /// One probe sequence per key, with tombstones for deleted entries
    DoubleHashing,
}

/// Configuration for a sliding-window suffix tree.
///
/// The window holds `block_size × sw_scale_factor` symbols, of which at most
/// `block_size × ap_scale_factor` (the active part) are indexed by the tree at any time. The rest
/// of the window is used to read ahead and to keep stale edge labels readable until they are
/// corrected.
///
/// # Examples
///
/// ```
/// use slidetree::{ElmMethod, SlidingConfig};
///
/// let mut config = SlidingConfig::new();
/// config.block_size(4096).ap_scale_factor(2).elm_method(ElmMethod::Credit);
///
/// assert_eq!(config.active_size(), 8192);
/// // Credits need the active part plus a block of history and a block being refilled
/// assert_eq!(config.window_size(), 4096 * 4);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SlidingConfig {
    pub(crate) block_size: usize,
    pub(crate) ap_scale_factor: usize,
    pub(crate) sw_scale_factor: Option<usize>,
    pub(crate) elm_method: ElmMethod,
    pub(crate) variation: Variation,
    pub(crate) representation: Representation,
    pub(crate) collision_resolution: CollisionResolution,
    pub(crate) cuckoo_hash_functions: usize,
    pub(crate) initial_hash_capacity: usize,
    pub(crate) allow_rehash: bool,
    pub(crate) reader_thread: bool,
}

impl SlidingConfig {
    /// Creates a new configuration with the default options
    pub const fn new() -> Self {
        Self {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            ap_scale_factor: Self::DEFAULT_AP_SCALE_FACTOR,
            sw_scale_factor: None,
            elm_method: ElmMethod::Batch,
            variation: Variation::TopDown,
            representation: Representation::Shti,
            collision_resolution: CollisionResolution::Cuckoo,
            cuckoo_hash_functions: Self::DEFAULT_CUCKOO_HASH_FUNCTIONS,
            initial_hash_capacity: Self::DEFAULT_INITIAL_HASH_CAPACITY,
            allow_rehash: true,
            reader_thread: false,
        }
    }

    /// Sets the number of symbols read from the input at a time.
    pub fn block_size(&mut self, symbols: usize) -> &mut Self {
        self.block_size = symbols;
        self
    }

    /// Sets the size of the active part, in blocks.
    pub fn ap_scale_factor(&mut self, blocks: usize) -> &mut Self {
        self.ap_scale_factor = blocks;
        self
    }

    /// Sets the size of the whole window, in blocks.
    ///
    /// Values too small to hold the active part alongside the blocks the edge-label maintenance
    /// method needs are raised to the minimum. `None` picks twice the active part for
    /// [`ElmMethod::Batch`] and the active part plus two blocks otherwise.
    pub fn sw_scale_factor(&mut self, blocks: Option<usize>) -> &mut Self {
        self.sw_scale_factor = blocks;
        self
    }

    /// Sets the edge-label maintenance method.
    pub fn elm_method(&mut self, method: ElmMethod) -> &mut Self {
        self.elm_method = method;
        self
    }

    /// Sets the way suffix links are simulated.
    pub fn variation(&mut self, variation: Variation) -> &mut Self {
        self.variation = variation;
        self
    }

    /// Sets the child representation.
    pub fn representation(&mut self, representation: Representation) -> &mut Self {
        self.representation = representation;
        self
    }

    /// Sets the collision resolution of the edge hash table. Only used by [`Representation::Shti`].
    pub fn collision_resolution(&mut self, resolution: CollisionResolution) -> &mut Self {
        self.collision_resolution = resolution;
        self
    }

    /// Sets the number of cuckoo hash functions. Values outside `2..=16` are clamped.
    pub fn cuckoo_hash_functions(&mut self, count: usize) -> &mut Self {
        self.cuckoo_hash_functions = count;
        self
    }

    /// Sets the initial number of edge hash table slots, rounded up to a power of two.
    pub fn initial_hash_capacity(&mut self, slots: usize) -> &mut Self {
        self.initial_hash_capacity = slots;
        self
    }

    /// Sets whether the edge hash table may grow and rehash when an insertion cannot be placed.
    pub fn allow_rehash(&mut self, allow: bool) -> &mut Self {
        self.allow_rehash = allow;
        self
    }

    /// Sets whether input blocks are read ahead on a dedicated thread.
    ///
    /// Without the `threads` feature the reads always happen on the calling thread.
    pub fn reader_thread(&mut self, enabled: bool) -> &mut Self {
        self.reader_thread = enabled;
        self
    }

    /// Returns the maximum number of symbols indexed at once.
    pub fn active_size(&self) -> usize {
        self.block_size * self.ap_scale_factor
    }

    /// Returns the number of symbols the window holds, after defaults and minimums are applied.
    pub fn window_size(&self) -> usize {
        self.block_size * self.effective_sw_scale_factor()
    }

    fn min_sw_scale_factor(&self) -> usize {
        match self.elm_method {
            // The active part plus the block being refilled
            ElmMethod::Batch | ElmMethod::Larsson => self.ap_scale_factor + 1,
            // Credits may leave labels up to one block behind the active part
            ElmMethod::Credit => self.ap_scale_factor + 2,
        }
    }

    pub(crate) fn effective_sw_scale_factor(&self) -> usize {
        let requested = self.sw_scale_factor.unwrap_or(match self.elm_method {
            ElmMethod::Batch => 2 * self.ap_scale_factor,
            _ => self.ap_scale_factor + 2,
        });

        requested.max(self.min_sw_scale_factor())
    }

    /// Checks the configuration and applies corrections, logging a warning for each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if a size is zero, the window does not fit 32-bit
    /// offsets, or [`ElmMethod::Larsson`] is selected.
    pub(crate) fn validated(&self) -> Result<Self> {
        let mut config = *self;

        if config.block_size == 0 {
            return Err(Error::InvalidParameter("block size must be at least 1".into()));
        }
        if config.ap_scale_factor == 0 {
            return Err(Error::InvalidParameter(
                "active part scale factor must be at least 1".into(),
            ));
        }
        if config.elm_method == ElmMethod::Larsson {
            return Err(Error::InvalidParameter(
                "Larsson's edge-label maintenance is not supported".into(),
            ));
        }

        let minimum = config.min_sw_scale_factor();
        if let Some(requested) = config.sw_scale_factor
            && requested < minimum
        {
            warn!("window scale factor {requested} is below the minimum, raising it to {minimum}");
        }
        config.sw_scale_factor = Some(config.effective_sw_scale_factor());

        if config
            .block_size
            .checked_mul(config.effective_sw_scale_factor())
            .is_none_or(|size| size > u32::MAX as usize / 2)
        {
            return Err(Error::InvalidParameter(
                "window does not fit 32-bit offsets".into(),
            ));
        }

        let clamped = config.cuckoo_hash_functions.clamp(2, 16);
        if clamped != config.cuckoo_hash_functions {
            warn!(
                "{} cuckoo hash functions requested, using {clamped}",
                config.cuckoo_hash_functions
            );
            config.cuckoo_hash_functions = clamped;
        }

        if config.reader_thread && !cfg!(feature = "threads") {
            warn!("reader thread requested without thread support, reading synchronously");
            config.reader_thread = false;
        }

        Ok(config)
    }

    /// The default block size in symbols
    ///
    /// Large blocks amortize reader hand-offs over many construction steps.
    pub const DEFAULT_BLOCK_SIZE: usize = 8 << 20;

    /// The default active part size in blocks
    pub const DEFAULT_AP_SCALE_FACTOR: usize = 1;

    /// The default number of cuckoo hash functions
    pub const DEFAULT_CUCKOO_HASH_FUNCTIONS: usize = 8;

    /// The default initial number of edge hash table slots
    pub const DEFAULT_INITIAL_HASH_CAPACITY: usize = 1024;
}

impl Default for SlidingConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_depend_on_method() {
        let mut config = SlidingConfig::new();
        config.block_size(10).ap_scale_factor(3);
        assert_eq!(config.window_size(), 60);

        config.elm_method(ElmMethod::Credit);
        assert_eq!(config.window_size(), 50);
    }

    #[test]
    fn small_window_is_raised() {
        let mut config = SlidingConfig::new();
        config.block_size(4).ap_scale_factor(2).sw_scale_factor(Some(1));

        let validated = config.validated().unwrap();
        assert_eq!(validated.sw_scale_factor, Some(3));
        assert_eq!(validated.window_size(), 12);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(SlidingConfig::new().block_size(0).validated().is_err());
        assert!(SlidingConfig::new().ap_scale_factor(0).validated().is_err());
    }

    #[test]
    fn larsson_is_rejected() {
        let result = SlidingConfig::new()
            .block_size(4)
            .elm_method(ElmMethod::Larsson)
            .validated();

        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn hash_function_count_is_clamped() {
        let config = SlidingConfig::new()
            .block_size(4)
            .cuckoo_hash_functions(40)
            .validated()
            .unwrap();

        assert_eq!(config.cuckoo_hash_functions, 16);
    }
}
