// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use std::ops::Range;

use suftree::{NodeRef, Result, Symbol, TreeView};

use crate::{
    Representation, SlidingConfig,
    engine::{Engine, Phase, Stats},
    tree::{Shti, Slli},
    window::{SymbolSource, Window},
};

enum Inner<C> {
    Slli(Engine<C, Slli>),
    Shti(Engine<C, Shti>),
}

macro_rules! dispatch {
    ($tree:expr, $engine:ident => $body:expr) => {
        match $tree {
            Inner::Slli($engine) => $body,
            Inner::Shti($engine) => $body,
        }
    };
}

/// A suffix tree over the active part of a sliding window.
///
/// The tree indexes the active part exactly, without a terminator: suffixes that also occur
/// earlier in the active part end inside an edge instead of at a leaf. Offsets handed out through
/// [`TreeView`] are absolute stream positions, the first symbol of the stream being at position 1,
/// and stay valid until the next call to [`SlidingSuffixTree::step`].
pub struct SlidingSuffixTree<C> {
    inner: Inner<C>,
}

/// Starts a sliding-window construction over `source`.
///
/// The returned tree is empty. Every call to [`SlidingSuffixTree::step`] then advances the window
/// by one symbol: it appends the next symbol of the stream while the active part is filling up,
/// deletes the oldest suffix and appends the next symbol once it is full, and deletes the oldest
/// suffix once the stream is exhausted.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`](suftree::Error::InvalidParameter) if `config` is rejected,
/// [`Error::Allocation`](suftree::Error::Allocation) if the window cannot be allocated, and
/// [`Error::Io`](suftree::Error::Io) if the reader thread cannot be started.
///
/// # Examples
///
/// ```
/// use slidetree::{SliceSource, SlidingConfig};
///
/// # fn main() -> slidetree::Result<()> {
/// let mut config = SlidingConfig::new();
/// config.block_size(4);
///
/// let source = SliceSource::new(b"abcabcabc".to_vec());
/// let mut tree = slidetree::build_sliding_window_ukkonen::<u8, _>(&config, source)?;
///
/// for _ in 0..6 {
///     tree.step()?;
/// }
/// assert_eq!(tree.active_text(), b"cabc");
///
/// tree.run()?;
/// assert!(tree.active_text().is_empty());
/// # Ok(())
/// # }
/// ```
pub fn build_sliding_window_ukkonen<C, S>(
    config: &SlidingConfig,
    source: S,
) -> Result<SlidingSuffixTree<C>>
where
    C: Symbol,
    S: SymbolSource<C> + Send + 'static,
{
    let config = config.validated()?;
    let source = Box::new(source);

    let inner = match config.representation {
        Representation::Slli => Inner::Slli(Engine::new(config, source)?),
        Representation::Shti => Inner::Shti(Engine::new(config, source)?),
    };

    Ok(SlidingSuffixTree { inner })
}

impl<C: Symbol> SlidingSuffixTree<C> {
    /// Advances the window by one symbol.
    ///
    /// Returns `false` once the stream is exhausted and every suffix has been deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](suftree::Error::Io) if the source fails,
    /// [`Error::HashExhausted`](suftree::Error::HashExhausted) if the edge map cannot place an
    /// edge, [`Error::Allocation`](suftree::Error::Allocation) if a table cannot grow, and
    /// [`Error::Protocol`](suftree::Error::Protocol) if an invariant of the tree was found broken.
    pub fn step(&mut self) -> Result<bool> {
        dispatch!(&mut self.inner, engine => engine.step())
    }

    /// Steps until the stream is exhausted and the window is empty.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`SlidingSuffixTree::step`].
    pub fn run(&mut self) -> Result<()> {
        while self.step()? {}

        Ok(())
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        dispatch!(&self.inner, engine => engine.phase())
    }

    /// Returns the counters collected so far.
    pub fn stats(&self) -> Stats {
        dispatch!(&self.inner, engine => engine.stats())
    }

    /// Returns the window.
    pub fn window(&self) -> &Window<C> {
        dispatch!(&self.inner, engine => &engine.window)
    }

    /// Returns the positions of the active part.
    pub fn active_range(&self) -> Range<u64> {
        self.window().active_range()
    }

    /// Returns a copy of the text the tree indexes.
    pub fn active_text(&self) -> Vec<C> {
        self.window().active_text()
    }
}

impl<C: Symbol> TreeView for SlidingSuffixTree<C> {
    fn first_child(&self, node: NodeRef) -> NodeRef {
        dispatch!(&self.inner, engine => engine.first_child(node))
    }

    fn next_sibling(&self, node: NodeRef) -> NodeRef {
        dispatch!(&self.inner, engine => engine.next_sibling(node))
    }

    fn parent(&self, node: NodeRef) -> NodeRef {
        dispatch!(&self.inner, engine => engine.parent(node))
    }

    fn depth(&self, node: NodeRef) -> usize {
        dispatch!(&self.inner, engine => engine.depth(node))
    }

    fn suffix_link(&self, node: NodeRef) -> NodeRef {
        dispatch!(&self.inner, engine => engine.suffix_link(node))
    }

    fn edge_label_bounds(&self, parent: NodeRef, child: NodeRef) -> (usize, usize) {
        dispatch!(&self.inner, engine => engine.edge_label_bounds(parent, child))
    }

    fn leaf_to_suffix_start(&self, leaf: NodeRef) -> usize {
        dispatch!(&self.inner, engine => engine.leaf_to_suffix_start(leaf))
    }

    fn label_symbol(&self, offset: usize, index: usize) -> Option<u32> {
        dispatch!(&self.inner, engine => engine.label_symbol(offset, index))
    }
}
