//! Match results for one block
//!
//! Locations order by start offset and then by parent id, and two locations
//! with the same start and parent are the same slot. Inserting into a taken
//! slot keeps the earlier location, so patterns declared first win ties.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::pattern::{Pattern, PatternFlags, PatternId};
use super::style::{Color, FontFormat};

/// A span of block text attributed to one pattern
#[derive(Debug, Clone, Copy)]
pub struct PatternLocation {
    pub pattern_id: PatternId,
    pub parent_id: PatternId,
    pub flags: PatternFlags,
    pub font_format: FontFormat,
    pub color: Option<Color>,
    /// Byte offset in the block
    pub position: usize,
    /// Length in bytes, never 0
    pub length: usize,
}

impl PatternLocation {
    pub fn new(pattern: &Pattern, position: usize, length: usize) -> Self {
        Self {
            pattern_id: pattern.id,
            parent_id: pattern.parent_id,
            flags: pattern.flags,
            font_format: pattern.style.font_format(),
            color: pattern.style.color(),
            position,
            length,
        }
    }

    /// Byte offset just past the location
    pub fn end(&self) -> usize {
        self.position + self.length
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.position && pos < self.end()
    }

    fn key(&self) -> (usize, PatternId) {
        (self.position, self.parent_id)
    }
}

impl PartialEq for PatternLocation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PatternLocation {}

impl PartialOrd for PatternLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PatternLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Ordered locations of one block plus the active-pattern handshake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationSet {
    locations: BTreeSet<PatternLocation>,
    incoming_active_id: PatternId,
    outgoing_active_id: PatternId,
}

impl LocationSet {
    /// Create an empty set for a block entered with `incoming_active_id` open
    pub fn new(incoming_active_id: PatternId) -> Self {
        Self {
            incoming_active_id,
            ..Default::default()
        }
    }

    /// Insert unless the slot is taken; returns whether it was inserted
    pub fn insert(&mut self, location: PatternLocation) -> bool {
        location.length > 0 && self.locations.insert(location)
    }

    pub fn extend<I: IntoIterator<Item = PatternLocation>>(&mut self, locations: I) {
        for location in locations {
            self.insert(location);
        }
    }

    pub fn incoming_active_id(&self) -> PatternId {
        self.incoming_active_id
    }

    pub fn outgoing_active_id(&self) -> PatternId {
        self.outgoing_active_id
    }

    pub(crate) fn set_outgoing_active_id(&mut self, id: PatternId) {
        self.outgoing_active_id = id;
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternLocation> {
        self.locations.iter()
    }

    pub fn to_vec(&self) -> Vec<PatternLocation> {
        self.locations.iter().copied().collect()
    }

    /// Resolve overlaps and pick the outgoing active id
    ///
    /// `active_patterns` holds the id bits of every pattern that came out of
    /// matching still open. Walking in order, a location that overlaps the
    /// previous kept one must be its direct child; one that overlaps the
    /// current parent must be a child of that parent. Anything else that
    /// overlaps is discarded and its pattern drops out of the active set.
    /// A location clear of both becomes the new parent.
    pub fn resolve(&mut self, mut active_patterns: PatternId) {
        let mut kept: Vec<PatternLocation> = Vec::with_capacity(self.locations.len());
        let mut prev: Option<PatternLocation> = None;
        let mut parent: Option<PatternLocation> = None;

        // Nothing can be rooted under a parent that is not there yet
        let ordered = self.locations.iter().skip_while(|l| l.parent_id != 0);

        for location in ordered {
            let keep = match (prev, parent) {
                (Some(p), _) if location.position < p.end() => location.parent_id == p.pattern_id,
                (_, Some(par)) if location.position < par.end() => {
                    location.parent_id == par.pattern_id
                }
                _ => {
                    parent = Some(*location);
                    true
                }
            };

            if keep {
                prev = Some(*location);
                kept.push(*location);
            } else {
                active_patterns &= !location.pattern_id;
            }
        }

        self.outgoing_active_id = kept
            .iter()
            .find(|l| l.pattern_id & active_patterns != 0)
            .map_or(0, |l| l.pattern_id);
        self.locations = kept.into_iter().collect();
    }
}
