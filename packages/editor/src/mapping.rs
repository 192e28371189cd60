//! # Position mapping
//!
//! Every step reports how it moved positions as a [`StepMap`]: a list of
//! `(start, old_size, new_size)` ranges. A [`Mapping`] chains the maps of
//! consecutive steps so a position taken before a transaction can be carried
//! to the document after it.
//!
//! ```text
//! insert k at p      positions >= p move by +k
//! delete [a, b)      positions >= b move by -(b - a)
//!                    positions in (a, b) clamp to a and are reported deleted
//! ```

/// Where a position ended up after mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The content around the original position was removed
    pub deleted: bool,
}

/// Position changes caused by one step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
}

impl StepMap {
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::identity();
        }
        Self {
            ranges: vec![(start, old_size, new_size)],
        }
    }

    pub fn identity() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn map(&self, pos: usize) -> MapResult {
        let mut diff: isize = 0;
        for &(start, old_size, new_size) in &self.ranges {
            if start > pos {
                break;
            }
            let end = start + old_size;
            if old_size == 0 || pos >= end {
                // insertion point or past the replaced range
                diff += new_size as isize - old_size as isize;
                continue;
            }
            return MapResult {
                pos: shift(start, diff),
                deleted: pos != start,
            };
        }
        MapResult {
            pos: shift(pos, diff),
            deleted: false,
        }
    }
}

fn shift(pos: usize, diff: isize) -> usize {
    (pos as isize + diff).max(0) as usize
}

/// A chain of step maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn append(&mut self, other: &Mapping) {
        self.maps.extend(other.maps.iter().cloned());
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Mapping through the maps from index `from` onwards
    pub fn slice(&self, from: usize) -> Mapping {
        Mapping {
            maps: self.maps[from.min(self.maps.len())..].to_vec(),
        }
    }

    pub fn map(&self, pos: usize) -> usize {
        self.map_result(pos).pos
    }

    pub fn map_result(&self, pos: usize) -> MapResult {
        self.maps.iter().fold(
            MapResult {
                pos,
                deleted: false,
            },
            |acc, map| {
                let next = map.map(acc.pos);
                MapResult {
                    pos: next.pos,
                    deleted: acc.deleted || next.deleted,
                }
            },
        )
    }
}
