//! Candidate space: the Cartesian product of all parameter domains.
//!
//! Candidates are addressed by a mixed-radix index. The first parameter
//! varies slowest and the last fastest, so index order is the usual
//! lexicographic product order over the declared domains.
//!
//! `PairIndex` maps every pair of the universe to a dense id and lets the
//! solvers ask which ids a candidate realizes without touching strings.

use std::collections::HashMap;

use pairwise_ir::{Candidate, InputError, Pair, ParameterSet};

use super::pairs::PairUniverse;

#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    #[error("invalid parameters: {0}")]
    Input(#[from] InputError),

    #[error("candidate space size overflows the address range")]
    Overflow,
}

/// Mixed-radix view of the Cartesian product.
#[derive(Debug, Clone)]
pub struct CandidateSpace<'a> {
    parameters: &'a ParameterSet,
    radices: Vec<usize>,
    size: usize,
}

impl<'a> CandidateSpace<'a> {
    pub fn new(parameters: &'a ParameterSet) -> Result<Self, SpaceError> {
        if parameters.is_empty() {
            return Err(InputError::Empty.into());
        }
        let radices: Vec<usize> = parameters.iter().map(|p| p.values.len()).collect();
        let size = candidate_count(parameters).ok_or(SpaceError::Overflow)?;
        Ok(Self {
            parameters,
            radices,
            size,
        })
    }

    /// Number of candidates (product of all domain sizes).
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn radices(&self) -> &[usize] {
        &self.radices
    }

    pub fn parameters(&self) -> &'a ParameterSet {
        self.parameters
    }

    /// Value indices for the candidate at `index`, written into `out`.
    pub fn decode_into(&self, mut index: usize, out: &mut [usize]) {
        for (slot, radix) in out.iter_mut().zip(&self.radices).rev() {
            *slot = index % radix;
            index /= radix;
        }
    }

    pub fn decode(&self, index: usize) -> Vec<usize> {
        let mut out = vec![0; self.radices.len()];
        self.decode_into(index, &mut out);
        out
    }

    pub fn candidate(&self, index: usize) -> Candidate {
        let digits = self.decode(index);
        Candidate {
            values: self
                .parameters
                .iter()
                .zip(digits)
                .map(|(p, d)| p.values[d].clone())
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Candidate> + '_ {
        (0..self.size).map(move |i| self.candidate(i))
    }
}

/// Product of domain sizes, or `None` on overflow.
pub fn candidate_count(parameters: &ParameterSet) -> Option<usize> {
    parameters
        .iter()
        .try_fold(1usize, |acc, p| acc.checked_mul(p.values.len()))
}

/// Dense numbering of the pair universe over a candidate space.
///
/// Slots are laid out per declared parameter pair `(i, j)`, `i < j`, as
/// `offset(i, j) + a * |d_j| + b`. A slot holds the id of the universe pair
/// it realizes, if any. Pairs that no slot maps to (unknown parameter or
/// value) keep their id but can never be covered.
#[derive(Debug, Clone)]
pub struct PairIndex {
    pairs: Vec<Pair>,
    slots: Vec<Option<usize>>,
    offsets: Vec<usize>,
    radices: Vec<usize>,
    realizable: usize,
}

impl PairIndex {
    pub fn new(space: &CandidateSpace<'_>, universe: &PairUniverse) -> Self {
        let radices = space.radices().to_vec();
        let n = radices.len();

        let mut offsets = vec![0; n * n];
        let mut next = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                offsets[i * n + j] = next;
                next += radices[i] * radices[j];
            }
        }

        let parameters = space.parameters();
        let positions: HashMap<&str, usize> = parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.as_str(), i))
            .collect();

        let mut slots = vec![None; next];
        let mut realizable = 0;
        let pairs: Vec<Pair> = universe.iter().cloned().collect();

        for (id, pair) in pairs.iter().enumerate() {
            let locate = |parameter: &str, value: &str| -> Option<(usize, usize)> {
                let pos = *positions.get(parameter)?;
                let val = parameters.as_slice()[pos].value_index(value)?;
                Some((pos, val))
            };
            let (Some(x), Some(y)) = (
                locate(&pair.first.parameter, &pair.first.value),
                locate(&pair.second.parameter, &pair.second.value),
            ) else {
                continue;
            };
            if x.0 == y.0 {
                continue;
            }
            let ((i, a), (j, b)) = if x.0 < y.0 { (x, y) } else { (y, x) };
            let slot = offsets[i * n + j] + a * radices[j] + b;
            if slots[slot].is_none() {
                slots[slot] = Some(id);
                realizable += 1;
            }
        }

        Self {
            pairs,
            slots,
            offsets,
            radices,
            realizable,
        }
    }

    /// Number of pairs in the universe.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of universe pairs some candidate can realize.
    pub fn realizable(&self) -> usize {
        self.realizable
    }

    pub fn pair(&self, id: usize) -> &Pair {
        &self.pairs[id]
    }

    /// Append the ids of universe pairs realized by a decoded candidate.
    pub fn realized_by(&self, digits: &[usize], out: &mut Vec<usize>) {
        let n = self.radices.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let slot = self.offsets[i * n + j] + digits[i] * self.radices[j] + digits[j];
                if let Some(id) = self.slots[slot] {
                    out.push(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::pairs::build_pairs;
    use pairwise_ir::{Assignment, Parameter};

    fn set() -> ParameterSet {
        ParameterSet::from_parameters(vec![
            Parameter::new("P1", ["a", "b"]),
            Parameter::new("P2", ["c", "d", "e"]),
            Parameter::new("P3", ["f", "g"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_size_is_product() {
        let set = set();
        let space = CandidateSpace::new(&set).unwrap();
        assert_eq!(space.size(), 12);
        assert_eq!(space.iter().count(), 12);
    }

    #[test]
    fn test_enumeration_order_last_fastest() {
        let set = set();
        let space = CandidateSpace::new(&set).unwrap();
        assert_eq!(space.candidate(0), Candidate::new(["a", "c", "f"]));
        assert_eq!(space.candidate(1), Candidate::new(["a", "c", "g"]));
        assert_eq!(space.candidate(2), Candidate::new(["a", "d", "f"]));
        assert_eq!(space.candidate(11), Candidate::new(["b", "e", "g"]));
    }

    #[test]
    fn test_empty_set_rejected() {
        let empty = ParameterSet::new();
        assert!(matches!(
            CandidateSpace::new(&empty),
            Err(SpaceError::Input(InputError::Empty))
        ));
    }

    #[test]
    fn test_overflow_detected() {
        let huge: Vec<Parameter> = (0..80)
            .map(|i| Parameter::new(format!("P{i}"), ["0", "1", "2", "3"]))
            .collect();
        let set = ParameterSet::from_parameters(huge).unwrap();
        assert!(candidate_count(&set).is_none());
        assert!(matches!(CandidateSpace::new(&set), Err(SpaceError::Overflow)));
    }

    #[test]
    fn test_every_candidate_realizes_one_pair_per_parameter_pair() {
        let set = set();
        let space = CandidateSpace::new(&set).unwrap();
        let universe = build_pairs(&set).unwrap();
        let index = PairIndex::new(&space, &universe);
        assert_eq!(index.len(), universe.len());
        assert_eq!(index.realizable(), universe.len());

        let mut ids = Vec::new();
        for c in 0..space.size() {
            ids.clear();
            index.realized_by(&space.decode(c), &mut ids);
            assert_eq!(ids.len(), 3);
        }
    }

    #[test]
    fn test_realized_ids_match_pairs() {
        let set = set();
        let space = CandidateSpace::new(&set).unwrap();
        let universe = build_pairs(&set).unwrap();
        let index = PairIndex::new(&space, &universe);

        let mut ids = Vec::new();
        index.realized_by(&space.decode(0), &mut ids);
        let realized: Vec<&Pair> = ids.iter().map(|&id| index.pair(id)).collect();
        let expected = Pair::new(Assignment::new("P1", "a"), Assignment::new("P3", "f")).unwrap();
        assert!(realized.contains(&&expected));
    }

    #[test]
    fn test_unknown_value_is_not_realizable() {
        let set = set();
        let space = CandidateSpace::new(&set).unwrap();
        let mut pairs: Vec<Pair> = build_pairs(&set).unwrap().iter().cloned().collect();
        pairs.push(Pair::new(Assignment::new("P1", "zzz"), Assignment::new("P2", "c")).unwrap());
        let universe = PairUniverse::from_pairs(pairs);
        let index = PairIndex::new(&space, &universe);
        assert_eq!(index.len(), 17);
        assert_eq!(index.realizable(), 16);
    }
}
