//! Pair universe construction.
//!
//! For every unordered pair of distinct parameters (names taken in sorted
//! order), every combination of their values is a required pair.

use std::collections::BTreeSet;

use serde::Serialize;

use pairwise_ir::{Assignment, InputError, Pair, ParameterSet};

/// The exhaustive set of required 2-way combinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PairUniverse {
    pairs: BTreeSet<Pair>,
}

impl PairUniverse {
    pub fn from_pairs(pairs: impl IntoIterator<Item = Pair>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, pair: &Pair) -> bool {
        self.pairs.contains(pair)
    }

    pub fn iter(&self) -> std::collections::btree_set::Iter<'_, Pair> {
        self.pairs.iter()
    }

    pub fn as_set(&self) -> &BTreeSet<Pair> {
        &self.pairs
    }
}

impl<'a> IntoIterator for &'a PairUniverse {
    type Item = &'a Pair;
    type IntoIter = std::collections::btree_set::Iter<'a, Pair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Build the pair universe for a parameter set.
///
/// The result depends only on the names and domains, not on declaration
/// order.
pub fn build_pairs(parameters: &ParameterSet) -> Result<PairUniverse, InputError> {
    if parameters.is_empty() {
        return Err(InputError::Empty);
    }

    let names = parameters.sorted_names();
    let mut pairs = BTreeSet::new();

    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            let (Some(p1), Some(p2)) = (parameters.get(names[i]), parameters.get(names[j])) else {
                continue;
            };
            for v1 in &p1.values {
                for v2 in &p2.values {
                    pairs.insert(Pair {
                        first: Assignment::new(p1.name.clone(), v1.clone()),
                        second: Assignment::new(p2.name.clone(), v2.clone()),
                    });
                }
            }
        }
    }

    log::debug!(
        "built pair universe: {} parameters, {} pairs",
        parameters.len(),
        pairs.len()
    );

    Ok(PairUniverse { pairs })
}

/// Expected universe size: sum over unordered parameter pairs of |d1| x |d2|.
pub fn universe_size(parameters: &ParameterSet) -> usize {
    let sizes: Vec<usize> = parameters.iter().map(|p| p.values.len()).collect();
    let mut total = 0;
    for i in 0..sizes.len() {
        for j in (i + 1)..sizes.len() {
            total += sizes[i] * sizes[j];
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwise_ir::Parameter;

    fn three_binary() -> ParameterSet {
        ParameterSet::from_parameters(vec![
            Parameter::new("P1", ["a", "b"]),
            Parameter::new("P2", ["c", "d"]),
            Parameter::new("P3", ["e", "f"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_three_binary_has_twelve_pairs() {
        let universe = build_pairs(&three_binary()).unwrap();
        assert_eq!(universe.len(), 12);
        assert_eq!(universe_size(&three_binary()), 12);
    }

    #[test]
    fn test_pairs_use_sorted_names() {
        let set = ParameterSet::from_parameters(vec![
            Parameter::new("zeta", ["1", "2"]),
            Parameter::new("alpha", ["x", "y", "z"]),
        ])
        .unwrap();
        let universe = build_pairs(&set).unwrap();
        assert_eq!(universe.len(), 6);
        for pair in &universe {
            assert_eq!(pair.first.parameter, "alpha");
            assert_eq!(pair.second.parameter, "zeta");
        }
    }

    #[test]
    fn test_independent_of_declaration_order() {
        let forward = three_binary();
        let reversed = ParameterSet::from_parameters(forward.iter().rev().cloned().collect())
            .unwrap();
        assert_eq!(build_pairs(&forward).unwrap(), build_pairs(&reversed).unwrap());
    }

    #[test]
    fn test_pairs_never_share_a_parameter() {
        let universe = build_pairs(&three_binary()).unwrap();
        assert!(universe
            .iter()
            .all(|p| p.first.parameter != p.second.parameter));
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = build_pairs(&ParameterSet::new()).unwrap_err();
        assert!(matches!(err, InputError::Empty));
    }

    #[test]
    fn test_single_parameter_has_no_pairs() {
        let set = ParameterSet::from_parameters(vec![Parameter::new("P1", ["a", "b"])]).unwrap();
        assert!(build_pairs(&set).unwrap().is_empty());
    }
}
