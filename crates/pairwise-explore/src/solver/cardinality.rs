//! Totalizer encoding of boolean sums.
//!
//! `totalizer(inputs)` returns unary outputs `o_1..o_w` where `o_k` is
//! forced true whenever at least `k` inputs are true. With
//! `bidirectional`, `o_k` is also forced false when fewer than `k` inputs
//! are true, which makes the outputs an exact unary count.
//!
//! A `cap` truncates the outputs to `o_1..o_cap`; any count at or above the
//! cap sets `o_cap`. Capped totalizers are only valid upward, which is all
//! an upper bound (`sum <= k` as `!o_{k+1}`) needs.

use varisat::Lit;

pub type CnfClauses = Vec<Vec<Lit>>;

/// Build a totalizer over `inputs`.
///
/// `fresh` allocates new literals; generated clauses are appended to
/// `clauses`. `cap == None` keeps all `inputs.len()` outputs.
pub fn totalizer(
    inputs: &[Lit],
    cap: Option<usize>,
    bidirectional: bool,
    fresh: &mut impl FnMut() -> Lit,
    clauses: &mut CnfClauses,
) -> Vec<Lit> {
    let cap = cap.unwrap_or(inputs.len()).max(1);
    debug_assert!(!bidirectional || cap >= inputs.len());
    build(inputs, cap, bidirectional, fresh, clauses)
}

fn build(
    inputs: &[Lit],
    cap: usize,
    bidirectional: bool,
    fresh: &mut impl FnMut() -> Lit,
    clauses: &mut CnfClauses,
) -> Vec<Lit> {
    match inputs.len() {
        0 => Vec::new(),
        1 => vec![inputs[0]],
        n => {
            let (left, right) = inputs.split_at(n / 2);
            let left = build(left, cap, bidirectional, fresh, clauses);
            let right = build(right, cap, bidirectional, fresh, clauses);
            merge(&left, &right, cap, bidirectional, fresh, clauses)
        }
    }
}

fn merge(
    left: &[Lit],
    right: &[Lit],
    cap: usize,
    bidirectional: bool,
    fresh: &mut impl FnMut() -> Lit,
    clauses: &mut CnfClauses,
) -> Vec<Lit> {
    let width = (left.len() + right.len()).min(cap);
    let out: Vec<Lit> = (0..width).map(|_| fresh()).collect();

    // left >= i and right >= j  =>  out >= i + j
    for i in 0..=left.len() {
        for j in 0..=right.len() {
            let k = i + j;
            if k == 0 {
                continue;
            }
            let mut clause = Vec::with_capacity(3);
            if i > 0 {
                clause.push(!left[i - 1]);
            }
            if j > 0 {
                clause.push(!right[j - 1]);
            }
            clause.push(out[k.min(width) - 1]);
            clauses.push(clause);
        }
    }

    if bidirectional {
        // left < i + 1 and right < j + 1  =>  out < i + j + 1
        for i in 0..=left.len() {
            for j in 0..=right.len() {
                let k = i + j + 1;
                if k > width {
                    continue;
                }
                let mut clause = Vec::with_capacity(3);
                if i < left.len() {
                    clause.push(left[i]);
                }
                if j < right.len() {
                    clause.push(right[j]);
                }
                clause.push(!out[k - 1]);
                clauses.push(clause);
            }
        }
    }

    out
}
