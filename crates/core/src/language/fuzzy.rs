//! Jaro-Winkler similarity and a single-slip edit check, over Unicode scalar
//! values.

const PREFIX_SCALE: f64 = 0.1;
const MAX_PREFIX: usize = 4;

/// Similarity in `0.0..=1.0`; `1.0` means identical.
pub(crate) fn jaro_winkler(a: &str, b: &str) -> f64 {
    let jaro = jaro(a, b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .take(MAX_PREFIX)
        .count();
    jaro + prefix as f64 * PREFIX_SCALE * (1.0 - jaro)
}

/// True when `a` turns into `b` by inserting or deleting one character, or by
/// swapping two adjacent ones. Substitutions do not count: one changed letter
/// often lands on a different word.
pub(crate) fn one_slip_apart(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    match long.len() - short.len() {
        0 => {
            let diffs: Vec<usize> = (0..short.len()).filter(|&i| short[i] != long[i]).collect();
            matches!(diffs.as_slice(), [i, j]
                if *j == i + 1 && short[*i] == long[*j] && short[*j] == long[*i])
        }
        1 => {
            let split = short
                .iter()
                .zip(long.iter())
                .take_while(|(x, y)| x == y)
                .count();
            short[split..] == long[split + 1..]
        }
        _ => false,
    }
}

fn jaro(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut b_taken = vec![false; b.len()];
    let mut a_matches = Vec::with_capacity(a.len());

    for (i, ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_taken[j] && b[j] == *ca {
                b_taken[j] = true;
                a_matches.push(*ca);
                break;
            }
        }
    }

    if a_matches.is_empty() {
        return 0.0;
    }

    let b_matches = b
        .iter()
        .zip(&b_taken)
        .filter(|(_, taken)| **taken)
        .map(|(c, _)| *c);
    let half_transpositions = a_matches
        .iter()
        .zip(b_matches)
        .filter(|(x, y)| **x != *y)
        .count() as f64
        / 2.0;

    let m = a_matches.len() as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - half_transpositions) / m) / 3.0
}
