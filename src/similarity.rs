use std::collections::HashMap;

/// Sequences at least this long get their over-represented characters dropped
/// from the lookup index, the same heuristic a Ratcliff/Obershelp matcher
/// uses to stay fast on long noisy input.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Longest-matching-block sequence comparison (Ratcliff/Obershelp).
///
/// `a` is the candidate and `b` the probe; the index is built over `b`, so
/// tie-breaking between equally long blocks prefers the earliest block in `a`.
pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        let b: Vec<char> = b.chars().collect();
        Self {
            a: a.chars().collect(),
            b2j: index_sequence(&b),
            b,
        }
    }

    /// 2·M / T where M is the number of matched characters and T the total
    /// length of both sequences. Two empty sequences compare as identical.
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * self.matched_chars() as f64 / total as f64
    }

    /// Upper bound on `ratio` from character multiset intersection.
    pub fn quick_ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let mut available: HashMap<char, isize> = HashMap::new();
        for ch in &self.b {
            *available.entry(*ch).or_default() += 1;
        }
        let mut matches = 0usize;
        for ch in &self.a {
            let slot = available.entry(*ch).or_default();
            if *slot > 0 {
                matches += 1;
            }
            *slot -= 1;
        }
        2.0 * matches as f64 / total as f64
    }

    /// Upper bound on `ratio` from the lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        let (la, lb) = (self.a.len(), self.b.len());
        if la + lb == 0 {
            return 1.0;
        }
        2.0 * la.min(lb) as f64 / (la + lb) as f64
    }

    fn matched_chars(&self) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }

    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);
        let mut run_lengths: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next_runs = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let previous = match j.checked_sub(1) {
                        Some(prev) => run_lengths.get(&prev).copied().unwrap_or(0),
                        None => 0,
                    };
                    let size = previous + 1;
                    next_runs.insert(j, size);
                    if size > best_size {
                        best_i = i + 1 - size;
                        best_j = j + 1 - size;
                        best_size = size;
                    }
                }
            }
            run_lengths = next_runs;
        }

        // Characters dropped from the index can still extend a block.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }
        (best_i, best_j, best_size)
    }
}

fn index_sequence(b: &[char]) -> HashMap<char, Vec<usize>> {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, ch) in b.iter().enumerate() {
        b2j.entry(*ch).or_default().push(j);
    }
    if b.len() >= AUTOJUNK_MIN_LEN {
        let limit = b.len() / 100 + 1;
        b2j.retain(|_, positions| positions.len() <= limit);
    }
    b2j
}

pub fn ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

/// Returns the single candidate most similar to `word`, provided its ratio
/// reaches `cutoff`. Equal ratios resolve to the lexicographically greatest
/// candidate.
pub fn closest_match<'a, I>(word: &str, candidates: I, cutoff: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(f64, &'a str)> = None;
    for candidate in candidates {
        let matcher = SequenceMatcher::new(candidate, word);
        if matcher.real_quick_ratio() < cutoff || matcher.quick_ratio() < cutoff {
            continue;
        }
        let score = matcher.ratio();
        if score < cutoff {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_score, best_name)) => {
                score > best_score || (score == best_score && candidate > best_name)
            }
        };
        if better {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, name)| name)
}
