//! npm-style range grammar
//!
//! Supports:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact match
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0, special cases for 0.x)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `1`, `*` - wildcards and partials
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - `>=1.0.0 <2.0.0` (AND) and `^1.0.0 || ^2.0.0` (OR)
//!
//! A prerelease version only satisfies a comparator set if one of its
//! comparators names a prerelease on the same `major.minor.patch` tuple.
//!
//! Comparators keep the precision they were written with, so a range can be
//! re-rendered for a new version without changing its shape (`^1.0` -> `^1.2`).

use semver::{BuildMetadata, Prerelease, Version};

/// Parse a full version, accepting a leading `=` or `v` and ignoring build metadata
pub fn parse_version(input: &str) -> Option<Version> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    let mut version = Version::parse(trimmed).ok()?;
    version.build = BuildMetadata::EMPTY;
    Some(version)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Cmp {
    fn holds(self, version: &Version, bound: &Version) -> bool {
        match self {
            Cmp::Eq => version == bound,
            Cmp::Gt => version > bound,
            Cmp::Gte => version >= bound,
            Cmp::Lt => version < bound,
            Cmp::Lte => version <= bound,
        }
    }
}

/// A version as written in a range: possibly partial or wildcarded
#[derive(Debug, Clone, PartialEq, Eq)]
struct Partial {
    numbers: [Option<u64>; 3],
    /// Number of dot-separated components written
    written: usize,
    wildcard: char,
    pre: Prerelease,
    v_prefix: bool,
}

impl Partial {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (v_prefix, rest) = match input.strip_prefix('v').or_else(|| input.strip_prefix('V')) {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        if rest.is_empty() {
            return None;
        }

        let core = rest.split('+').next().unwrap_or(rest);
        let (core, pre) = match core.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (core, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return None;
        }

        let mut numbers = [None; 3];
        let mut wildcard = None;
        for (idx, part) in parts.iter().enumerate() {
            match *part {
                "x" | "X" | "*" => {
                    wildcard.get_or_insert(part.chars().next().unwrap_or('x'));
                }
                _ => {
                    // Nothing concrete may follow a wildcard
                    if wildcard.is_some() || !part.chars().all(|c| c.is_ascii_digit()) {
                        return None;
                    }
                    numbers[idx] = Some(part.parse::<u64>().ok()?);
                }
            }
        }

        let pre = match pre {
            Some(pre) => {
                if numbers[2].is_none() {
                    return None;
                }
                Prerelease::new(pre).ok()?
            }
            None => Prerelease::EMPTY,
        };

        Some(Self {
            numbers,
            written: parts.len(),
            wildcard: wildcard.unwrap_or('x'),
            pre,
            v_prefix,
        })
    }

    fn major(&self) -> Option<u64> {
        self.numbers[0]
    }

    fn is_full(&self) -> bool {
        self.numbers.iter().all(Option::is_some)
    }

    /// Lowest version the partial can stand for
    fn floor(&self) -> Version {
        Version {
            major: self.numbers[0].unwrap_or(0),
            minor: self.numbers[1].unwrap_or(0),
            patch: self.numbers[2].unwrap_or(0),
            pre: self.pre.clone(),
            build: BuildMetadata::EMPTY,
        }
    }

    /// First version past the partial when truncated to its concrete components
    fn ceiling(&self) -> Version {
        let major = self.numbers[0].unwrap_or(0);
        match (self.numbers[1], self.numbers[2]) {
            (None, _) => Version::new(major + 1, 0, 0),
            (Some(minor), None) => Version::new(major, minor + 1, 0),
            (Some(minor), Some(patch)) => Version::new(major, minor, patch + 1),
        }
    }

    /// Renders `version` with this partial's shape; components from
    /// `zero_from` on are written as zero
    fn render(&self, version: &Version, zero_from: usize) -> String {
        let values = [version.major, version.minor, version.patch];
        let parts: Vec<String> = (0..self.written)
            .map(|idx| {
                if self.numbers[idx].is_none() {
                    self.wildcard.to_string()
                } else if idx >= zero_from {
                    "0".to_string()
                } else {
                    values[idx].to_string()
                }
            })
            .collect();

        let mut out = String::new();
        if self.v_prefix {
            out.push('v');
        }
        out.push_str(&parts.join("."));
        if self.written == 3 && self.is_full() && zero_from >= 3 && !version.pre.is_empty() {
            out.push('-');
            out.push_str(version.pre.as_str());
        }
        out
    }

    /// Renders the smallest exclusive upper bound of the same shape above `version`
    fn render_ceiling(&self, version: &Version) -> String {
        let last_significant = (0..self.written)
            .rev()
            .find(|&idx| matches!(self.numbers[idx], Some(n) if n != 0))
            .unwrap_or(0);
        let values = [version.major, version.minor, version.patch];
        let parts: Vec<String> = (0..self.written)
            .map(|idx| {
                if self.numbers[idx].is_none() {
                    self.wildcard.to_string()
                } else if idx < last_significant {
                    values[idx].to_string()
                } else if idx == last_significant {
                    (values[idx] + 1).to_string()
                } else {
                    "0".to_string()
                }
            })
            .collect();
        let prefix = if self.v_prefix { "v" } else { "" };
        format!("{}{}", prefix, parts.join("."))
    }

    fn names_prerelease_of(&self, version: &Version) -> bool {
        !self.pre.is_empty()
            && self.numbers == [Some(version.major), Some(version.minor), Some(version.patch)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    /// No operator written
    Exact,
    Eq,
    Caret,
    Tilde,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Comparator {
    Primitive {
        op: Op,
        partial: Partial,
        raw: String,
    },
    Hyphen {
        from: Partial,
        to: Partial,
        from_raw: String,
        raw: String,
    },
}

impl Comparator {
    fn parse(raw: &str) -> Option<Self> {
        let (op, rest) = if let Some(rest) = raw.strip_prefix(">=") {
            (Op::Gte, rest)
        } else if let Some(rest) = raw.strip_prefix("<=") {
            (Op::Lte, rest)
        } else if let Some(rest) = raw.strip_prefix("~>") {
            (Op::Tilde, rest)
        } else if let Some(rest) = raw.strip_prefix('^') {
            (Op::Caret, rest)
        } else if let Some(rest) = raw.strip_prefix('~') {
            (Op::Tilde, rest)
        } else if let Some(rest) = raw.strip_prefix('>') {
            (Op::Gt, rest)
        } else if let Some(rest) = raw.strip_prefix('<') {
            (Op::Lt, rest)
        } else if let Some(rest) = raw.strip_prefix('=') {
            (Op::Eq, rest)
        } else {
            (Op::Exact, raw)
        };

        Some(Comparator::Primitive {
            op,
            partial: Partial::parse(rest)?,
            raw: raw.to_string(),
        })
    }

    fn raw(&self) -> &str {
        match self {
            Comparator::Primitive { raw, .. } | Comparator::Hyphen { raw, .. } => raw,
        }
    }

    /// Desugars the comparator into plain bounds; an empty list matches everything
    fn bounds(&self) -> Vec<(Cmp, Version)> {
        match self {
            Comparator::Hyphen { from, to, .. } => {
                let mut bounds = Vec::new();
                if from.major().is_some() {
                    bounds.push((Cmp::Gte, from.floor()));
                }
                if to.major().is_some() {
                    if to.is_full() {
                        bounds.push((Cmp::Lte, to.floor()));
                    } else {
                        bounds.push((Cmp::Lt, to.ceiling()));
                    }
                }
                bounds
            }
            Comparator::Primitive { op, partial, .. } => {
                let Some(major) = partial.major() else {
                    return match op {
                        Op::Gt | Op::Lt => vec![(Cmp::Lt, Version::new(0, 0, 0))],
                        _ => Vec::new(),
                    };
                };
                let floor = partial.floor();
                match op {
                    Op::Exact | Op::Eq if partial.is_full() => vec![(Cmp::Eq, floor)],
                    Op::Exact | Op::Eq => vec![(Cmp::Gte, floor), (Cmp::Lt, partial.ceiling())],
                    Op::Caret => {
                        let upper = match (partial.numbers[1], partial.numbers[2]) {
                            _ if major > 0 => Version::new(major + 1, 0, 0),
                            (None, _) => Version::new(1, 0, 0),
                            (Some(minor), _) if minor > 0 => Version::new(0, minor + 1, 0),
                            (Some(_), None) => Version::new(0, 1, 0),
                            (Some(_), Some(patch)) => Version::new(0, 0, patch + 1),
                        };
                        vec![(Cmp::Gte, floor), (Cmp::Lt, upper)]
                    }
                    Op::Tilde => {
                        let upper = match partial.numbers[1] {
                            None => Version::new(major + 1, 0, 0),
                            Some(minor) => Version::new(major, minor + 1, 0),
                        };
                        vec![(Cmp::Gte, floor), (Cmp::Lt, upper)]
                    }
                    Op::Gte => vec![(Cmp::Gte, floor)],
                    Op::Gt if partial.is_full() => vec![(Cmp::Gt, floor)],
                    Op::Gt => vec![(Cmp::Gte, partial.ceiling())],
                    Op::Lte if partial.is_full() => vec![(Cmp::Lte, floor)],
                    Op::Lte => vec![(Cmp::Lt, partial.ceiling())],
                    Op::Lt => vec![(Cmp::Lt, floor)],
                }
            }
        }
    }

    fn satisfied_by(&self, version: &Version) -> bool {
        self.bounds()
            .iter()
            .all(|(cmp, bound)| cmp.holds(version, bound))
    }

    /// True if the comparator rules `version` out from below
    fn excludes_from_below(&self, version: &Version) -> bool {
        self.bounds().iter().any(|(cmp, bound)| match cmp {
            Cmp::Gte | Cmp::Eq => version < bound,
            Cmp::Gt => version <= bound,
            Cmp::Lt | Cmp::Lte => false,
        })
    }

    fn lower_bound(&self) -> Option<Version> {
        self.bounds()
            .into_iter()
            .filter(|(cmp, _)| matches!(cmp, Cmp::Gte | Cmp::Gt | Cmp::Eq))
            .map(|(_, bound)| bound)
            .max()
    }

    fn names_prerelease_of(&self, version: &Version) -> bool {
        match self {
            Comparator::Primitive { partial, .. } => partial.names_prerelease_of(version),
            Comparator::Hyphen { from, to, .. } => {
                from.names_prerelease_of(version) || to.names_prerelease_of(version)
            }
        }
    }

    fn is_floor(&self) -> bool {
        matches!(
            self,
            Comparator::Primitive {
                op: Op::Caret | Op::Tilde | Op::Gte | Op::Gt,
                ..
            }
        )
    }

    fn is_ceiling(&self) -> bool {
        matches!(
            self,
            Comparator::Primitive {
                op: Op::Lt | Op::Lte,
                ..
            } | Comparator::Hyphen { .. }
        )
    }

    fn render_replace(&self, version: &Version) -> String {
        match self {
            Comparator::Hyphen { to, from_raw, .. } => {
                format!("{} - {}", from_raw, to.render(version, 3))
            }
            Comparator::Primitive { op, partial, .. } => match op {
                Op::Caret => {
                    let significant = if version.major > 0 {
                        0
                    } else if version.minor > 0 {
                        1
                    } else {
                        2
                    };
                    format!("^{}", partial.render(version, significant + 1))
                }
                Op::Tilde => {
                    let zero_from = if partial.written >= 2 { 2 } else { 1 };
                    format!("~{}", partial.render(version, zero_from))
                }
                Op::Exact => partial.render(version, 3),
                Op::Eq => format!("={}", partial.render(version, 3)),
                Op::Gte | Op::Gt => format!(">={}", partial.render(version, 3)),
                Op::Lte => format!("<={}", partial.render(version, 3)),
                Op::Lt => format!("<{}", partial.render_ceiling(version)),
            },
        }
    }

    fn render_bump(&self, version: &Version) -> String {
        match self {
            Comparator::Primitive { op, partial, .. } => match op {
                Op::Caret => format!("^{}", partial.render(version, 3)),
                Op::Tilde => format!("~{}", partial.render(version, 3)),
                _ => format!(">={}", partial.render(version, 3)),
            },
            Comparator::Hyphen { .. } => self.render_replace(version),
        }
    }

    fn render(&self, version: &Version, bump: bool) -> String {
        if bump && self.is_floor() {
            self.render_bump(version)
        } else if self.satisfied_by(version) {
            self.raw().to_string()
        } else {
            self.render_replace(version)
        }
    }
}

fn is_operator(token: &str) -> bool {
    matches!(token, ">=" | "<=" | ">" | "<" | "=" | "^" | "~" | "~>")
}

/// Comparators joined by whitespace; all must hold
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComparatorSet {
    comparators: Vec<Comparator>,
    raw: String,
}

impl ComparatorSet {
    fn parse(input: &str) -> Option<Self> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        let mut comparators = Vec::new();
        let mut idx = 0;
        while idx < tokens.len() {
            if idx + 2 < tokens.len() && tokens[idx + 1] == "-" {
                comparators.push(Comparator::Hyphen {
                    from: Partial::parse(tokens[idx])?,
                    to: Partial::parse(tokens[idx + 2])?,
                    from_raw: tokens[idx].to_string(),
                    raw: format!("{} - {}", tokens[idx], tokens[idx + 2]),
                });
                idx += 3;
                continue;
            }

            let mut raw = tokens[idx].to_string();
            // `>= 1.0.0` is written with a gap after the operator
            if is_operator(tokens[idx]) {
                raw.push_str(tokens.get(idx + 1)?);
                idx += 1;
            }
            comparators.push(Comparator::parse(&raw)?);
            idx += 1;
        }

        Some(Self {
            comparators,
            raw: input.trim().to_string(),
        })
    }

    fn satisfies(&self, version: &Version) -> bool {
        if !self.comparators.iter().all(|c| c.satisfied_by(version)) {
            return false;
        }
        version.pre.is_empty()
            || self
                .comparators
                .iter()
                .any(|c| c.names_prerelease_of(version))
    }

    fn render(&self, version: &Version, bump: bool) -> String {
        self.comparators
            .iter()
            .map(|c| c.render(version, bump))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A parsed range: comparator sets joined by `||`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    alternatives: Vec<ComparatorSet>,
}

impl Range {
    /// Parse a range; returns None when any part is malformed
    pub fn parse(input: &str) -> Option<Self> {
        let alternatives: Option<Vec<ComparatorSet>> =
            input.split("||").map(ComparatorSet::parse).collect();
        Some(Self {
            alternatives: alternatives?,
        })
    }

    pub fn is_or(&self) -> bool {
        self.alternatives.len() > 1
    }

    /// Check if a version satisfies this range
    pub fn satisfies(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|set| set.satisfies(version))
    }

    /// True if `version` is below every version the range admits
    pub fn is_above(&self, version: &Version) -> bool {
        self.alternatives.iter().all(|set| {
            set.comparators
                .iter()
                .any(|c| c.excludes_from_below(version))
        })
    }

    /// Lowest version admitted by the first alternative, if it has a floor
    pub fn floor(&self) -> Option<Version> {
        self.alternatives
            .first()?
            .comparators
            .iter()
            .filter_map(Comparator::lower_bound)
            .max()
    }

    /// True if a single-alternative range carries an upper bound
    pub fn has_ceiling(&self) -> bool {
        !self.is_or()
            && self
                .alternatives
                .iter()
                .flat_map(|set| set.comparators.iter())
                .any(Comparator::is_ceiling)
    }

    /// Renders the range so it admits `version`, changing as little as possible
    pub fn replace(&self, version: &Version) -> String {
        match self.alternatives.last() {
            Some(last) => last.render(version, false),
            None => String::new(),
        }
    }

    /// Renders the range with its floor raised to `version`
    pub fn bump(&self, version: &Version) -> String {
        let target = self
            .alternatives
            .iter()
            .position(|set| set.satisfies(version))
            .unwrap_or(self.alternatives.len().saturating_sub(1));
        self.alternatives
            .iter()
            .enumerate()
            .map(|(idx, set)| {
                if idx == target {
                    set.render(version, true)
                } else {
                    set.raw.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" || ")
    }
}
