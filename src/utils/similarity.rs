/// Scores how closely `option` matches `target`: positional character matches
/// as a percentage of the option's length.
pub fn score(target: &str, option: &str) -> usize {
    let target = target.to_lowercase();
    let option = option.to_lowercase();
    let len = option.chars().count().max(1);
    let hits = option
        .chars()
        .zip(target.chars())
        .filter(|(a, b)| a == b)
        .count();
    hits * 100 / len
}

/// Index of the option closest to `target`; the first one wins on ties.
pub fn best_match<S: AsRef<str>>(target: &str, options: &[S]) -> Option<usize> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }

    options
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, usize)>, (idx, opt)| {
            let s = score(target, opt.as_ref());
            match best {
                Some((_, top)) if top >= s => best,
                _ => Some((idx, s)),
            }
        })
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_counts_positional_matches() {
        assert_eq!(score("carl", "carlotta"), 50);
        assert_eq!(score("CARLOTTA", "carlotta"), 100);
        assert_eq!(score("x", ""), 0);
    }

    #[test]
    fn best_match_prefers_the_closest_option() {
        let options = ["jinhsi", "changli", "carlotta"];
        assert_eq!(best_match("carlota", &options), Some(2));
        assert_eq!(best_match("chang", &options), Some(1));
        assert_eq!(best_match("   ", &options), None);
    }

    #[test]
    fn ties_keep_the_first_option() {
        assert_eq!(best_match("zz", &["ab", "cd"]), Some(0));
    }
}
