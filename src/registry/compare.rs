//! Version string ordering.
//!
//! Versions are `[epoch:]rest`. The rest is compared as alternating runs of
//! non-digits and digits: digit runs numerically, other runs character by
//! character with letters before punctuation and `~` before everything,
//! including the end of the string.

use std::cmp::Ordering;

pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (epoch_a, rest_a) = split_epoch(a);
    let (epoch_b, rest_b) = split_epoch(b);

    compare_numeric(epoch_a, epoch_b).then_with(|| compare_segments(rest_a, rest_b))
}

/// Split off a numeric epoch, kept as digits so any length compares exactly.
fn split_epoch(version: &str) -> (&str, &str) {
    match version.split_once(':') {
        Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) => {
            (epoch, rest)
        }
        _ => ("", version),
    }
}

fn compare_segments(mut a: &str, mut b: &str) -> Ordering {
    while !a.is_empty() || !b.is_empty() {
        let (text_a, rest_a) = split_leading(a, |c| !c.is_ascii_digit());
        let (text_b, rest_b) = split_leading(b, |c| !c.is_ascii_digit());

        let ord = compare_text(text_a, text_b);
        if ord != Ordering::Equal {
            return ord;
        }

        let (num_a, rest_a) = split_leading(rest_a, |c| c.is_ascii_digit());
        let (num_b, rest_b) = split_leading(rest_b, |c| c.is_ascii_digit());

        let ord = compare_numeric(num_a, num_b);
        if ord != Ordering::Equal {
            return ord;
        }

        a = rest_a;
        b = rest_b;
    }

    Ordering::Equal
}

fn split_leading(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let idx = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    s.split_at(idx)
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_text(a: &str, b: &str) -> Ordering {
    let mut chars_a = a.chars();
    let mut chars_b = b.chars();

    loop {
        let (x, y) = (chars_a.next(), chars_b.next());
        if x.is_none() && y.is_none() {
            return Ordering::Equal;
        }
        let ord = weight(x).cmp(&weight(y));
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn weight(c: Option<char>) -> i64 {
    match c {
        None => 0,
        Some('~') => -1,
        Some(c) if c.is_ascii_alphabetic() => c as i64,
        Some(c) => c as i64 + 256,
    }
}
