//! Letter labels for move units.
//!
//! Labels are bijective base-26 numerals: `A..Z`, then `AA..AZ`, `BA..`.
//! There is no zero digit, so every position has exactly one label and
//! labels compare in position order by `(length, text)`.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("label is empty")]
    Empty,
    #[error("label contains {0:?}; only A-Z are allowed")]
    InvalidChar(char),
    #[error("label {0:?} is too long")]
    Overflow(String),
}

/// Label for a zero-based position: 0 -> "A", 25 -> "Z", 26 -> "AA".
pub fn position_to_label(index: usize) -> String {
    let mut n = index as u128 + 1;
    let mut digits = Vec::new();
    while n > 0 {
        n -= 1;
        digits.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    digits.iter().rev().collect()
}

/// Zero-based position of a label. Inverse of [`position_to_label`].
pub fn label_to_position(label: &str) -> Result<usize, LabelError> {
    if label.is_empty() {
        return Err(LabelError::Empty);
    }

    let mut n: usize = 0;
    for c in label.chars() {
        if !c.is_ascii_uppercase() {
            return Err(LabelError::InvalidChar(c));
        }
        let digit = (c as u8 - b'A') as usize + 1;
        n = n
            .checked_mul(26)
            .and_then(|n| n.checked_add(digit))
            .ok_or_else(|| LabelError::Overflow(label.to_owned()))?;
    }
    Ok(n - 1)
}

/// Compare two labels by the position they encode.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Contiguous labels for `count` siblings starting at `offset`.
pub fn labels_from(offset: usize, count: usize) -> impl Iterator<Item = String> {
    (offset..offset + count).map(position_to_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels() {
        assert_eq!(position_to_label(0), "A");
        assert_eq!(position_to_label(1), "B");
        assert_eq!(position_to_label(25), "Z");
        assert_eq!(position_to_label(26), "AA");
        assert_eq!(position_to_label(27), "AB");
        assert_eq!(position_to_label(51), "AZ");
        assert_eq!(position_to_label(52), "BA");
        assert_eq!(position_to_label(701), "ZZ");
        assert_eq!(position_to_label(702), "AAA");
    }

    #[test]
    fn roundtrip_first_ten_thousand() {
        for n in 0..10_000 {
            let label = position_to_label(n);
            assert_eq!(label_to_position(&label), Ok(n), "label {label}");
        }
    }

    #[test]
    fn label_order_matches_position_order() {
        let labels: Vec<String> = labels_from(0, 800).collect();
        for pair in labels.windows(2) {
            assert_eq!(compare_labels(&pair[0], &pair[1]), Ordering::Less);
        }
        // Plain string order would put "AA" before "B".
        assert_eq!(compare_labels("B", "AA"), Ordering::Less);
    }

    #[test]
    fn rejects_bad_labels() {
        assert_eq!(label_to_position(""), Err(LabelError::Empty));
        assert_eq!(label_to_position("a"), Err(LabelError::InvalidChar('a')));
        assert_eq!(label_to_position("A1"), Err(LabelError::InvalidChar('1')));
        let long = "Z".repeat(40);
        assert_eq!(label_to_position(&long), Err(LabelError::Overflow(long.clone())));
    }

    #[test]
    fn labels_from_offset() {
        let labels: Vec<String> = labels_from(24, 4).collect();
        assert_eq!(labels, ["Y", "Z", "AA", "AB"]);
    }
}
