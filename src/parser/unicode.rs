//! NFKC normalization for identifiers
//!
//! Identifiers are compared after Unicode Normalization Form KC so that
//! compatibility variants (fullwidth letters, roman numeral ligatures,
//! halfwidth katakana, decomposed accents, conjoining Hangul jamo) name the
//! same thing as their canonical spelling.
//!
//! The per-code-point tables (compatibility decompositions, combining classes,
//! primary compositions) come from `unicode-normalization`; the algorithm on
//! top of them is:
//!
//! 1. Decompose every code point, using arithmetic for Hangul syllables.
//! 2. Stably sort each run of non-starters by combining class.
//! 3. Compose each starter with the following unblocked code points.
//!
//! The lexer calls [`is_certainly_nfkc`] per code point while scanning and
//! only pays for [`to_nfkc`] when some code point fails that check.

use std::iter;

use thiserror::Error;
use unicode_normalization::char::{canonical_combining_class, compose, decompose_compatible};
use unicode_normalization::{is_nfkc_quick, IsNormalized};

// Hangul syllable arithmetic (Unicode chapter 3.12)
const S_BASE: u32 = 0xAC00;
const L_BASE: u32 = 0x1100;
const V_BASE: u32 = 0x1161;
const T_BASE: u32 = 0x11A7;
const L_COUNT: u32 = 19;
const V_COUNT: u32 = 21;
const T_COUNT: u32 = 28;
const N_COUNT: u32 = V_COUNT * T_COUNT;
const S_COUNT: u32 = L_COUNT * N_COUNT;

/// Normalization was asked to process bytes that are not valid UTF-8
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed UTF-8 at byte offset {offset}")]
pub struct NormalizeError {
    pub offset: usize,
}

/// Fast per-code-point test: `true` means a string made only of such code
/// points is already in NFKC.
pub fn is_certainly_nfkc(c: char) -> bool {
    c.is_ascii()
        || (canonical_combining_class(c) == 0 && is_nfkc_quick(iter::once(c)) == IsNormalized::Yes)
}

/// Normalize UTF-8 bytes to NFKC.
pub fn to_nfkc(text: &[u8]) -> Result<String, NormalizeError> {
    let text = std::str::from_utf8(text).map_err(|err| NormalizeError {
        offset: err.valid_up_to(),
    })?;
    Ok(nfkc_str(text))
}

/// Normalize a string to NFKC.
pub fn nfkc_str(text: &str) -> String {
    let mut chars = decompose(text.chars());
    compose_in_place(&mut chars);
    chars.into_iter().collect()
}

/// Compatibility decomposition followed by canonical ordering.
pub fn decompose(chars: impl Iterator<Item = char>) -> Vec<char> {
    let mut out = Vec::new();
    for c in chars {
        if !decompose_hangul(c, &mut out) {
            decompose_compatible(c, |d| out.push(d));
        }
    }
    canonical_order(&mut out);
    out
}

/// Stable sort of every maximal run of non-zero combining classes
fn canonical_order(chars: &mut [char]) {
    let mut start = 0;
    while start < chars.len() {
        if canonical_combining_class(chars[start]) == 0 {
            start += 1;
            continue;
        }
        let mut end = start + 1;
        while end < chars.len() && canonical_combining_class(chars[end]) != 0 {
            end += 1;
        }
        chars[start..end].sort_by_key(|&c| canonical_combining_class(c));
        start = end;
    }
}

/// Canonical composition of an already-ordered decomposition
pub fn compose_in_place(chars: &mut Vec<char>) {
    let mut out: Vec<char> = Vec::with_capacity(chars.len());
    let mut starter: Option<usize> = None;
    // Class of the last code point kept since the starter, if any
    let mut last_class: Option<u8> = None;

    for &c in chars.iter() {
        let class = canonical_combining_class(c);
        if let Some(index) = starter {
            let blocked = last_class.is_some_and(|last| last == 0 || last >= class);
            if !blocked {
                if let Some(composed) = compose_pair(out[index], c) {
                    out[index] = composed;
                    continue;
                }
            }
        }
        if class == 0 {
            starter = Some(out.len());
            last_class = None;
        } else {
            last_class = Some(class);
        }
        out.push(c);
    }

    *chars = out;
}

fn compose_pair(a: char, b: char) -> Option<char> {
    if is_hangul_lead_or_syllable(a) {
        return compose_hangul(a, b);
    }
    compose(a, b)
}

fn is_hangul_lead_or_syllable(c: char) -> bool {
    let c = c as u32;
    (L_BASE..L_BASE + L_COUNT).contains(&c) || (S_BASE..S_BASE + S_COUNT).contains(&c)
}

/// Push the jamo of a precomposed syllable; `false` if `c` is not one
fn decompose_hangul(c: char, out: &mut Vec<char>) -> bool {
    let s_index = (c as u32).wrapping_sub(S_BASE);
    if s_index >= S_COUNT {
        return false;
    }
    let l = L_BASE + s_index / N_COUNT;
    let v = V_BASE + (s_index % N_COUNT) / T_COUNT;
    let t = T_BASE + s_index % T_COUNT;
    out.extend([l, v].into_iter().filter_map(char::from_u32));
    if t != T_BASE {
        out.extend(char::from_u32(t));
    }
    true
}

fn compose_hangul(a: char, b: char) -> Option<char> {
    let (a, b) = (a as u32, b as u32);

    // L + V
    if (L_BASE..L_BASE + L_COUNT).contains(&a) && (V_BASE..V_BASE + V_COUNT).contains(&b) {
        let l_index = a - L_BASE;
        let v_index = b - V_BASE;
        return char::from_u32(S_BASE + (l_index * V_COUNT + v_index) * T_COUNT);
    }

    // LV + T
    let s_index = a.wrapping_sub(S_BASE);
    if s_index < S_COUNT && s_index % T_COUNT == 0 && b > T_BASE && b < T_BASE + T_COUNT {
        return char::from_u32(a + (b - T_BASE));
    }

    None
}
