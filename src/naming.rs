//! Identifier normalization.
//!
//! Table, column and enum names in the store are derived from schema
//! identifiers with the same snake-case routine the indexing engine uses.
//! That routine has quirks which are reproduced here on purpose, since the
//! names must match the physical tables exactly:
//!
//! - digits count as uppercase, so a digit next to a lowercase letter starts
//!   a new word (`int8Field` -> `int_8_field`);
//! - only the immediate neighbours are looked at, so a digit run followed by
//!   a lowercase letter splits before its last digit
//!   (`feeGrowthGlobal0X128free` -> `fee_growth_global_0x12_8free`).

/// Convert an identifier to its snake-case store name.
pub fn snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let end = chars
        .iter()
        .rposition(|c| c.is_alphanumeric())
        .map_or(0, |i| i + 1);

    let mut out = String::with_capacity(ident.len() * 2);
    let mut word_start = true;

    for (i, &c) in chars[..end].iter().enumerate() {
        if !c.is_alphanumeric() {
            if !word_start {
                word_start = true;
                out.push('_');
            }
            continue;
        }

        if !word_start && is_upper(c) && neighbour_is_lower(&chars, i) {
            out.push('_');
        }
        word_start = false;
        out.extend(c.to_lowercase());
    }

    out
}

/// Uppercase in the engine's sense: unchanged by ASCII uppercasing.
fn is_upper(c: char) -> bool {
    c == c.to_ascii_uppercase()
}

fn neighbour_is_lower(chars: &[char], i: usize) -> bool {
    let next = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
    let prev = i
        .checked_sub(1)
        .and_then(|p| chars.get(p))
        .is_some_and(|c| c.is_lowercase());
    next || prev
}
