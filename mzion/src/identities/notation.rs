//! Parsing of the textual ion notation, for example `[2M+Na-H2O]+`, `M-H2O+H`, or
//! `[M-2H+(Fe+3)]+`.
//!
//! The grammar is: an optional `[`, an optional molecule multiplier `yM`, any number of signed
//! tokens, and an optional charge. A token is a sign, an optional count, and either a bare name
//! or formula (`+2Na`, `-H2O`) or a parenthesised name or formula with an optional charge for a
//! single unit (`+(Fe+3)`, `+(Fe3+)`). The charge of the whole ion follows the closing `]`
//! (`+`, `-`, `2+`, `+2`) or, without brackets, is given by a trailing lone sign (`M+H+`).
//! Malformed tokens are skipped.

use std::num::NonZeroU32;

use log::debug;

use crate::{
    helper_functions::{end_of_enclosure, next_num},
    identities::{GlobalIonLibrary, IonPart, IonPartDefinition, IonType},
};

/// Something that knows ion parts by name, used to resolve the names in ion notation
pub trait IonPartResolver {
    /// All known charge state variants for the given name, in order of preference
    fn find_parts_by_name(&self, name: &str) -> Vec<IonPart>;

}

impl IonPartResolver for [IonPart] {
    fn find_parts_by_name(&self, name: &str) -> Vec<IonPart> {
        self.iter()
            .filter(|p| p.name() == name)
            .map(|p| p.with_count(1))
            .collect()
    }
}

impl IonType {
    /// Parse an ion type from its notation using the current state of the global ion library
    /// ([`GlobalIonLibrary::global`]), all names are resolved against the same snapshot.
    /// Returns None if the text contains neither a molecule (`M`) nor any part.
    pub fn parse(text: &str) -> Option<Self> {
        Self::parse_with(text, &*GlobalIonLibrary::global().snapshot())
    }

    /// Parse an ion type from its notation resolving all names with the given resolver.
    ///
    /// Every name is looked up in the resolver first, if it is unknown it is parsed as a
    /// formula, and if that fails it is kept as an unknown part. If the charge of the ion is
    /// given and differs from the summed charge of the parts, a silent charge makes up the
    /// difference. If no charge is given and the parts are uncharged the ion gets a charge of +1.
    /// Counts and charges have to fit in an `i32`, tokens with bigger numbers are skipped.
    /// Returns None if the text contains neither a molecule (`M`) nor any part, or if the
    /// summed counts or charges overflow.
    pub fn parse_with(text: &str, resolver: &(impl IonPartResolver + ?Sized)) -> Option<Self> {
        let text = text.trim();
        let bytes = text.as_bytes();
        let bracketed = bytes.first() == Some(&b'[');
        let mut index = skip_whitespace(bytes, usize::from(bracketed));

        let molecules = molecule_multiplier(bytes, index).map(|(next, molecules)| {
            index = next;
            molecules
        });

        let mut parts = Vec::new();
        let mut expected_charge = None;
        while index < bytes.len() {
            match bytes[index] {
                sign @ (b'+' | b'-') => {
                    let sign = if sign == b'+' { 1 } else { -1 };
                    if !bracketed && text[index + 1..].trim().is_empty() {
                        expected_charge = Some(sign);
                        break;
                    }
                    let (part, next) = parse_token(text, index + 1, sign, resolver);
                    parts.extend(part);
                    index = next;
                }
                b']' => {
                    let suffix = text[index + 1..].trim();
                    expected_charge = parse_charge(suffix);
                    if expected_charge.is_none() && !suffix.is_empty() {
                        debug!("Ignored invalid charge '{suffix}' in ion notation '{text}'");
                    }
                    break;
                }
                c if c.is_ascii_whitespace() => index += 1,
                _ => {
                    let end = bytes[index..]
                        .iter()
                        .position(|c| matches!(c, b'+' | b'-' | b']'))
                        .map_or(bytes.len(), |p| index + p);
                    debug!(
                        "Skipped unexpected text '{}' in ion notation '{text}'",
                        &text[index..end]
                    );
                    index = end;
                }
            }
        }

        if molecules.is_none() && parts.is_empty() {
            return None;
        }

        let Some(charge) = parts.iter().try_fold(0_isize, |sum, part| {
            part.checked_total_charge()
                .and_then(|charge| sum.checked_add(charge))
        }) else {
            debug!("The charge of ion notation '{text}' is too big");
            return None;
        };
        let expected_charge = expected_charge.unwrap_or(if charge == 0 { 1 } else { charge });
        if expected_charge != charge {
            let Some(difference) = expected_charge.checked_sub(charge) else {
                debug!("The charge of ion notation '{text}' is too big");
                return None;
            };
            parts.push(IonPart::silent_charge(difference));
        }
        Self::create(parts, molecules.unwrap_or(NonZeroU32::MIN))
            .map_err(|err| debug!("Invalid ion notation '{text}': {err}"))
            .ok()
    }
}

impl IonPart {
    /// Parse a single ion part (`+2Na`, `-H2O`, `(Fe+3)`) using the current state of the global
    /// ion library ([`GlobalIonLibrary::global`]). A missing sign means addition.
    pub fn parse(text: &str) -> Option<Self> {
        Self::parse_with(text, &*GlobalIonLibrary::global().snapshot())
    }

    /// Parse a single ion part resolving the name with the given resolver, see [`IonType::parse_with`].
    /// Returns None if the text is not a single valid part.
    pub fn parse_with(text: &str, resolver: &(impl IonPartResolver + ?Sized)) -> Option<Self> {
        let text = text.trim();
        let (sign, start) = match text.as_bytes().first() {
            Some(b'+') => (1, 1),
            Some(b'-') => (-1, 1),
            _ => (1, 0),
        };
        let (part, end) = parse_token(text, start, sign, resolver);
        if text[end..].trim().is_empty() {
            part
        } else {
            debug!(
                "Trailing text '{}' after ion part '{}'",
                &text[end..],
                &text[..end]
            );
            None
        }
    }
}

fn skip_whitespace(bytes: &[u8], start: usize) -> usize {
    start
        + bytes
            .get(start..)
            .map_or(0, |rest| rest.iter().take_while(|c| c.is_ascii_whitespace()).count())
}

/// Read `yM`, `M` has to be followed by a sign, `]`, whitespace, or the end of the text.
/// Returns the index after the `M` and the number of molecules (`0M` is read as `1M`).
fn molecule_multiplier(bytes: &[u8], start: usize) -> Option<(usize, NonZeroU32)> {
    let (len, num) = next_num(bytes, start).unwrap_or((0, 1));
    let m = start + len;
    if bytes.get(m) != Some(&b'M') {
        return None;
    }
    match bytes.get(m + 1) {
        None | Some(b'+' | b'-' | b']') => (),
        Some(c) if c.is_ascii_whitespace() => (),
        Some(_) => return None,
    }
    let molecules = NonZeroU32::new(u32::try_from(num).ok()?).unwrap_or(NonZeroU32::MIN);
    Some((m + 1, molecules))
}

/// Parse a charge as `+`, `-`, `2+`, or `+2`
fn parse_charge(text: &str) -> Option<isize> {
    let (sign, digits) = if let Some(digits) = text.strip_prefix('+') {
        (1, digits)
    } else if let Some(digits) = text.strip_prefix('-') {
        (-1, digits)
    } else if let Some(digits) = text.strip_suffix('+') {
        (1, digits)
    } else if let Some(digits) = text.strip_suffix('-') {
        (-1, digits)
    } else {
        return None;
    };
    if digits.is_empty() {
        Some(sign)
    } else if digits.bytes().all(|c| c.is_ascii_digit()) {
        bounded(digits).map(|n| n * sign)
    } else {
        None
    }
}

/// Parse a token starting right after its sign. Returns the part (if valid) and the index of
/// the first byte after the token.
fn parse_token(
    text: &str,
    start: usize,
    sign: isize,
    resolver: &(impl IonPartResolver + ?Sized),
) -> (Option<IonPart>, usize) {
    let bytes = text.as_bytes();
    let start = skip_whitespace(bytes, start);
    let (count, index) = match next_num(bytes, start) {
        Some((len, num)) => (
            i32::try_from(num).ok().and_then(|n| isize::try_from(n).ok()),
            skip_whitespace(bytes, start + len),
        ),
        None => {
            let digits = bytes[start..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count();
            (
                (digits == 0).then_some(1),
                skip_whitespace(bytes, start + digits),
            )
        }
    };

    let (name, charge, end) = if bytes.get(index) == Some(&b'(') {
        let Some(close) = end_of_enclosure(text, index + 1, b'(', b')') else {
            debug!(
                "Skipped unclosed parenthesis '{}' in ion notation '{text}'",
                &text[index..]
            );
            return (None, text.len());
        };
        let (name, charge) = split_charge(&text[index + 1..close], resolver);
        (name, charge, close + 1)
    } else {
        let end = bytes[index..]
            .iter()
            .position(|c| {
                matches!(c, b'+' | b'-' | b'[' | b']' | b'(' | b')') || c.is_ascii_whitespace()
            })
            .map_or(bytes.len(), |p| index + p);
        (&text[index..end], None, end)
    };

    let Some(count) = count else {
        debug!(
            "Skipped part with a too big count '{}' in ion notation '{text}'",
            &text[start..end]
        );
        return (None, end);
    };
    let name = name.trim();
    if name.is_empty() {
        debug!("Skipped part without name in ion notation '{text}'");
        return (None, end);
    }
    if charge.is_some_and(|charge| i32::try_from(charge).is_err()) {
        debug!("Skipped part '{name}' with a too big charge in ion notation '{text}'");
        return (None, end);
    }
    let part = resolve(name, charge, resolver).map(|part| part.with_count(sign * count));
    (part, end)
}

/// Split the content of a parenthesised part into the name and the charge of a single unit.
/// `Fe+3` and `Fe+` are unambiguous. For `Fe3+` the digits are only read as charge if `Fe3` is
/// not a known part while `Fe` is, otherwise the whole is a name with a charge of one.
fn split_charge<'a>(
    content: &'a str,
    resolver: &(impl IonPartResolver + ?Sized),
) -> (&'a str, Option<isize>) {
    let content = content.trim();
    let Some(position) = content.rfind(['+', '-']) else {
        return (content, None);
    };
    let sign = if content.as_bytes()[position] == b'+' {
        1
    } else {
        -1
    };
    let (before, after) = (&content[..position], &content[position + 1..]);
    if !after.is_empty() {
        return if after.bytes().all(|c| c.is_ascii_digit()) {
            (before, Some(bounded(after).map_or(isize::MAX, |n| n * sign)))
        } else {
            (content, None)
        };
    }
    let digits = before
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits > 0 {
        let (stem, number) = before.split_at(before.len() - digits);
        if !stem.is_empty()
            && resolver.find_parts_by_name(before).is_empty()
            && !resolver.find_parts_by_name(stem).is_empty()
        {
            return (stem, Some(bounded(number).map_or(isize::MAX, |n| n * sign)));
        }
    }
    (before, Some(sign))
}

/// Parse a number that fits in an `i32`
fn bounded(digits: &str) -> Option<isize> {
    digits
        .parse::<i32>()
        .ok()
        .and_then(|n| isize::try_from(n).ok())
}

/// Resolve a name (with an optional charge for a single unit) to a part with count 1.
/// Known names are preferred, picking the variant with the given charge or otherwise the first
/// variant with its charge changed. Unknown names are parsed as formula or kept as unknown part.
fn resolve(
    name: &str,
    charge: Option<isize>,
    resolver: &(impl IonPartResolver + ?Sized),
) -> Option<IonPart> {
    let candidates = resolver.find_parts_by_name(name);
    if let Some(first) = candidates.first() {
        return match charge {
            None => Some(first.with_count(1)),
            Some(charge) => candidates
                .iter()
                .find(|p| p.single_charge() == charge)
                .map(|p| p.with_count(1))
                .or_else(|| {
                    first
                        .with_single_charge(charge)
                        .or_else(|_| {
                            IonPartDefinition::unknown(name, charge).map(|d| IonPart::new(d, 1))
                        })
                        .ok()
                }),
        };
    }
    let charge = charge.unwrap_or(0);
    IonPartDefinition::from_formula(name, name, charge)
        .or_else(|_| IonPartDefinition::unknown(name, charge))
        .ok()
        .map(|definition| IonPart::new(definition, 1))
}
