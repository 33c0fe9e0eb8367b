use std::{num::NonZeroU16, ops::RangeBounds};

use context_error::*;

use crate::{
    chemistry::{ELEMENT_PARSE_LIST, Element, MolecularFormula},
    helper_functions::{RangeExtension, explain_number_error},
};

impl MolecularFormula {
    /// Parse a molecular formula following the ProForma v2 molecular formula rules:
    /// * pairs of elements and their cardinality, optionally separated by spaces (`C12H20O2`, `C12 H20 O2`),
    /// * a missing cardinality means 1 and negative cardinalities are allowed (`HN-1O2`),
    /// * specific isotopes are prefixed in square brackets (`[13C2]C-2H2N`).
    ///
    /// If `ALLOW_CHARGE` is set `:z{x}` can be used to define the charge of the formula (`N1H4:z+1`).
    /// # Errors
    /// If the formula is not valid according to the above rules, or if it is empty.
    ///
    /// ```rust
    /// use mzion::prelude::*;
    /// assert!(MolecularFormula::pro_forma::<false>("C12H20O2").is_ok());
    /// assert!(MolecularFormula::pro_forma::<false>("C12 H20 O2").is_ok());
    /// assert!(MolecularFormula::pro_forma::<false>("HN-1O2").is_ok());
    /// assert!(MolecularFormula::pro_forma::<false>("[13C2]C-2H2N").is_ok());
    /// assert!(MolecularFormula::pro_forma::<true>("N1H4:z+1").is_ok());
    /// assert!(MolecularFormula::pro_forma::<false>("N1H4:z+1").is_err());
    /// assert!(MolecularFormula::pro_forma::<false>("ACN").is_err());
    /// ```
    pub fn pro_forma<const ALLOW_CHARGE: bool>(
        value: &str,
    ) -> Result<Self, BoxedError<'_, BasicKind>> {
        Self::pro_forma_inner::<ALLOW_CHARGE>(
            &Context::none().lines(0, value),
            value,
            0..value.len(),
        )
    }

    /// This parses a substring of the given string as a ProForma molecular formula definition.
    /// Note that the base context is assumed to contain the full line at line index 0.
    ///
    /// # Errors
    /// It fails when the string is not a valid ProForma molecular formula string.
    pub fn pro_forma_inner<'a, const ALLOW_CHARGE: bool>(
        base_context: &Context<'a>,
        value: &'a str,
        range: impl RangeBounds<usize>,
    ) -> Result<Self, BoxedError<'a, BasicKind>> {
        let (mut index, end) = range.bounds(value.len().saturating_sub(1));
        if index > end || end >= value.len() {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid molecular formula",
                "The formula is empty",
                base_context.clone(),
            ));
        }

        let mut element = None;
        let bytes = value.as_bytes();
        let mut result = Self::default();
        'main_parse_loop: while index <= end {
            match (bytes[index], element) {
                (b'[', _) => {
                    // Skip the open square bracket and leading spaces
                    index += 1 + bytes[index + 1..]
                        .iter()
                        .take_while(|b| **b == b' ')
                        .count();
                    let len = bytes
                        .iter()
                        .skip(index)
                        .position(|c| *c == b']')
                        .ok_or_else(|| {
                            BoxedError::new(
                                BasicKind::Error,
                                "Invalid molecular formula",
                                "No closing square bracket found",
                                base_context.clone().add_highlight((0, index, 1)),
                            )
                        })?;
                    let isotope = bytes
                        .iter()
                        .skip(index)
                        .take_while(|c| c.is_ascii_digit())
                        .count();
                    let ws1 = bytes[index + isotope..]
                        .iter()
                        .take_while(|b| **b == b' ')
                        .count();
                    let ele = bytes
                        .iter()
                        .skip(index + isotope + ws1)
                        .take_while(|c| c.is_ascii_alphabetic())
                        .count();

                    let parsed_element = ELEMENT_PARSE_LIST
                        .iter()
                        .find(|possible| {
                            &value[index + isotope + ws1..index + isotope + ws1 + ele]
                                == possible.0
                        })
                        .map(|possible| possible.1)
                        .ok_or_else(|| {
                            BoxedError::new(
                                BasicKind::Error,
                                "Invalid molecular formula",
                                "Invalid element",
                                base_context
                                    .clone()
                                    .add_highlight((0, index + isotope, ele)),
                            )
                        })?;
                    let ws2 = bytes[index + isotope + ws1 + ele..]
                        .iter()
                        .take_while(|c| **c == b' ')
                        .count();
                    let start = index + isotope + ws1 + ele + ws2;
                    let num_len = bytes[start..]
                        .iter()
                        .take_while(|c| **c == b'-' || **c == b'+' || c.is_ascii_digit())
                        .count();
                    let num = value[start..start + num_len].parse::<i32>().map_err(|err| {
                        BoxedError::new(
                            BasicKind::Error,
                            "Invalid molecular formula",
                            format!("The element number {}", explain_number_error(&err)),
                            base_context.clone().add_highlight((0, start, num_len)),
                        )
                    })?;
                    let isotope_number = value[index..index + isotope]
                        .parse::<NonZeroU16>()
                        .map_err(|err| {
                            BoxedError::new(
                                BasicKind::Error,
                                "Invalid molecular formula",
                                format!("The isotope number {}", explain_number_error(&err)),
                                base_context.clone().add_highlight((0, index, isotope)),
                            )
                        })?;

                    if result
                        .add((parsed_element, Some(isotope_number), num))
                        .is_err()
                    {
                        return Err(BoxedError::new(
                            BasicKind::Error,
                            "Invalid molecular formula",
                            format!("The isotope {isotope_number}{parsed_element} is not known"),
                            base_context.clone().add_highlight((0, index, len)),
                        ));
                    }
                    index += len + 1;
                }
                (b'-' | b'0'..=b'9', Some(ele)) => {
                    let length = value[index..=end]
                        .char_indices()
                        .take_while(|(_, c)| c.is_ascii_digit() || *c == '-')
                        .last()
                        .map_or(0, |(i, c)| i + c.len_utf8());
                    let num = value[index..index + length].parse::<i32>().map_err(|err| {
                        BoxedError::new(
                            BasicKind::Error,
                            "Invalid molecular formula",
                            format!("The element number {}", explain_number_error(&err)),
                            base_context.clone().add_highlight((0, index, length)),
                        )
                    })?;
                    // Elements without mass are rejected when the symbol is read
                    let _ = result.add((ele, None, num));
                    element = None;
                    index += length;
                }
                (b' ' | b'\t', _) => index += 1,
                (b':', _) if ALLOW_CHARGE => {
                    if let Some(element) = element.take() {
                        let _ = result.add((element, None, 1));
                    }
                    if Some(&b'z') == bytes.get(index + 1) {
                        index += 2;
                        let num = value[index..=end].parse::<i32>().map_err(|err| {
                            BoxedError::new(
                                BasicKind::Error,
                                "Invalid molecular formula",
                                format!("The charge number {}", explain_number_error(&err)),
                                base_context.clone().add_highlight((
                                    0,
                                    index,
                                    (end + 1).saturating_sub(index),
                                )),
                            )
                        })?;
                        let _ = result.add((Element::Electron, None, -num));
                        index = end + 1;
                        break 'main_parse_loop;
                    }
                    return Err(BoxedError::new(
                        BasicKind::Error,
                        "Invalid molecular formula",
                        "A charge tag was not set up properly, a charge tag should be formed as ':z<sign><number>'",
                        base_context.clone().add_highlight((0, index, 1)),
                    ));
                }
                _ => {
                    if let Some(element) = element.take() {
                        let _ = result.add((element, None, 1));
                    }
                    let element_text: String = value[index..].chars().take(2).collect::<String>();
                    for possible in ELEMENT_PARSE_LIST {
                        if element_text.starts_with(possible.0) {
                            if !possible.1.is_valid(None) {
                                return Err(BoxedError::new(
                                    BasicKind::Error,
                                    "Invalid molecular formula",
                                    format!(
                                        "The element {} has no stable isotopes, so its mass is only defined for a specific isotope",
                                        possible.1
                                    ),
                                    base_context
                                        .clone()
                                        .add_highlight((0, index, possible.0.len())),
                                ));
                            }
                            element = Some(possible.1);
                            index += possible.0.len();
                            continue 'main_parse_loop;
                        }
                    }
                    return Err(BoxedError::new(
                        BasicKind::Error,
                        "Invalid molecular formula",
                        "Not a valid character in formula",
                        base_context.clone().add_highlight((
                            0,
                            index,
                            value[index..]
                                .chars()
                                .next()
                                .map(char::len_utf8)
                                .unwrap_or_default(),
                        )),
                    ));
                }
            }
        }
        if let Some(element) = element {
            let _ = result.add((element, None, 1));
        }
        if result.is_empty() {
            Err(BoxedError::new(
                BasicKind::Error,
                "Invalid molecular formula",
                "The formula is empty",
                base_context.clone().add_highlight((0, index.min(value.len()), 0)),
            ))
        } else {
            Ok(result)
        }
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use crate::chemistry::MolecularFormula;

    #[test]
    fn parse() {
        assert_eq!(
            MolecularFormula::pro_forma::<false>("H2O").unwrap(),
            molecular_formula!(H 2 O 1)
        );
        assert_eq!(
            MolecularFormula::pro_forma::<false>("CH3COOH").unwrap(),
            molecular_formula!(C 2 H 4 O 2)
        );
        assert_eq!(
            MolecularFormula::pro_forma::<false>("CO").unwrap(),
            molecular_formula!(C 1 O 1)
        );
        assert_eq!(
            MolecularFormula::pro_forma::<false>("Co").unwrap(),
            molecular_formula!(Co 1)
        );
        assert_eq!(
            MolecularFormula::pro_forma::<true>("NH4:z+1").unwrap(),
            molecular_formula!(N 1 H 4 :z+1)
        );
    }

    #[test]
    fn spaces() {
        assert_eq!(
            MolecularFormula::pro_forma::<false>("C1[13C1]H6"),
            MolecularFormula::pro_forma::<false>("C 1 [ 13 C 1 ] H 6")
        );
    }

    #[test]
    fn invalid() {
        assert!(MolecularFormula::pro_forma::<false>("").is_err());
        assert!(MolecularFormula::pro_forma::<false>("H0").is_err());
        assert!(MolecularFormula::pro_forma::<false>("H4H-4").is_err());
        assert!(MolecularFormula::pro_forma::<false>("FA").is_err());
        assert!(MolecularFormula::pro_forma::<false>("MeOH").is_err());
        assert!(MolecularFormula::pro_forma::<false>("[14C1]").is_err());
        assert!(MolecularFormula::pro_forma::<true>(":").is_err());
        assert!(MolecularFormula::pro_forma::<true>("+Wv:z-,33U").is_err());
        assert!(MolecularFormula::pro_forma::<false>("f{}").is_err());
        assert!(MolecularFormula::pro_forma::<false>("Tc").is_err());
        assert!(MolecularFormula::pro_forma::<false>("H2Og1").is_err());
    }

    #[test]
    fn full_periodic_table() {
        for (text, formula) in [
            ("AlCl3", molecular_formula!(Al 1 Cl 3)),
            ("BaSO4", molecular_formula!(Ba 1 S 1 O 4)),
            ("SrCl2", molecular_formula!(Sr 1 Cl 2)),
            ("CdS", molecular_formula!(Cd 1 S 1)),
            ("SnO2", molecular_formula!(Sn 1 O 2)),
            ("PtCl4", molecular_formula!(Pt 1 Cl 4)),
            ("AuCl", molecular_formula!(Au 1 Cl 1)),
            ("HgCl2", molecular_formula!(Hg 1 Cl 2)),
            ("C2H3O2Pb", molecular_formula!(C 2 H 3 O 2 Pb 1)),
        ] {
            assert_eq!(
                MolecularFormula::pro_forma::<false>(text).unwrap(),
                formula,
                "{text}"
            );
        }
    }
}
