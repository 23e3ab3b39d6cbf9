use std::fmt;

use crate::error::MalformedName;

/// Academic title tokens, compared against the lowercased token.
const DEGREE_TOKENS: &[&str] = &["dr", "hab.", "inż.", "prof.", "zw.", "hab", "inz"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub degree: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.degree.is_empty() {
            write!(f, "{} {}", self.first_name, self.last_name)
        } else {
            write!(f, "{} {} {}", self.degree, self.first_name, self.last_name)
        }
    }
}

fn is_degree(token: &str) -> bool {
    DEGREE_TOKENS.contains(&token.to_lowercase().as_str())
}

/// Split a roster display name into degree prefix, first name and last name.
///
/// Degree tokens may appear anywhere; they are pulled out in order. The
/// remaining tokens split on the first space, so multi-word last names stay
/// whole.
pub fn tokenize(raw: &str) -> Result<PersonName, MalformedName> {
    let (degree, rest): (Vec<&str>, Vec<&str>) = raw.split_whitespace().partition(|t| is_degree(t));
    let rest = rest.join(" ");

    let (first, last) = rest.split_once(' ').ok_or_else(|| MalformedName {
        raw: raw.to_string(),
    })?;

    Ok(PersonName {
        degree: degree.join(" "),
        first_name: first.to_string(),
        last_name: last.to_string(),
    })
}
