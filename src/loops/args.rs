//! Loop argument parsing
//!
//! Arguments arrive as string pairs, from a template tag or a query string,
//! and are validated into [`LoopArgs`].

use std::str::FromStr;

use thiserror::Error;

use crate::db::DocumentOrder;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("invalid value for '{name}': {value}")]
    InvalidValue { name: String, value: String },

    #[error("unknown argument '{0}'")]
    Unknown(String),
}

/// Tri-state visibility filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BooleanOrBoth {
    #[default]
    Yes,
    No,
    Both,
}

impl BooleanOrBoth {
    /// `None` matches everything
    pub fn as_filter(self) -> Option<bool> {
        match self {
            BooleanOrBoth::Yes => Some(true),
            BooleanOrBoth::No => Some(false),
            BooleanOrBoth::Both => None,
        }
    }
}

impl FromStr for BooleanOrBoth {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(BooleanOrBoth::Yes),
            "0" | "false" | "no" | "off" => Ok(BooleanOrBoth::No),
            "*" | "both" | "any" => Ok(BooleanOrBoth::Both),
            _ => Err(()),
        }
    }
}

impl FromStr for DocumentOrder {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "alpha" => Ok(DocumentOrder::Alpha),
            "alpha-reverse" => Ok(DocumentOrder::AlphaReverse),
            "id" => Ok(DocumentOrder::Id),
            "manual" => Ok(DocumentOrder::Manual),
            _ => Err(()),
        }
    }
}

/// Validated page document loop arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopArgs {
    pub id: Option<Vec<i64>>,
    pub page_id: Option<Vec<i64>>,
    pub visible: BooleanOrBoth,
    pub order: Vec<DocumentOrder>,
    /// Locale overriding the request locale
    pub lang: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Default for LoopArgs {
    fn default() -> Self {
        Self {
            id: None,
            page_id: None,
            visible: BooleanOrBoth::Yes,
            order: vec![DocumentOrder::Manual],
            lang: None,
            limit: None,
            offset: None,
        }
    }
}

impl LoopArgs {
    /// Parse name/value pairs. A repeated name overrides the earlier value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ArgumentError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut args = Self::default();

        for (name, value) in pairs {
            let (name, value) = (name.as_ref(), value.as_ref());
            let invalid = || ArgumentError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            };

            match name {
                "id" => args.id = Some(parse_int_list(value).ok_or_else(invalid)?),
                "page_id" => args.page_id = Some(parse_int_list(value).ok_or_else(invalid)?),
                "visible" => args.visible = value.parse().map_err(|_| invalid())?,
                "order" => {
                    args.order = value
                        .split(',')
                        .map(str::parse::<DocumentOrder>)
                        .collect::<Result<Vec<DocumentOrder>, ()>>()
                        .map_err(|_| invalid())?;
                }
                "lang" => args.lang = Some(normalize_locale(value).ok_or_else(invalid)?),
                "limit" => args.limit = Some(value.trim().parse().map_err(|_| invalid())?),
                "offset" => args.offset = Some(value.trim().parse().map_err(|_| invalid())?),
                other => return Err(ArgumentError::Unknown(other.to_string())),
            }
        }

        Ok(args)
    }
}

fn parse_int_list(value: &str) -> Option<Vec<i64>> {
    value
        .split(',')
        .map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

/// `fr-fr` / `fr_FR` to `fr_FR`; `None` for anything that is not a
/// language with an optional region
pub fn normalize_locale(value: &str) -> Option<String> {
    let mut parts = value.trim().split(['-', '_']);
    let language = parts.next()?;
    let region = parts.next();

    let valid = |part: &str, len: std::ops::RangeInclusive<usize>| {
        len.contains(&part.len()) && part.chars().all(|c| c.is_ascii_alphabetic())
    };

    if parts.next().is_some() || !valid(language, 2..=3) {
        return None;
    }

    match region {
        Some(region) if valid(region, 2..=2) => Some(format!(
            "{}_{}",
            language.to_ascii_lowercase(),
            region.to_ascii_uppercase()
        )),
        Some(_) => None,
        None => Some(language.to_ascii_lowercase()),
    }
}
