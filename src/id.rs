//! Composite resource IDs
//!
//! Resources keyed by more than one natural key store them joined into a
//! single string, `field1#field2[#field3]`. The separator is never escaped, so
//! a field containing it is refused at encode time.

use thiserror::Error;

pub const FIELD_SEPARATOR: &str = "#";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("id is broken: `{id}` has {actual} part(s), expected {expected}")]
    Arity {
        id: String,
        expected: String,
        actual: usize,
    },

    #[error("id field `{0}` contains the separator `#`")]
    SeparatorInField(String),
}

/// Join `fields` into one ID
pub fn encode<S: AsRef<str>>(fields: &[S]) -> Result<String, IdError> {
    if let Some(bad) = fields.iter().find(|f| f.as_ref().contains(FIELD_SEPARATOR)) {
        return Err(IdError::SeparatorInField(bad.as_ref().to_string()));
    }
    Ok(fields
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR))
}

/// Split `id`, requiring exactly `expected` parts
pub fn decode(id: &str, expected: usize) -> Result<Vec<String>, IdError> {
    decode_one_of(id, &[expected])
}

/// Split `id`, accepting any of the listed arities (legacy ID shapes)
pub fn decode_one_of(id: &str, arities: &[usize]) -> Result<Vec<String>, IdError> {
    let parts: Vec<String> = id.split(FIELD_SEPARATOR).map(str::to_string).collect();
    if arities.contains(&parts.len()) {
        return Ok(parts);
    }

    let expected = arities
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    Err(IdError::Arity {
        id: id.to_string(),
        expected,
        actual: parts.len(),
    })
}

pub fn decode_pair(id: &str) -> Result<(String, String), IdError> {
    let [a, b] = split_exact::<2>(id)?;
    Ok((a, b))
}

pub fn decode_triple(id: &str) -> Result<(String, String, String), IdError> {
    let [a, b, c] = split_exact::<3>(id)?;
    Ok((a, b, c))
}

fn split_exact<const N: usize>(id: &str) -> Result<[String; N], IdError> {
    <[String; N]>::try_from(decode(id, N)?).map_err(|parts| IdError::Arity {
        id: id.to_string(),
        expected: N.to_string(),
        actual: parts.len(),
    })
}
