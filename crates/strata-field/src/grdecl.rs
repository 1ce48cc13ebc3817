//! GRDECL include files.
//!
//! ```text
//! PORO
//!   0.25 0.25 0.3 0.3 0.3 0.21
//!   ...
//! /
//! ```
//!
//! One value per grid cell in natural order. `--` starts a comment and
//! `n*v` repeats `v` n times.

use std::io::{BufRead, Write};

use strata_core::{BufferRef, Element, ElementType, TypedBuffer};

use crate::error::FieldError;

const VALUES_PER_LINE: usize = 6;

/// Write `data` as a GRDECL keyword block.
pub fn write_grdecl(w: &mut dyn Write, keyword: &str, data: BufferRef<'_>) -> Result<(), FieldError> {
    writeln!(w, "{keyword}")?;
    match data {
        BufferRef::Int(v) => write_values(w, v)?,
        BufferRef::Float(v) => write_values(w, v)?,
        BufferRef::Double(v) => write_values(w, v)?,
    }
    writeln!(w, "/")?;
    Ok(())
}

fn write_values<T: Element + std::fmt::Display>(w: &mut dyn Write, values: &[T]) -> Result<(), FieldError> {
    for line in values.chunks(VALUES_PER_LINE) {
        for v in line {
            write!(w, "  {v}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Search `r` for `keyword` and read exactly `size` values of
/// `element_type`. Returns `None` if the keyword is not present.
pub fn read_grdecl(
    r: &mut dyn BufRead,
    keyword: &str,
    element_type: ElementType,
    size: usize,
) -> Result<Option<TypedBuffer>, FieldError> {
    let mut tokens = Vec::new();
    let mut found = false;
    let mut terminated = false;
    let mut line = String::new();
    loop {
        line.clear();
        if r.read_line(&mut line)? == 0 {
            break;
        }
        let content = match line.find("--") {
            Some(pos) => &line[..pos],
            None => line.as_str(),
        };
        let mut words = content.split_whitespace();
        if !found {
            if words.next() == Some(keyword) {
                found = true;
            }
            // A keyword line carries no values.
            continue;
        }
        for word in words {
            if let Some(last) = word.strip_suffix('/') {
                if !last.is_empty() {
                    tokens.push(last.to_string());
                }
                terminated = true;
                break;
            }
            tokens.push(word.to_string());
        }
        if terminated {
            break;
        }
    }
    if !found {
        return Ok(None);
    }
    if !terminated {
        return Err(malformed(format!("{keyword}: missing terminating '/'")));
    }
    let data = match element_type {
        ElementType::Int => TypedBuffer::Int(parse_values(keyword, &tokens, size)?),
        ElementType::Float => TypedBuffer::Float(parse_values(keyword, &tokens, size)?),
        ElementType::Double => TypedBuffer::Double(parse_values(keyword, &tokens, size)?),
    };
    Ok(Some(data))
}

/// Expand `n*v` repeats into exactly `size` values. Values past `size`
/// are counted but never materialized.
fn parse_values<T: Element>(keyword: &str, tokens: &[String], size: usize) -> Result<Vec<T>, FieldError> {
    let mut out = Vec::with_capacity(size.min(tokens.len()));
    let mut total = 0usize;
    for token in tokens {
        let (count, value) = match token.split_once('*') {
            Some((n, v)) => {
                let n = n
                    .parse::<usize>()
                    .map_err(|_| malformed(format!("{keyword}: bad repeat count in {token:?}")))?;
                (n, v)
            }
            None => (1, token.as_str()),
        };
        let v = T::parse_text(value)
            .ok_or_else(|| malformed(format!("{keyword}: can not parse {token:?} as {}", T::TYPE)))?;
        total = total.saturating_add(count);
        if total <= size {
            out.extend(std::iter::repeat(v).take(count));
        }
    }
    if total != size {
        return Err(FieldError::SizeMismatch {
            key: keyword.to_string(),
            expected: size,
            found: total,
        });
    }
    Ok(out)
}

fn malformed(detail: String) -> FieldError {
    FieldError::Malformed {
        format: "GRDECL",
        detail,
    }
}
