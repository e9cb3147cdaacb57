//! Decimal and dimension parsing
//!
//! Sheet dimensions arrive in three layouts: explicit width and height
//! columns, a combined `WxH` string in the size column, or a combined string
//! typed into the width (or height) column. Separators `x`, `×` and `*` are
//! all accepted, and `,` is accepted as a decimal point.

use crate::errors::FieldError;
use printtrack_common::db::models::SheetSpec;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Canonical separator after normalization
const SEPARATOR: char = 'x';

/// True when the value contains any dimension separator glyph
pub fn has_separator(value: &str) -> bool {
    value
        .chars()
        .any(|c| matches!(c, 'x' | 'X' | '×' | '*'))
}

/// Split a combined dimension string into its parts on any separator glyph
fn split_dimensions(value: &str) -> Vec<String> {
    value
        .chars()
        .map(|c| match c {
            'X' | '×' | '*' => SEPARATOR,
            other => other,
        })
        .collect::<String>()
        .split(SEPARATOR)
        .map(|part| part.trim().to_string())
        .collect()
}

/// Parse a single number.
///
/// Rejects blank input and anything that looks like a combined `WxH` value.
pub fn parse_scalar(value: &str, field: &str) -> Result<Decimal, FieldError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(FieldError::Missing { field: field.to_string() });
    }

    if has_separator(trimmed) {
        return Err(FieldError::AmbiguousDimension {
            field: field.to_string(),
            value: trimmed.to_string(),
        });
    }

    Decimal::from_str(&trimmed.replace(',', ".")).map_err(|_| FieldError::InvalidDecimal {
        field: field.to_string(),
        value: trimmed.to_string(),
    })
}

/// Like [`parse_scalar`], but blank input is `None` instead of an error
pub fn parse_optional_scalar(
    value: Option<&str>,
    field: &str,
) -> Result<Option<Decimal>, FieldError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_scalar(v, field).map(Some),
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse both halves of a split dimension, collecting failures from each
fn parse_pair(parts: &[String], prefix: &str) -> Result<SheetSpec, Vec<FieldError>> {
    let width = parse_optional_scalar(Some(parts[0].as_str()), &format!("{}_width", prefix));
    let height = parse_optional_scalar(Some(parts[1].as_str()), &format!("{}_height", prefix));

    match (width, height) {
        (Ok(width), Ok(height)) => Ok(SheetSpec { width, height, size: None }),
        (width, height) => Err(width.err().into_iter().chain(height.err()).collect()),
    }
}

/// Resolve one sheet's width, height and size columns.
///
/// Precedence:
/// 1. A non-blank size string wins. `WxH` is split into width and height;
///    a string that does not split into exactly two parts is kept verbatim;
///    a bare number is parsed as a scalar into the width slot.
/// 2. A width value containing a separator is split, the height is ignored.
/// 3. A height value containing a separator is split the same way.
/// 4. Otherwise width and height are parsed independently, both optional.
///
/// Cases 2 and 3 fall through when the split does not yield two parts.
pub fn parse_sheet_fields(
    width: Option<&str>,
    height: Option<&str>,
    size: Option<&str>,
    prefix: &str,
) -> Result<SheetSpec, Vec<FieldError>> {
    if let Some(size) = present(size) {
        if !has_separator(size) {
            let scalar = parse_scalar(size, &format!("{}_size", prefix)).map_err(|e| vec![e])?;
            return Ok(SheetSpec { width: Some(scalar), height: None, size: None });
        }

        let parts = split_dimensions(size);
        if parts.len() == 2 {
            return parse_pair(&parts, prefix);
        }

        return Ok(SheetSpec { width: None, height: None, size: Some(size.to_string()) });
    }

    for combined in [present(width), present(height)].into_iter().flatten() {
        if has_separator(combined) {
            let parts = split_dimensions(combined);
            if parts.len() == 2 {
                return parse_pair(&parts, prefix);
            }
        }
    }

    let width = parse_optional_scalar(width, &format!("{}_width", prefix));
    let height = parse_optional_scalar(height, &format!("{}_height", prefix));

    match (width, height) {
        (Ok(width), Ok(height)) => Ok(SheetSpec { width, height, size: None }),
        (width, height) => Err(width.err().into_iter().chain(height.err()).collect()),
    }
}

/// Resolve a sheet entered through the single-record form.
///
/// Width and height are parsed as given and the size string is stored as
/// entered. When either dimension is missing and the size splits cleanly into
/// two numbers, both dimensions are filled from it. A size that does not
/// decompose is left as text.
pub fn resolve_sheet_with_size(
    width: Option<&str>,
    height: Option<&str>,
    size: Option<&str>,
    prefix: &str,
) -> Result<SheetSpec, Vec<FieldError>> {
    let width = parse_optional_scalar(width, &format!("{}_width", prefix));
    let height = parse_optional_scalar(height, &format!("{}_height", prefix));

    let mut sheet = match (width, height) {
        (Ok(width), Ok(height)) => SheetSpec {
            width,
            height,
            size: present(size).map(str::to_string),
        },
        (width, height) => return Err(width.err().into_iter().chain(height.err()).collect()),
    };

    if sheet.width.is_none() || sheet.height.is_none() {
        if let Some((w, h)) = sheet.size.as_deref().and_then(decompose_size) {
            sheet.width = Some(w);
            sheet.height = Some(h);
        }
    }

    Ok(sheet)
}

/// Split a `WxH` size into two numbers, `None` if it does not decompose
pub fn decompose_size(size: &str) -> Option<(Decimal, Decimal)> {
    let parts = split_dimensions(size);
    if parts.len() != 2 {
        return None;
    }

    let w = Decimal::from_str(&parts[0].replace(',', ".")).ok()?;
    let h = Decimal::from_str(&parts[1].replace(',', ".")).ok()?;
    Some((w, h))
}
