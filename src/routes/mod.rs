pub(crate) mod financial_data;
pub(crate) mod health;
pub(crate) mod statistics;

use std::collections::HashMap;

use crate::errors::AppError;
use crate::services::validation::require_param;

/// Pull the named required parameters, in order. The first one missing or
/// empty is reported.
pub(crate) fn required_params<'a, const N: usize>(
    params: &'a HashMap<String, String>,
    names: [&str; N],
) -> Result<[&'a str; N], AppError> {
    let mut values = [""; N];
    for (slot, name) in values.iter_mut().zip(names) {
        *slot = require_param(name, params.get(name).map(String::as_str), true)?
            .ok_or_else(|| AppError::MissingParameter(name.to_string()))?;
    }
    Ok(values)
}
