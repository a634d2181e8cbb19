//! Unit, parameter and date normalization.
//!
//! Pure functions over [`DraftMeasurement`]: no I/O, no state, and
//! idempotent, so running a record through the pipeline twice cannot
//! change it. Nothing here invents data. A unit or parameter that is not
//! recognized passes through untouched and the validator rejects the
//! record downstream.

use crate::domain::{Attribution, DraftMeasurement, Parameter, UtcStamp};
use crate::source::Source;

/// Values some providers emit instead of a reading when a station errors.
const ERROR_SENTINELS: [f64; 2] = [-9999.0, 9999.0];

pub(crate) fn is_error_sentinel(value: f64) -> bool {
    ERROR_SENTINELS.contains(&value)
}

/// Apply the full normalization pass for one source.
pub fn normalize(mut draft: DraftMeasurement, source: &Source) -> DraftMeasurement {
    normalize_date(&mut draft);
    unify_units(&mut draft);
    unify_parameter(&mut draft);
    apply_source_defaults(&mut draft, source);
    draft
}

/// Convert the unit to the system-preferred form.
///
/// µg/m³ for mass concentration, ppm for volumetric. Conversions are
/// exact: pphm ÷ 100, ppb ÷ 1000, ppt ÷ 1,000,000, mg/m³ × 1000.
/// Spelling variants of µg/m³ are collapsed with the value unchanged.
pub fn unify_units(draft: &mut DraftMeasurement) {
    let (Some(unit), Some(value)) = (draft.unit.as_deref(), draft.value) else {
        return;
    };
    if is_error_sentinel(value) {
        return;
    }

    match unit.to_lowercase().as_str() {
        "pphm" => {
            draft.value = Some(value / 100.0);
            draft.unit = Some(String::from("ppm"));
        }
        "ppb" => {
            draft.value = Some(value / 1_000.0);
            draft.unit = Some(String::from("ppm"));
        }
        "ppt" => {
            draft.value = Some(value / 1_000_000.0);
            draft.unit = Some(String::from("ppm"));
        }
        "ppm" => {
            draft.unit = Some(String::from("ppm"));
        }
        "µg/m3" | "ug/m3" | "µg/m³" | "ug/m³" => {
            draft.unit = Some(String::from("µg/m³"));
        }
        "mg/m3" | "mg/m³" => {
            draft.value = Some(value * 1_000.0);
            draft.unit = Some(String::from("µg/m³"));
        }
        _ => {}
    }
}

/// Collapse the parameter spelling to canonical text (`PM2.5` → `pm25`,
/// `Ozone` → `o3`). Unrecognized parameters are left for the validator.
pub fn unify_parameter(draft: &mut DraftMeasurement) {
    if let Some(parameter) = draft.parameter.as_deref() {
        draft.parameter = Some(Parameter::unify(parameter));
    }
}

/// Derive the missing half of the date pair where possible.
///
/// A record reporting only a local time with an explicit offset gets its
/// UTC instant computed from it; a parseable UTC value is reformatted to
/// the canonical `Z` form. The local side is never invented from UTC.
pub fn normalize_date(draft: &mut DraftMeasurement) {
    let Some(date) = draft.date.as_mut() else {
        return;
    };

    match (&date.utc, &date.local) {
        (None, Some(local)) => {
            if let Ok(stamp) = UtcStamp::parse(local) {
                date.utc = Some(stamp.format_rfc3339());
            }
        }
        (Some(utc), _) => {
            if let Ok(stamp) = UtcStamp::parse(utc) {
                date.utc = Some(stamp.format_rfc3339());
            }
        }
        (None, None) => {}
    }
}

/// Fill descriptive fields the provider omitted from the source
/// configuration: location falls back to the configured location or the
/// source name, city/country to the source's, and a missing attribution
/// becomes the source's organization entry.
pub fn apply_source_defaults(draft: &mut DraftMeasurement, source: &Source) {
    if draft.location.as_deref().map_or(true, str::is_empty) {
        draft.location = source
            .location
            .clone()
            .or_else(|| Some(source.name.clone()));
    }
    if draft.city.is_none() {
        draft.city = source.city.clone();
    }
    if draft.country.is_none() {
        draft.country = source.country.clone();
    }
    if draft.attribution.is_none() {
        draft.attribution = Some(vec![Attribution::new(
            source.attribution_name(),
            source.source_url.clone(),
        )]);
    }
}
