//! Waveform readiness detection
//!
//! The display starts plotting once the producer has connected and
//! published every waveform parameter. Vector parameters plot as three
//! channels suffixed `-x`, `-y` and `-z`.

use crate::parameter::Parameter;
use crate::record::{RecordView, SharedHeader};
use std::collections::HashSet;

const AXIS_SUFFIXES: [&str; 3] = ["-x", "-y", "-z"];

/// Channel names for `params`, or `None` until every parameter is named
/// and set and the resulting names are unique.
pub fn waveform_channels(params: &[Parameter]) -> Option<Vec<String>> {
    if params.is_empty() {
        return None;
    }
    let mut channels = Vec::with_capacity(params.len());
    for param in params {
        if !param.has_name() || !param.is_set() {
            return None;
        }
        let kind = param.kind().ok()?;
        if kind.is_vector() {
            channels.extend(AXIS_SUFFIXES.iter().map(|s| format!("{}{}", param.name(), s)));
        } else {
            channels.push(param.name().to_string());
        }
    }

    let mut seen = HashSet::with_capacity(channels.len());
    if !channels.iter().all(|c| seen.insert(c.as_str())) {
        tracing::debug!("waveform channel names are not unique");
        return None;
    }
    Some(channels)
}

/// Channel names of a shared record's waveform parameters once a peer is
/// connected and all of them are published.
pub fn detect_waveforms(view: &RecordView<'_, SharedHeader>) -> Option<Vec<String>> {
    if view.connected() <= 0 {
        return None;
    }
    waveform_channels(view.wave_parameters())
}
