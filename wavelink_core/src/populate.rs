//! Fill a fresh record's control parameters from configuration

use crate::error::{LinkError, LinkResult};
use crate::parameter::{Parameter, ParameterValue};
use crate::record::{RecordLayout, RecordViewMut};
use wavelink::config::{InitialValue, ParameterSpec};
use wavelink::kind::ParameterKind;

/// Convert a configured literal into a value of `kind`.
pub fn initial_value(kind: ParameterKind, value: InitialValue) -> LinkResult<ParameterValue> {
    let converted = match (kind, value) {
        (ParameterKind::Float, InitialValue::Float(v)) => Some(ParameterValue::Float(v as f32)),
        (ParameterKind::Float, InitialValue::Integer(v)) => Some(ParameterValue::Float(v as f32)),
        (ParameterKind::Double, InitialValue::Float(v)) => Some(ParameterValue::Double(v)),
        (ParameterKind::Double, InitialValue::Integer(v)) => Some(ParameterValue::Double(v as f64)),
        (ParameterKind::S64, InitialValue::Integer(v)) => Some(ParameterValue::S64(v)),
        (ParameterKind::Vec3Float, InitialValue::Vector(v)) => {
            Some(ParameterValue::Vec3Float(v.map(|c| c as f32)))
        }
        (ParameterKind::Vec3Double, InitialValue::Vector(v)) => Some(ParameterValue::Vec3Double(v)),
        _ => None,
    };
    converted.ok_or_else(|| {
        LinkError::invalid(format!("value {:?} does not fit kind {}", value, kind))
    })
}

/// Parameter described by one `[[control]]` entry.
pub fn parameter_from_spec(spec: &ParameterSpec) -> LinkResult<Parameter> {
    spec.validate()?;
    let mut param = Parameter::declare(&spec.name, spec.kind);
    if let Some(value) = spec.value {
        param.set_value(initial_value(spec.kind, value)?);
    }
    Ok(param)
}

/// Write `specs` into the control slots of `view`, in order.
///
/// Fails with `InvalidArgument` if the record has fewer control slots than
/// entries; slots past the last entry are left untouched.
pub fn populate_controls<H: RecordLayout>(
    view: &mut RecordViewMut<'_, H>,
    specs: &[ParameterSpec],
) -> LinkResult<()> {
    let slots = view.control_parameters_mut();
    if specs.len() > slots.len() {
        return Err(LinkError::invalid(format!(
            "{} control specs for {} control slots",
            specs.len(),
            slots.len()
        )));
    }
    for (slot, spec) in slots.iter_mut().zip(specs) {
        *slot = parameter_from_spec(spec)?;
        tracing::debug!("declared control parameter {:?}", slot);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SharedParameters;

    fn spec(name: &str, kind: ParameterKind, value: Option<InitialValue>) -> ParameterSpec {
        ParameterSpec {
            name: name.to_string(),
            kind,
            value,
        }
    }

    #[test]
    fn test_initial_value_conversions() {
        assert_eq!(
            initial_value(ParameterKind::Float, InitialValue::Integer(2)).unwrap(),
            ParameterValue::Float(2.0)
        );
        assert_eq!(
            initial_value(ParameterKind::Vec3Float, InitialValue::Vector([1.0, 2.0, 3.0])).unwrap(),
            ParameterValue::Vec3Float([1.0, 2.0, 3.0])
        );
        assert!(initial_value(ParameterKind::S64, InitialValue::Float(1.5)).is_err());
        assert!(initial_value(ParameterKind::Double, InitialValue::Vector([0.0; 3])).is_err());
    }

    #[test]
    fn test_populate_in_order() {
        let mut record = SharedParameters::create(3, 1).unwrap();
        let specs = vec![
            spec("pf", ParameterKind::Float, Some(InitialValue::Float(1.5))),
            spec("ps64", ParameterKind::S64, Some(InitialValue::Integer(12))),
            spec("gain", ParameterKind::Double, None),
        ];
        let mut view = record.view_mut().unwrap();
        populate_controls(&mut view, &specs).unwrap();

        let controls = view.control_parameters();
        assert_eq!(controls[0].name(), "pf");
        assert_eq!(controls[0].float().unwrap(), 1.5);
        assert_eq!(controls[1].s64().unwrap(), 12);
        assert_eq!(controls[2].kind().unwrap(), ParameterKind::Double);
        assert!(!controls[2].is_set());
        assert!(!view.wave_parameters()[0].has_name());
    }

    #[test]
    fn test_populate_rejects_overflow_and_bad_specs() {
        let mut record = SharedParameters::create(1, 0).unwrap();
        let mut view = record.view_mut().unwrap();
        let two = vec![
            spec("a", ParameterKind::Float, None),
            spec("b", ParameterKind::Float, None),
        ];
        assert!(populate_controls(&mut view, &two).is_err());

        let bad = vec![spec("way_too_long_for_a_slot", ParameterKind::Float, None)];
        assert!(matches!(
            populate_controls(&mut view, &bad),
            Err(LinkError::Config { .. })
        ));
    }
}
