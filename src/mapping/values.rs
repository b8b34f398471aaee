//! Translating literal values and value types between the two sides.
//!
//! Tool literals render to hub value strings and back:
//!
//! | Tool literal              | Hub value        | Parameter type |
//! |---------------------------|------------------|----------------|
//! | `LiteralInteger(10)`      | `"10"`           | quantity kind  |
//! | `LiteralUnlimitedNatural` | `"7"`            | quantity kind  |
//! | `LiteralReal(53.0)`       | `"53.0"`         | quantity kind  |
//! | `LiteralBoolean(true)`    | `"true"`         | boolean        |
//! | `LiteralString("x")`      | `"x"`            | text           |

use tracing::{debug, error};

use crate::base::short_name;
use crate::hub::{
    ElementDefinition, MeasurementScale, MeasurementUnit, NumberSetKind, Parameter, ParameterType,
    ParameterTypeKind, RdlChain,
};
use crate::tool::stereotypes::unit_representation;
use crate::tool::{Element, ValueSpecification};

use super::category::resolve_or_create;
use super::config::MappingConfig;
use super::context::MappingContext;

/// The kind of a tool literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Integer,
    Natural,
    Real,
    Boolean,
    Text,
}

impl LiteralKind {
    /// The kind of a value specification; `None` for anything but literals.
    pub fn of(value: &ValueSpecification) -> Option<Self> {
        match value {
            ValueSpecification::LiteralInteger(_) => Some(Self::Integer),
            ValueSpecification::LiteralUnlimitedNatural(_) => Some(Self::Natural),
            ValueSpecification::LiteralReal(_) => Some(Self::Real),
            ValueSpecification::LiteralBoolean(_) => Some(Self::Boolean),
            ValueSpecification::LiteralString(_) => Some(Self::Text),
            ValueSpecification::ElementValue(_) | ValueSpecification::LiteralNull => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Natural | Self::Real)
    }

    /// The number set of a scale for this kind.
    pub fn number_set(&self) -> NumberSetKind {
        match self {
            Self::Integer => NumberSetKind::Integer,
            Self::Natural => NumberSetKind::Natural,
            _ => NumberSetKind::Real,
        }
    }
}

// ============================================================================
// TOOL → HUB
// ============================================================================

/// Render a property's default value as a hub value string.
pub fn extract_literal_value(property: &Element) -> Option<String> {
    render_literal(property.default_value.as_ref()?)
}

/// Render a literal with its native formatting.
pub fn render_literal(value: &ValueSpecification) -> Option<String> {
    match value {
        ValueSpecification::LiteralInteger(v) => Some(v.to_string()),
        ValueSpecification::LiteralUnlimitedNatural(v) => Some(v.to_string()),
        ValueSpecification::LiteralReal(v) => Some(format!("{v:?}")),
        ValueSpecification::LiteralBoolean(v) => Some(v.to_string()),
        ValueSpecification::LiteralString(v) => Some(v.to_string()),
        ValueSpecification::ElementValue(_) | ValueSpecification::LiteralNull => None,
    }
}

/// The parameter type (and scale, for quantity kinds) for a value property.
///
/// A parameter already on the definition whose type is named after the
/// property is reused as is.
pub fn resolve_or_create_parameter_type(
    ctx: &mut MappingContext<'_>,
    definition: &ElementDefinition,
    property: &Element,
) -> Option<(ParameterType, Option<MeasurementScale>)> {
    let name = property.name_or_empty().to_string();
    let short = short_name(&name);

    let reused = {
        let chain = ctx.chain();
        definition.parameters.iter().find_map(|parameter| {
            let parameter_type = chain.by_iid::<ParameterType>(parameter.parameter_type)?;
            crate::base::names_match(&parameter_type.name, &parameter_type.short_name, &name, &short)
                .then(|| {
                    let scale = parameter
                        .scale
                        .and_then(|s| chain.by_iid::<MeasurementScale>(s))
                        .cloned();
                    (parameter_type.clone(), scale)
                })
        })
    };
    if let Some(reused) = reused {
        debug!(property = %name, "reusing parameter type of existing parameter");
        return Some(reused);
    }

    let Some(kind) = property.default_value.as_ref().and_then(LiteralKind::of) else {
        error!(property = %name, "unsupported value kind; parameter skipped");
        return None;
    };

    match kind {
        LiteralKind::Boolean => resolve_or_create(ctx, &name, &short, || {
            ParameterType::new(name.clone(), short.clone(), ParameterTypeKind::Boolean)
        })
        .map(|t| (t, None)),
        LiteralKind::Text => resolve_or_create(ctx, &name, &short, || {
            ParameterType::new(name.clone(), short.clone(), ParameterTypeKind::Text)
        })
        .map(|t| (t, None)),
        numeric => {
            let unit_name = unit_representation(ctx.project(), property)
                .unwrap_or_else(|| ctx.config.dimensionless_unit.clone());
            let Some(scale) = resolve_or_create_measurement_scale(ctx, &unit_name, numeric) else {
                error!(property = %name, unit = %unit_name, "no measurement scale; parameter skipped");
                return None;
            };
            let scale_iid = scale.iid;
            let parameter_type = resolve_or_create(ctx, &name, &short, || {
                ParameterType::new(
                    name.clone(),
                    short.clone(),
                    ParameterTypeKind::QuantityKind {
                        default_scale: scale_iid,
                        possible_scales: vec![scale_iid],
                    },
                )
            })?;
            Some((parameter_type, Some(scale)))
        }
    }
}

/// Find or create the scale for a unit, creating the unit first if needed.
pub fn resolve_or_create_measurement_scale(
    ctx: &mut MappingContext<'_>,
    unit_name: &str,
    kind: LiteralKind,
) -> Option<MeasurementScale> {
    let unit = resolve_or_create_measurement_unit(ctx, unit_name)?;
    let short = short_name(unit_name);
    resolve_or_create(ctx, unit_name, &short, || {
        MeasurementScale::new(unit_name, short.clone(), unit.iid, kind.number_set())
    })
}

pub fn resolve_or_create_measurement_unit(
    ctx: &mut MappingContext<'_>,
    unit_name: &str,
) -> Option<MeasurementUnit> {
    let short = short_name(unit_name);
    resolve_or_create(ctx, unit_name, &short, || {
        MeasurementUnit::new(unit_name, short.clone())
    })
}

/// Render an optional value for a value set, using the "no value" rendering
/// for anything blank.
pub fn hub_value(value: Option<&str>, config: &MappingConfig) -> String {
    match value {
        Some(v) if !config.is_no_value(v) => v.to_string(),
        _ => config.no_value.clone(),
    }
}

// ============================================================================
// HUB → TOOL
// ============================================================================

/// Turn a parameter's manual value back into a tool literal.
///
/// The parameter type decides the literal kind. Blank and "no value" give
/// `None`; a quantity that does not parse as a number stays a string.
pub fn tool_value_specification(
    chain: &RdlChain<'_>,
    parameter: &Parameter,
    config: &MappingConfig,
) -> Option<ValueSpecification> {
    let value = parameter
        .primary_value_set()
        .and_then(|v| v.manual_value())
        .filter(|v| !config.is_no_value(v))
        .map(str::trim)?;

    let kind = chain
        .by_iid::<ParameterType>(parameter.parameter_type)
        .map(|t| &t.kind);

    Some(match kind {
        Some(ParameterTypeKind::QuantityKind { .. }) => match value.parse::<f64>() {
            Ok(v) => ValueSpecification::LiteralReal(v),
            Err(_) => ValueSpecification::string(value),
        },
        Some(ParameterTypeKind::Boolean) => match value.to_ascii_lowercase().as_str() {
            "true" => ValueSpecification::LiteralBoolean(true),
            "false" => ValueSpecification::LiteralBoolean(false),
            _ => ValueSpecification::string(value),
        },
        _ => ValueSpecification::string(value),
    })
}
