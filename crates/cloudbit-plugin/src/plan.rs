//! Planned state computation for `PlanResourceChange`

use crate::diagnostics::AttributePath;
use crate::schema::{Attribute, AttributeKind, Nesting, Schema};
use crate::value::Value;

/// Result of planning a resource change
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub planned_state: Value,
    pub requires_replace: Vec<AttributePath>,
}

/// Compute the planned state from the prior state, Terraform's proposed new
/// state and the raw configuration.
///
/// - destroy (proposed is null) plans null
/// - unset attributes with a default plan their default
/// - create marks other unset computed attributes unknown
/// - update is a no-op when the planned state equals the prior state;
///   otherwise unset computed attributes become unknown unless they keep
///   their prior value
pub fn plan_change(
    schema: &Schema,
    prior: &Value,
    proposed: &Value,
    config: &Value,
) -> PlannedChange {
    if proposed.is_null() {
        return PlannedChange {
            planned_state: Value::Null,
            requires_replace: Vec::new(),
        };
    }

    if !prior.is_null() {
        let settled = plan_object(
            &schema.attributes,
            prior,
            proposed,
            config,
            &AttributePath::default(),
            Unset::KeepPrior,
            &mut Vec::new(),
        );
        if &settled == prior {
            return PlannedChange {
                planned_state: settled,
                requires_replace: Vec::new(),
            };
        }
    }

    let mut requires_replace = Vec::new();
    let planned_state = plan_object(
        &schema.attributes,
        prior,
        proposed,
        config,
        &AttributePath::default(),
        Unset::Unknown,
        &mut requires_replace,
    );

    PlannedChange {
        planned_state,
        requires_replace,
    }
}

/// Planned value of computed attributes without configuration or default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unset {
    KeepPrior,
    Unknown,
}

fn plan_object(
    attributes: &[Attribute],
    prior: &Value,
    proposed: &Value,
    config: &Value,
    path: &AttributePath,
    unset: Unset,
    requires_replace: &mut Vec<AttributePath>,
) -> Value {
    let creating = prior.is_null();

    Value::object(attributes.iter().map(|attr| {
        let prior_value = prior.attr(&attr.name);
        let proposed_value = proposed.attr(&attr.name);
        let config_value = config.attr(&attr.name);
        let attr_path = path.attribute(attr.name.clone());

        let planned = if attr.computed && config_value.is_null() {
            if let Some(default) = &attr.default {
                default.clone()
            } else if !creating && (attr.use_state_for_unknown || unset == Unset::KeepPrior) {
                prior_value.clone()
            } else {
                Value::Unknown
            }
        } else {
            match &attr.kind {
                AttributeKind::Nested {
                    nesting: Nesting::Single,
                    attributes,
                } if !proposed_value.is_null() && !proposed_value.is_unknown() => plan_object(
                    attributes,
                    prior_value,
                    proposed_value,
                    config_value,
                    &attr_path,
                    unset,
                    requires_replace,
                ),
                _ => proposed_value.clone(),
            }
        };

        if !creating && attr.requires_replace && !planned.is_unknown() && &planned != prior_value {
            requires_replace.push(attr_path);
        }

        (attr.name.clone(), planned)
    }))
}
