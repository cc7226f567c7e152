//! Data source lookups
//!
//! A data source lists every entity of its kind and keeps the ones its
//! configuration applies to. Every settable attribute of the data source
//! schema acts as a filter: when it is set, the entity must carry the same
//! value.

use crate::error::{ProviderError, Result};
use cloudbit_plugin::{Schema, Value};

/// Names of the attributes that act as filters
pub fn filter_attributes(schema: &Schema) -> Vec<&str> {
    schema
        .attributes
        .iter()
        .filter(|attr| attr.required || attr.optional)
        .map(|attr| attr.name.as_str())
        .collect()
}

/// Whether every set filter attribute of `config` matches `candidate`
pub fn applies_to(config: &Value, candidate: &Value, filters: &[&str]) -> bool {
    filters.iter().all(|name| {
        let wanted = config.attr(name);
        wanted.is_null() || wanted.is_unknown() || wanted == candidate.attr(name)
    })
}

/// Find the single candidate the configuration applies to
pub fn find_one<I>(kind: &str, schema: &Schema, config: &Value, candidates: I) -> Result<Value>
where
    I: IntoIterator<Item = Value>,
{
    let filters = filter_attributes(schema);
    let mut matches: Vec<Value> = candidates
        .into_iter()
        .filter(|candidate| applies_to(config, candidate, &filters))
        .collect();

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(ProviderError::NotFound {
            kind: kind.to_string(),
            reason: "no result matches the given filters".to_string(),
        }),
        n => Err(ProviderError::NotFound {
            kind: kind.to_string(),
            reason: format!("found {} results, please specify more filters", n),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudbit_plugin::Attribute;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::int64("id").optional().computed(),
            Attribute::string("name").optional().computed(),
            Attribute::string("cidr").computed(),
        ])
    }

    fn network(id: i64, name: &str, cidr: &str) -> Value {
        Value::object([
            ("id", Value::from(id)),
            ("name", Value::from(name)),
            ("cidr", Value::from(cidr)),
        ])
    }

    fn candidates() -> Vec<Value> {
        vec![
            network(1, "frontend", "10.0.0.0/24"),
            network(2, "backend", "10.0.1.0/24"),
            network(3, "backend", "10.0.2.0/24"),
        ]
    }

    #[test]
    fn test_filter_attributes_skip_computed_only() {
        assert_eq!(filter_attributes(&schema()), ["id", "name"]);
    }

    #[test]
    fn test_find_one_match() {
        let config = Value::object([("name", Value::from("frontend"))]);
        let found = find_one("network", &schema(), &config, candidates()).unwrap();
        assert_eq!(found.attr("id").as_i64(), Some(1));
    }

    #[test]
    fn test_find_one_none() {
        let config = Value::object([("name", Value::from("storage"))]);
        let err = find_one("network", &schema(), &config, candidates()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to find network: no result matches the given filters"
        );
    }

    #[test]
    fn test_find_one_many() {
        let config = Value::object([("name", Value::from("backend"))]);
        let err = find_one("network", &schema(), &config, candidates()).unwrap_err();
        assert!(err.to_string().contains("found 2 results"));

        let config = Value::object([("name", Value::from("backend")), ("id", Value::from(3))]);
        let found = find_one("network", &schema(), &config, candidates()).unwrap();
        assert_eq!(found.attr("cidr").as_str(), Some("10.0.2.0/24"));
    }

    #[test]
    fn test_computed_attributes_do_not_filter() {
        let config = Value::object([
            ("id", Value::from(1)),
            ("cidr", Value::from("192.168.0.0/16")),
        ]);
        assert!(find_one("network", &schema(), &config, candidates()).is_ok());
    }
}
