//! `cloudbit_compute_security_group` and `cloudbit_compute_security_group_rule`

use crate::common::{
    deleted, encode_all, found, id_attribute, id_filter, int_attr, location_attribute,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::{
    DIRECTION_EGRESS, DIRECTION_INGRESS, SecurityGroup, SecurityGroupCreate, SecurityGroupRule,
    SecurityGroupRuleOptions, SecurityGroupUpdate,
};
use cloudbit_plugin::{
    Attribute, AttributePath, DataSource, Diagnostic, Diagnostics, OperationContext, Resource,
    Schema, Validator, Value, import_ids,
};
use serde::{Deserialize, Serialize};

const PROTOCOLS: [&str; 4] = ["any", "tcp", "udp", "icmp"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SecurityGroupModel {
    id: Option<i64>,
    name: Option<String>,
    description: Option<String>,
    location_id: Option<i64>,
    default: Option<bool>,
}

impl From<&SecurityGroup> for SecurityGroupModel {
    fn from(group: &SecurityGroup) -> Self {
        Self {
            id: Some(group.id),
            name: Some(group.name.clone()),
            description: Some(group.description.clone().unwrap_or_default()),
            location_id: Some(group.location.id),
            default: Some(group.default),
        }
    }
}

pub struct SecurityGroupResource {
    client: ClientHandle,
}

impl SecurityGroupResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for SecurityGroupResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_security_group"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("security group"),
            Attribute::string("name")
                .description("name of the security group")
                .required()
                .validator(Validator::NonEmpty),
            Attribute::string("description")
                .description("description of the security group")
                .optional()
                .computed()
                .use_state_for_unknown(),
            location_attribute("security group"),
            Attribute::bool("default")
                .description("whether this is the default security group of the location")
                .computed()
                .use_state_for_unknown(),
        ])
        .description("Set of firewall rules applied to network interfaces.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: SecurityGroupModel = planned.decode()?;

        let body = SecurityGroupCreate {
            name: plan.name.unwrap_or_default(),
            description: plan.description,
            location_id: plan.location_id.unwrap_or_default(),
        };
        let group = client
            .security_groups()
            .create(&body)
            .await
            .action("create security group")?;

        Ok(Value::encode(&SecurityGroupModel::from(&group))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        match found(client.security_groups().get(id).await, "get security group")? {
            Some(group) => Ok(Some(Value::encode(&SecurityGroupModel::from(&group))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let id = int_attr(prior, "id")?;
        let plan: SecurityGroupModel = planned.decode()?;

        let body = SecurityGroupUpdate {
            name: plan.name,
            description: plan.description,
        };
        let group = client
            .security_groups()
            .update(id, &body)
            .await
            .action("update security group")?;

        Ok(Value::encode(&SecurityGroupModel::from(&group))?)
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;
        deleted(
            client.security_groups().delete(id).await,
            "delete security group",
        )
    }
}

pub struct SecurityGroupDataSource {
    client: ClientHandle,
}

impl SecurityGroupDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SecurityGroupDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_security_group"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("security group"),
            Attribute::string("name")
                .description("name of the security group")
                .optional()
                .computed(),
            Attribute::int64("location_id")
                .description("location of the security group")
                .optional()
                .computed(),
            Attribute::bool("default")
                .description("whether this is the default security group of the location")
                .optional()
                .computed(),
            Attribute::string("description")
                .description("description of the security group")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let groups = client
            .security_groups()
            .list()
            .await
            .action("list security groups")?;

        let candidates = encode_all::<_, SecurityGroupModel>(&groups)?;
        filter::find_one("security group", &self.schema(), config, candidates)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SecurityGroupRuleModel {
    id: Option<i64>,
    security_group_id: Option<i64>,
    direction: Option<String>,
    protocol: Option<String>,
    from_port: Option<i64>,
    to_port: Option<i64>,
    icmp_type: Option<i64>,
    icmp_code: Option<i64>,
    ip_range: Option<String>,
    remote_security_group_id: Option<i64>,
}

impl SecurityGroupRuleModel {
    fn new(security_group_id: i64, rule: &SecurityGroupRule) -> Self {
        Self {
            id: Some(rule.id),
            security_group_id: Some(security_group_id),
            direction: Some(rule.direction.clone()),
            protocol: Some(rule.protocol.clone()),
            from_port: rule.from_port,
            to_port: rule.to_port,
            icmp_type: rule.icmp_type,
            icmp_code: rule.icmp_code,
            ip_range: rule.ip_range.clone(),
            remote_security_group_id: rule.remote_security_group.as_ref().map(|g| g.id),
        }
    }

    fn options(&self) -> SecurityGroupRuleOptions {
        SecurityGroupRuleOptions {
            direction: self.direction.clone().unwrap_or_default(),
            protocol: self.protocol.clone().unwrap_or_default(),
            from_port: self.from_port,
            to_port: self.to_port,
            icmp_type: self.icmp_type,
            icmp_code: self.icmp_code,
            ip_range: self.ip_range.clone(),
            remote_security_group_id: self.remote_security_group_id,
        }
    }
}

fn validate_rule(config: &Value) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let protocol = config.attr("protocol").as_str().unwrap_or_default();
    let ports = ["from_port", "to_port"];
    let icmp = ["icmp_type", "icmp_code"];

    let misplaced: &[&str] = match protocol {
        "tcp" | "udp" => &icmp,
        "icmp" => &ports,
        "any" => &["from_port", "to_port", "icmp_type", "icmp_code"],
        _ => &[],
    };
    for name in misplaced {
        let value = config.attr(name);
        if !value.is_null() && !value.is_unknown() {
            diags.push(
                Diagnostic::error(
                    "Invalid Attribute Combination",
                    format!("Attribute {} can not be used with protocol {:?}.", name, protocol),
                )
                .with_attribute(AttributePath::root(*name)),
            );
        }
    }

    if let (Some(from), Some(to)) = (
        config.attr("from_port").as_i64(),
        config.attr("to_port").as_i64(),
    ) {
        if from > to {
            diags.push(
                Diagnostic::error(
                    "Invalid Port Range",
                    format!("from_port ({}) must not be greater than to_port ({}).", from, to),
                )
                .with_attribute(AttributePath::root("from_port")),
            );
        }
    }

    if !config.attr("ip_range").is_null() && !config.attr("remote_security_group_id").is_null() {
        diags.push(Diagnostic::error(
            "Invalid Attribute Combination",
            "Only one of ip_range and remote_security_group_id can be set.",
        ));
    }

    diags
}

pub struct SecurityGroupRuleResource {
    client: ClientHandle,
}

impl SecurityGroupRuleResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for SecurityGroupRuleResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_security_group_rule"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("security group rule"),
            Attribute::int64("security_group_id")
                .description("security group the rule belongs to")
                .required()
                .requires_replace(),
            Attribute::string("direction")
                .description("direction of the traffic, `ingress` or `egress`")
                .required()
                .validator(Validator::one_of([DIRECTION_INGRESS, DIRECTION_EGRESS])),
            Attribute::string("protocol")
                .description("protocol of the traffic, one of `any`, `tcp`, `udp` or `icmp`")
                .required()
                .validator(Validator::one_of(PROTOCOLS)),
            Attribute::int64("from_port")
                .description("first port of the range (tcp and udp only)")
                .optional()
                .validator(Validator::int_range(1, 65535)),
            Attribute::int64("to_port")
                .description("last port of the range (tcp and udp only)")
                .optional()
                .validator(Validator::int_range(1, 65535)),
            Attribute::int64("icmp_type")
                .description("icmp type (icmp only)")
                .optional()
                .validator(Validator::int_range(0, 255)),
            Attribute::int64("icmp_code")
                .description("icmp code (icmp only)")
                .optional()
                .validator(Validator::int_range(0, 255)),
            Attribute::string("ip_range")
                .description("remote address range in CIDR notation")
                .optional()
                .validator(Validator::Cidr),
            Attribute::int64("remote_security_group_id")
                .description("remote security group")
                .optional(),
        ])
        .description("Firewall rule of a security group.")
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        validate_rule(config)
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: SecurityGroupRuleModel = planned.decode()?;
        let group_id = int_attr(planned, "security_group_id")?;

        let rule = client
            .security_group_rules(group_id)
            .create(&plan.options())
            .await
            .action("create security group rule")?;

        Ok(Value::encode(&SecurityGroupRuleModel::new(group_id, &rule))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let group_id = int_attr(state, "security_group_id")?;
        let id = int_attr(state, "id")?;

        match found(
            client.security_group_rules(group_id).get(id).await,
            "get security group rule",
        )? {
            Some(rule) => Ok(Some(Value::encode(&SecurityGroupRuleModel::new(
                group_id, &rule,
            ))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let group_id = int_attr(prior, "security_group_id")?;
        let id = int_attr(prior, "id")?;
        let plan: SecurityGroupRuleModel = planned.decode()?;

        let rule = client
            .security_group_rules(group_id)
            .update(id, &plan.options())
            .await
            .action("update security group rule")?;

        Ok(Value::encode(&SecurityGroupRuleModel::new(group_id, &rule))?)
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let group_id = int_attr(state, "security_group_id")?;
        let id = int_attr(state, "id")?;
        deleted(
            client.security_group_rules(group_id).delete(id).await,
            "delete security group rule",
        )
    }

    fn import(&self, id: &str) -> std::result::Result<Value, Diagnostics> {
        import_ids(id, &["security_group_id", "id"])
    }
}

pub struct SecurityGroupRuleDataSource {
    client: ClientHandle,
}

impl SecurityGroupRuleDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SecurityGroupRuleDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_security_group_rule"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("security_group_id")
                .description("security group the rule belongs to")
                .required(),
            id_filter("security group rule"),
            Attribute::string("direction")
                .description("direction of the traffic")
                .optional()
                .computed(),
            Attribute::string("protocol")
                .description("protocol of the traffic")
                .optional()
                .computed(),
            Attribute::int64("from_port")
                .description("first port of the range")
                .computed(),
            Attribute::int64("to_port")
                .description("last port of the range")
                .computed(),
            Attribute::int64("icmp_type")
                .description("icmp type")
                .computed(),
            Attribute::int64("icmp_code")
                .description("icmp code")
                .computed(),
            Attribute::string("ip_range")
                .description("remote address range")
                .computed(),
            Attribute::int64("remote_security_group_id")
                .description("remote security group")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let group_id = int_attr(config, "security_group_id")?;
        let rules = client
            .security_group_rules(group_id)
            .list()
            .await
            .action("list security group rules")?;

        let candidates = rules
            .iter()
            .map(|r| Value::encode(&SecurityGroupRuleModel::new(group_id, r)))
            .collect::<cloudbit_plugin::Result<Vec<_>>>()?;
        filter::find_one("security group rule", &self.schema(), config, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(attributes: &[(&str, Value)]) -> Value {
        Value::object(attributes.iter().map(|(k, v)| (*k, v.clone())))
    }

    #[test]
    fn test_tcp_rule_with_ports_is_valid() {
        let config = rule(&[
            ("protocol", Value::from("tcp")),
            ("from_port", Value::from(80)),
            ("to_port", Value::from(443)),
        ]);
        assert!(validate_rule(&config).is_empty());
    }

    #[test]
    fn test_icmp_rule_rejects_ports() {
        let config = rule(&[
            ("protocol", Value::from("icmp")),
            ("from_port", Value::from(80)),
        ]);
        let diags = validate_rule(&config);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags.iter().next().unwrap().attribute,
            Some(AttributePath::root("from_port"))
        );
    }

    #[test]
    fn test_inverted_port_range() {
        let config = rule(&[
            ("protocol", Value::from("udp")),
            ("from_port", Value::from(500)),
            ("to_port", Value::from(100)),
        ]);
        assert!(validate_rule(&config).has_error());
    }

    #[test]
    fn test_ip_range_and_remote_group_exclusive() {
        let config = rule(&[
            ("protocol", Value::from("any")),
            ("ip_range", Value::from("0.0.0.0/0")),
            ("remote_security_group_id", Value::from(5)),
        ]);
        assert!(validate_rule(&config).has_error());
    }
}
