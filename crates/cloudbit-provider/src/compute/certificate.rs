//! `cloudbit_compute_certificate`

use crate::common::{
    deleted, encode_all, found, id_attribute, id_filter, int_attr, location_attribute,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::{Certificate, CertificateCreate};
use cloudbit_plugin::{Attribute, DataSource, OperationContext, Resource, Schema, Validator, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CertificateModel {
    id: Option<i64>,
    name: Option<String>,
    location_id: Option<i64>,
    certificate: Option<String>,
    private_key: Option<String>,
    subject: Option<String>,
    issuer: Option<String>,
    valid_from: Option<String>,
    valid_to: Option<String>,
    serial: Option<String>,
}

impl From<&Certificate> for CertificateModel {
    fn from(certificate: &Certificate) -> Self {
        Self {
            id: Some(certificate.id),
            name: Some(certificate.name.clone()),
            location_id: Some(certificate.location.id),
            certificate: None,
            private_key: None,
            subject: Some(certificate.details.subject.clone()),
            issuer: Some(certificate.details.issuer.clone()),
            valid_from: Some(certificate.details.valid_from.clone()),
            valid_to: Some(certificate.details.valid_to.clone()),
            serial: Some(certificate.details.serial.clone()),
        }
    }
}

impl CertificateModel {
    /// The API never returns the PEM material, keep what is in state
    fn with_secrets_of(mut self, state: &CertificateModel) -> Self {
        self.certificate = state.certificate.clone();
        self.private_key = state.private_key.clone();
        self
    }
}

fn detail_attributes(computed_only: bool) -> Vec<Attribute> {
    let attr = |name: &str, description: &str| {
        let attr = Attribute::string(name).description(description).computed();
        if computed_only {
            attr
        } else {
            attr.use_state_for_unknown()
        }
    };

    vec![
        attr("subject", "subject of the certificate"),
        attr("issuer", "issuer of the certificate"),
        attr("valid_from", "start of the validity period"),
        attr("valid_to", "end of the validity period"),
        attr("serial", "serial number of the certificate"),
    ]
}

pub struct CertificateResource {
    client: ClientHandle,
}

impl CertificateResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for CertificateResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_certificate"
    }

    fn schema(&self) -> Schema {
        let mut attributes = vec![
            id_attribute("certificate"),
            Attribute::string("name")
                .description("name of the certificate")
                .required()
                .requires_replace(),
            location_attribute("certificate"),
            Attribute::string("certificate")
                .description("PEM encoded certificate chain")
                .required()
                .requires_replace()
                .validator(Validator::NonEmpty),
            Attribute::string("private_key")
                .description("PEM encoded private key of the certificate")
                .required()
                .sensitive()
                .requires_replace()
                .validator(Validator::NonEmpty),
        ];
        attributes.extend(detail_attributes(false));

        Schema::new(attributes).description("TLS certificate for load balancer pools.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: CertificateModel = planned.decode()?;

        let body = CertificateCreate {
            name: plan.name.clone().unwrap_or_default(),
            location_id: plan.location_id.unwrap_or_default(),
            certificate: plan.certificate.clone().unwrap_or_default(),
            private_key: plan.private_key.clone().unwrap_or_default(),
        };

        let certificate = client
            .certificates()
            .create(&body)
            .await
            .action("create certificate")?;

        Ok(Value::encode(
            &CertificateModel::from(&certificate).with_secrets_of(&plan),
        )?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let current: CertificateModel = state.decode()?;
        let id = int_attr(state, "id")?;

        match found(client.certificates().get(id).await, "get certificate")? {
            Some(certificate) => Ok(Some(Value::encode(
                &CertificateModel::from(&certificate).with_secrets_of(&current),
            )?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, _prior: &Value, _planned: &Value) -> Result<Value> {
        Err(ProviderError::UpdateNotSupported(
            "cloudbit_compute_certificate".to_string(),
        ))
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;
        deleted(client.certificates().delete(id).await, "delete certificate")
    }
}

pub struct CertificateDataSource {
    client: ClientHandle,
}

impl CertificateDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for CertificateDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_certificate"
    }

    fn schema(&self) -> Schema {
        let mut attributes = vec![
            id_filter("certificate"),
            Attribute::string("name")
                .description("name of the certificate")
                .optional()
                .computed(),
            Attribute::int64("location_id")
                .description("location of the certificate")
                .optional()
                .computed(),
        ];
        attributes.extend(detail_attributes(true));

        Schema::new(attributes)
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let certificates = client
            .certificates()
            .list()
            .await
            .action("list certificates")?;

        let candidates = encode_all::<_, CertificateModel>(&certificates)?;
        filter::find_one("certificate", &self.schema(), config, candidates)
    }
}
