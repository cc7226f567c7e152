//! `tfplugin6.Provider` gRPC service
//!
//! Decodes protocol requests, dispatches them to the registered
//! [`Resource`] and [`DataSource`] implementations and encodes the
//! results. Operation failures travel back as diagnostics, never as gRPC
//! status errors.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::msgpack;
use crate::plan::plan_change;
use crate::proto::tfplugin6::{
    self, DynamicValue, apply_resource_change, configure_provider, get_metadata,
    get_provider_schema, import_resource_state, plan_resource_change, provider_server,
    read_data_source, read_resource, stop_provider, upgrade_resource_state,
    validate_data_resource_config, validate_provider_config, validate_resource_config,
};
use crate::provider::{DataSource, OperationContext, Provider, Resource};
use crate::schema::Schema;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

type DynResource<E> = Arc<dyn Resource<Error = E>>;
type DynDataSource<E> = Arc<dyn DataSource<Error = E>>;

/// gRPC service serving a [`Provider`]
pub struct PluginService<P: Provider> {
    provider: Arc<P>,
    resources: HashMap<String, DynResource<P::Error>>,
    data_sources: HashMap<String, DynDataSource<P::Error>>,
    stop: CancellationToken,
}

impl<P: Provider> PluginService<P> {
    pub fn new(provider: P) -> Self {
        let resources = provider
            .resources()
            .into_iter()
            .map(|r| (r.type_name().to_string(), r))
            .collect();
        let data_sources = provider
            .data_sources()
            .into_iter()
            .map(|d| (d.type_name().to_string(), d))
            .collect();

        Self {
            provider: Arc::new(provider),
            resources,
            data_sources,
            stop: CancellationToken::new(),
        }
    }

    pub fn into_server(self) -> provider_server::ProviderServer<Self> {
        provider_server::ProviderServer::new(self)
    }

    /// Token cancelled by `StopProvider`
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    fn context(&self) -> OperationContext {
        OperationContext::new(self.stop.child_token())
    }

    fn resource(&self, type_name: &str) -> Result<&DynResource<P::Error>, Diagnostics> {
        self.resources.get(type_name).ok_or_else(|| {
            Diagnostic::error(
                "Resource Type Not Found",
                format!("The resource type {:?} is not supported by this provider.", type_name),
            )
            .into()
        })
    }

    fn data_source(&self, type_name: &str) -> Result<&DynDataSource<P::Error>, Diagnostics> {
        self.data_sources.get(type_name).ok_or_else(|| {
            Diagnostic::error(
                "Data Source Type Not Found",
                format!("The data source type {:?} is not supported by this provider.", type_name),
            )
            .into()
        })
    }

    fn server_capabilities() -> tfplugin6::ServerCapabilities {
        tfplugin6::ServerCapabilities {
            plan_destroy: true,
            get_provider_schema_optional: false,
            move_resource_state: false,
        }
    }

    async fn configure(&self, req: configure_provider::Request) -> Result<(), Diagnostics> {
        let config = decode_value(req.config.as_ref(), &self.provider.schema())?;
        self.provider
            .configure(&self.context(), &config)
            .await
            .map_err(Into::into)
    }

    fn upgrade(
        &self,
        req: upgrade_resource_state::Request,
    ) -> Result<Option<DynamicValue>, Diagnostics> {
        let resource = self.resource(&req.type_name)?;
        let schema = resource.schema();

        if req.version > schema.version {
            return Err(Diagnostic::error(
                "Unable to Upgrade Resource State",
                format!(
                    "The stored state has schema version {}, which is newer than the provider's version {}.",
                    req.version, schema.version
                ),
            )
            .into());
        }

        let raw = req.raw_state.unwrap_or_default();
        if raw.json.is_empty() {
            if raw.flatmap.is_empty() {
                return encode_value(&Value::Null);
            }
            return Err(Diagnostic::error(
                "Unable to Upgrade Resource State",
                "Flatmap state is not supported by this provider.",
            )
            .into());
        }

        let state = Value::from_json_slice(&raw.json)?;
        encode_value(&schema.conform(state))
    }

    async fn read(
        &self,
        req: &read_resource::Request,
    ) -> Result<Option<DynamicValue>, Diagnostics> {
        let resource = self.resource(&req.type_name)?;
        let schema = resource.schema();
        let state = decode_value(req.current_state.as_ref(), &schema)?;

        if state.is_null() {
            return encode_value(&Value::Null);
        }

        match resource
            .read(&self.context(), &state)
            .await
            .map_err(Into::<Diagnostics>::into)?
        {
            Some(new_state) => encode_value(&schema.conform(new_state)),
            None => {
                info!(type_name = %req.type_name, "resource no longer exists, removing from state");
                encode_value(&Value::Null)
            }
        }
    }

    fn plan(
        &self,
        req: plan_resource_change::Request,
    ) -> Result<plan_resource_change::Response, Diagnostics> {
        let resource = self.resource(&req.type_name)?;
        let schema = resource.schema();
        let prior = decode_value(req.prior_state.as_ref(), &schema)?;
        let proposed = decode_value(req.proposed_new_state.as_ref(), &schema)?;
        let config = decode_value(req.config.as_ref(), &schema)?;

        let change = plan_change(&schema, &prior, &proposed, &config);

        Ok(plan_resource_change::Response {
            planned_state: encode_value(&change.planned_state)?,
            requires_replace: change.requires_replace.iter().map(Into::into).collect(),
            planned_private: req.prior_private,
            ..Default::default()
        })
    }

    async fn apply(
        &self,
        req: apply_resource_change::Request,
    ) -> Result<apply_resource_change::Response, Diagnostics> {
        let resource = self.resource(&req.type_name)?;
        let schema = resource.schema();
        let prior = decode_value(req.prior_state.as_ref(), &schema)?;
        let planned = decode_value(req.planned_state.as_ref(), &schema)?;
        let ctx = self.context();

        let (new_state, diagnostics) = if planned.is_null() {
            debug!(type_name = %req.type_name, "deleting resource");
            match resource.delete(&ctx, &prior).await {
                Ok(()) => (Value::Null, Diagnostics::new()),
                Err(e) => (prior, e.into()),
            }
        } else if prior.is_null() {
            debug!(type_name = %req.type_name, "creating resource");
            match resource.create(&ctx, &planned).await {
                Ok(state) => (schema.conform(state), Diagnostics::new()),
                Err(e) => (Value::Null, e.into()),
            }
        } else {
            debug!(type_name = %req.type_name, "updating resource");
            match resource.update(&ctx, &prior, &planned).await {
                Ok(state) => (schema.conform(state), Diagnostics::new()),
                Err(e) => (prior, e.into()),
            }
        };

        Ok(apply_resource_change::Response {
            new_state: encode_value(&new_state)?,
            private: req.planned_private,
            diagnostics: diagnostics.to_proto(),
            ..Default::default()
        })
    }

    async fn import(
        &self,
        req: import_resource_state::Request,
    ) -> Result<Vec<import_resource_state::ImportedResource>, Diagnostics> {
        let resource = self.resource(&req.type_name)?;
        let schema = resource.schema();
        let partial = schema.conform(resource.import(&req.id)?);

        let state = resource
            .read(&self.context(), &partial)
            .await
            .map_err(Into::<Diagnostics>::into)?
            .ok_or_else(|| {
                Diagnostics::from(Diagnostic::error(
                    "Cannot Import Non-Existent Remote Object",
                    format!(
                        "While attempting to import an existing object with id {:?}, the provider detected that no object exists with the given id.",
                        req.id
                    ),
                ))
            })?;

        Ok(vec![import_resource_state::ImportedResource {
            type_name: req.type_name,
            state: encode_value(&schema.conform(state))?,
            private: Vec::new(),
        }])
    }

    async fn read_data(
        &self,
        req: read_data_source::Request,
    ) -> Result<Option<DynamicValue>, Diagnostics> {
        let data_source = self.data_source(&req.type_name)?;
        let schema = data_source.schema();
        let config = decode_value(req.config.as_ref(), &schema)?;

        let state = data_source
            .read(&self.context(), &config)
            .await
            .map_err(Into::<Diagnostics>::into)?;
        encode_value(&schema.conform(state))
    }

    fn validate_resource(&self, type_name: &str, config: Option<&DynamicValue>) -> Diagnostics {
        let resource = match self.resource(type_name) {
            Ok(resource) => resource,
            Err(diags) => return diags,
        };
        validate_config(&resource.schema(), config, |c| resource.validate(c))
    }

    fn validate_data_source(&self, type_name: &str, config: Option<&DynamicValue>) -> Diagnostics {
        let data_source = match self.data_source(type_name) {
            Ok(data_source) => data_source,
            Err(diags) => return diags,
        };
        validate_config(&data_source.schema(), config, |c| data_source.validate(c))
    }
}

fn validate_config(
    schema: &Schema,
    config: Option<&DynamicValue>,
    extra: impl FnOnce(&Value) -> Diagnostics,
) -> Diagnostics {
    let config = match decode_value(config, schema) {
        Ok(config) => config,
        Err(diags) => return diags,
    };

    let mut diags = schema.validate(&config);
    if !diags.has_error() {
        diags.append(extra(&config));
    }
    diags
}

/// Decode a dynamic value and shape it after the schema
pub(crate) fn decode_value(
    value: Option<&DynamicValue>,
    schema: &Schema,
) -> Result<Value, Diagnostics> {
    let Some(value) = value else {
        return Ok(Value::Null);
    };

    let decoded = if !value.msgpack.is_empty() {
        msgpack::decode(&value.msgpack)?
    } else if !value.json.is_empty() {
        Value::from_json_slice(&value.json)?
    } else {
        Value::Null
    };

    Ok(schema.conform(decoded))
}

pub(crate) fn encode_value(value: &Value) -> Result<Option<DynamicValue>, Diagnostics> {
    Ok(Some(DynamicValue {
        msgpack: msgpack::encode(value)?,
        json: Vec::new(),
    }))
}

#[tonic::async_trait]
impl<P: Provider> provider_server::Provider for PluginService<P> {
    async fn get_metadata(
        &self,
        _request: Request<get_metadata::Request>,
    ) -> Result<Response<get_metadata::Response>, Status> {
        let mut resources: Vec<_> = self
            .resources
            .keys()
            .map(|type_name| get_metadata::ResourceMetadata {
                type_name: type_name.clone(),
            })
            .collect();
        resources.sort_by(|a, b| a.type_name.cmp(&b.type_name));

        let mut data_sources: Vec<_> = self
            .data_sources
            .keys()
            .map(|type_name| get_metadata::DataSourceMetadata {
                type_name: type_name.clone(),
            })
            .collect();
        data_sources.sort_by(|a, b| a.type_name.cmp(&b.type_name));

        Ok(Response::new(get_metadata::Response {
            server_capabilities: Some(Self::server_capabilities()),
            diagnostics: Vec::new(),
            data_sources,
            resources,
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<get_provider_schema::Request>,
    ) -> Result<Response<get_provider_schema::Response>, Status> {
        debug!(provider = self.provider.type_name(), "serving provider schema");

        Ok(Response::new(get_provider_schema::Response {
            provider: Some(self.provider.schema().to_proto()),
            resource_schemas: self
                .resources
                .iter()
                .map(|(name, r)| (name.clone(), r.schema().to_proto()))
                .collect(),
            data_source_schemas: self
                .data_sources
                .iter()
                .map(|(name, d)| (name.clone(), d.schema().to_proto()))
                .collect(),
            diagnostics: Vec::new(),
            provider_meta: None,
            server_capabilities: Some(Self::server_capabilities()),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<validate_provider_config::Request>,
    ) -> Result<Response<validate_provider_config::Response>, Status> {
        let req = request.into_inner();
        let diags = validate_config(&self.provider.schema(), req.config.as_ref(), |_| {
            Diagnostics::new()
        });

        Ok(Response::new(validate_provider_config::Response {
            diagnostics: diags.to_proto(),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<validate_resource_config::Request>,
    ) -> Result<Response<validate_resource_config::Response>, Status> {
        let req = request.into_inner();
        let diags = self.validate_resource(&req.type_name, req.config.as_ref());

        Ok(Response::new(validate_resource_config::Response {
            diagnostics: diags.to_proto(),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<validate_data_resource_config::Request>,
    ) -> Result<Response<validate_data_resource_config::Response>, Status> {
        let req = request.into_inner();
        let diags = self.validate_data_source(&req.type_name, req.config.as_ref());

        Ok(Response::new(validate_data_resource_config::Response {
            diagnostics: diags.to_proto(),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<upgrade_resource_state::Request>,
    ) -> Result<Response<upgrade_resource_state::Response>, Status> {
        let response = match self.upgrade(request.into_inner()) {
            Ok(upgraded_state) => upgrade_resource_state::Response {
                upgraded_state,
                diagnostics: Vec::new(),
            },
            Err(diags) => upgrade_resource_state::Response {
                upgraded_state: None,
                diagnostics: diags.to_proto(),
            },
        };

        Ok(Response::new(response))
    }

    async fn configure_provider(
        &self,
        request: Request<configure_provider::Request>,
    ) -> Result<Response<configure_provider::Response>, Status> {
        let req = request.into_inner();
        info!(terraform_version = %req.terraform_version, "configuring provider");

        let diagnostics = match self.configure(req).await {
            Ok(()) => Vec::new(),
            Err(diags) => {
                warn!("provider configuration failed");
                diags.to_proto()
            }
        };

        Ok(Response::new(configure_provider::Response { diagnostics }))
    }

    async fn read_resource(
        &self,
        request: Request<read_resource::Request>,
    ) -> Result<Response<read_resource::Response>, Status> {
        let req = request.into_inner();
        debug!(type_name = %req.type_name, "reading resource");

        let response = match self.read(&req).await {
            Ok(new_state) => read_resource::Response {
                new_state,
                diagnostics: Vec::new(),
                private: req.private,
            },
            Err(diags) => read_resource::Response {
                new_state: req.current_state,
                diagnostics: diags.to_proto(),
                private: req.private,
            },
        };

        Ok(Response::new(response))
    }

    async fn plan_resource_change(
        &self,
        request: Request<plan_resource_change::Request>,
    ) -> Result<Response<plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        debug!(type_name = %req.type_name, "planning resource change");

        let response = self.plan(req).unwrap_or_else(|diags| plan_resource_change::Response {
            diagnostics: diags.to_proto(),
            ..Default::default()
        });

        Ok(Response::new(response))
    }

    async fn apply_resource_change(
        &self,
        request: Request<apply_resource_change::Request>,
    ) -> Result<Response<apply_resource_change::Response>, Status> {
        let response = self
            .apply(request.into_inner())
            .await
            .unwrap_or_else(|diags| apply_resource_change::Response {
                diagnostics: diags.to_proto(),
                ..Default::default()
            });

        Ok(Response::new(response))
    }

    async fn import_resource_state(
        &self,
        request: Request<import_resource_state::Request>,
    ) -> Result<Response<import_resource_state::Response>, Status> {
        let req = request.into_inner();
        debug!(type_name = %req.type_name, id = %req.id, "importing resource");

        let response = match self.import(req).await {
            Ok(imported_resources) => import_resource_state::Response {
                imported_resources,
                diagnostics: Vec::new(),
            },
            Err(diags) => import_resource_state::Response {
                imported_resources: Vec::new(),
                diagnostics: diags.to_proto(),
            },
        };

        Ok(Response::new(response))
    }

    async fn read_data_source(
        &self,
        request: Request<read_data_source::Request>,
    ) -> Result<Response<read_data_source::Response>, Status> {
        let req = request.into_inner();
        debug!(type_name = %req.type_name, "reading data source");

        let response = match self.read_data(req).await {
            Ok(state) => read_data_source::Response {
                state,
                diagnostics: Vec::new(),
            },
            Err(diags) => read_data_source::Response {
                state: None,
                diagnostics: diags.to_proto(),
            },
        };

        Ok(Response::new(response))
    }

    async fn stop_provider(
        &self,
        _request: Request<stop_provider::Request>,
    ) -> Result<Response<stop_provider::Response>, Status> {
        info!("stop requested, cancelling in-flight operations");
        self.stop.cancel();

        Ok(Response::new(stop_provider::Response {
            error: String::new(),
        }))
    }
}
