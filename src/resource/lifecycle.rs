//! Resource lifecycle driver
//!
//! [`Lifecycle`] wraps a per-type [`ResourceHandler`] with the steps every
//! resource shares: schema validation and defaults, planning against prior
//! state, immutable-argument checks, action locks, read-after-write, and
//! set normalisation of the final state.
//!
//! Instance phases move `NonExistent -> Creating -> Created`, optionally
//! through `Updating` and back, and end with `Deleting -> NonExistent`.

use super::registry::{get_resource, ResourceDef, ResourceKind};
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::schema::{AttrMap, ResourceData};
use crate::services;
use crate::state::InstanceState;
use async_trait::async_trait;
use std::future::Future;
use std::time::Instant;
use tokio::sync::OwnedMutexGuard;
use tracing::Instrument;
use uuid::Uuid;

/// Per-type remote operations
///
/// `create` must set the ID. `read` clears the ID when the remote entity no
/// longer exists. `update` receives prior and planned attributes and should
/// only send what changed.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn create(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError>;
    async fn read(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError>;
    async fn update(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError>;
    async fn delete(&self, provider: &Provider, d: &ResourceData) -> Result<(), ProviderError>;
}

/// Read-only query of remote entities
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    async fn read(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NonExistent,
    Creating,
    Created,
    Updating,
    Deleting,
}

impl Phase {
    pub fn can_move_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (NonExistent, Creating)
                | (Creating, Created)
                | (Creating, NonExistent)
                | (Created, Updating)
                | (Updating, Created)
                | (Created, Deleting)
                | (Created, NonExistent)
                | (Deleting, NonExistent)
                | (Deleting, Created)
        )
    }
}

struct PhaseTracker<'a> {
    resource: &'a str,
    phase: Phase,
}

impl<'a> PhaseTracker<'a> {
    fn new(resource: &'a str, phase: Phase) -> Self {
        Self { resource, phase }
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_move_to(next),
            "invalid transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!("{} {:?} -> {:?}", self.resource, self.phase, next);
        self.phase = next;
    }
}

/// What applying a configuration will do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Create,
    NoOp,
    Update(Vec<String>),
    /// Attributes forcing a delete and re-create
    Replace(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Created(InstanceState),
    Updated(InstanceState),
    Replaced(InstanceState),
    Unchanged(InstanceState),
}

impl Applied {
    pub fn state(&self) -> &InstanceState {
        match self {
            Applied::Created(s) | Applied::Updated(s) | Applied::Replaced(s) | Applied::Unchanged(s) => s,
        }
    }

    pub fn into_state(self) -> InstanceState {
        match self {
            Applied::Created(s) | Applied::Updated(s) | Applied::Replaced(s) | Applied::Unchanged(s) => s,
        }
    }
}

pub struct Lifecycle<'a> {
    provider: &'a Provider,
    type_name: String,
    def: &'static ResourceDef,
    handler: Box<dyn ResourceHandler>,
}

impl<'a> Lifecycle<'a> {
    pub fn new(provider: &'a Provider, type_name: &str) -> Result<Self, ProviderError> {
        let def = get_resource(type_name)
            .filter(|def| def.kind == ResourceKind::Resource)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))?;
        let handler = services::handler_for(type_name, def)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))?;
        Ok(Self::with_handler(provider, type_name, def, handler))
    }

    pub fn with_handler(
        provider: &'a Provider,
        type_name: &str,
        def: &'static ResourceDef,
        handler: Box<dyn ResourceHandler>,
    ) -> Self {
        Self {
            provider,
            type_name: type_name.to_string(),
            def,
            handler,
        }
    }

    pub fn def(&self) -> &'static ResourceDef {
        self.def
    }

    /// Diff prior state against a configuration without calling the API
    pub fn plan(&self, prior: Option<&InstanceState>, config: &AttrMap) -> Result<Plan, ProviderError> {
        let config = self.prepare(config)?;
        let Some(prior) = prior else {
            return Ok(Plan::Create);
        };

        let d = self.planned_data(prior, config);
        let changed = d.changed_keys();
        if changed.is_empty() {
            return Ok(Plan::NoOp);
        }

        let replace = self.force_new_changes(&d);
        if !replace.is_empty() {
            return Ok(Plan::Replace(replace));
        }

        self.check_immutable(&d)?;
        Ok(Plan::Update(changed))
    }

    /// Plan, then create, update or replace as needed
    pub async fn apply(&self, prior: Option<&InstanceState>, config: &AttrMap) -> Result<Applied, ProviderError> {
        let Some(prior) = prior else {
            return self.create(config).await.map(Applied::Created);
        };

        match self.plan(Some(prior), config)? {
            Plan::NoOp => Ok(Applied::Unchanged(prior.clone())),
            Plan::Create => self.create(config).await.map(Applied::Created),
            Plan::Update(_) => self.update(prior, config).await.map(Applied::Updated),
            Plan::Replace(reasons) => {
                tracing::info!("{} must be replaced, changed: {}", self.type_name, reasons.join(", "));
                self.delete(prior).await?;
                self.create(config)
                    .await
                    .map(Applied::Replaced)
                    .map_err(|e| ProviderError::ReplaceFailed {
                        id: prior.id.clone(),
                        source: Box::new(e),
                    })
            },
        }
    }

    pub async fn create(&self, config: &AttrMap) -> Result<InstanceState, ProviderError> {
        instrumented(&self.type_name, "create", async {
            let config = self.prepare(config)?;
            let mut phase = PhaseTracker::new(&self.type_name, Phase::NonExistent);
            phase.advance(Phase::Creating);

            let mut d = ResourceData::new(config);
            let _guard = self.lock().await;

            if let Err(e) = self.handler.create(self.provider, &mut d).await {
                phase.advance(Phase::NonExistent);
                return Err(e);
            }
            if d.id().is_empty() {
                phase.advance(Phase::NonExistent);
                return Err(ProviderError::MissingId(self.type_name.clone()));
            }

            let id = d.id().to_string();
            self.handler.read(self.provider, &mut d).await?;
            if d.is_gone() {
                return Err(ProviderError::not_found(&self.type_name, &id));
            }

            phase.advance(Phase::Created);
            Ok(self.finish(d))
        })
        .await
    }

    /// Refresh an instance; `None` means it no longer exists remotely
    pub async fn read(&self, state: &InstanceState) -> Result<Option<InstanceState>, ProviderError> {
        instrumented(&self.type_name, "read", async {
            let mut d = ResourceData::from_state(&state.id, state.attributes.clone());
            self.handler.read(self.provider, &mut d).await?;

            if d.is_gone() {
                tracing::warn!(
                    "resource `{}` [{}] not found, please check if it has been deleted.",
                    self.type_name,
                    state.id
                );
                let mut phase = PhaseTracker::new(&self.type_name, Phase::Created);
                phase.advance(Phase::NonExistent);
                return Ok(None);
            }

            Ok(Some(self.finish(d)))
        })
        .await
    }

    pub async fn update(&self, prior: &InstanceState, config: &AttrMap) -> Result<InstanceState, ProviderError> {
        instrumented(&self.type_name, "update", async {
            let config = self.prepare(config)?;
            let mut d = self.planned_data(prior, config);

            self.check_immutable(&d)?;
            let replace = self.force_new_changes(&d);
            if !replace.is_empty() {
                return Err(ProviderError::RequiresReplace(replace));
            }

            let mut phase = PhaseTracker::new(&self.type_name, Phase::Created);
            phase.advance(Phase::Updating);
            let _guard = self.lock().await;

            let result = self.handler.update(self.provider, &mut d).await;
            phase.advance(Phase::Created);
            result?;

            self.handler.read(self.provider, &mut d).await?;
            if d.is_gone() {
                return Err(ProviderError::not_found(&self.type_name, &prior.id));
            }
            Ok(self.finish(d))
        })
        .await
    }

    pub async fn delete(&self, state: &InstanceState) -> Result<(), ProviderError> {
        instrumented(&self.type_name, "delete", async {
            let mut phase = PhaseTracker::new(&self.type_name, Phase::Created);
            phase.advance(Phase::Deleting);

            let d = ResourceData::from_state(&state.id, state.attributes.clone());
            let _guard = self.lock().await;

            if let Err(e) = self.handler.delete(self.provider, &d).await {
                phase.advance(Phase::Created);
                return Err(e);
            }
            phase.advance(Phase::NonExistent);
            Ok(())
        })
        .await
    }

    /// Adopt an existing remote entity by ID
    pub async fn import(&self, id: &str) -> Result<InstanceState, ProviderError> {
        if !self.def.importable {
            return Err(ProviderError::NotImportable(self.type_name.clone()));
        }

        instrumented(&self.type_name, "import", async {
            let mut d = ResourceData::for_import(id);
            self.handler.read(self.provider, &mut d).await?;
            if d.is_gone() {
                return Err(ProviderError::not_found(&self.type_name, id));
            }
            Ok(self.finish(d))
        })
        .await
    }

    fn prepare(&self, config: &AttrMap) -> Result<AttrMap, ProviderError> {
        self.def.schema.validate(config)?;
        let mut config = config.clone();
        self.def.schema.apply_defaults(&mut config);
        self.def.schema.normalize(&mut config);
        Ok(config)
    }

    /// Prior state against the planned attributes; computed values absent
    /// from the configuration carry over from prior state
    fn planned_data(&self, prior: &InstanceState, mut planned: AttrMap) -> ResourceData {
        for (name, attr) in self.def.schema.iter() {
            if !attr.computed || planned.contains_key(name) {
                continue;
            }
            if let Some(value) = prior.attributes.get(name) {
                planned.insert(name.clone(), value.clone());
            }
        }
        ResourceData::for_update(&prior.id, prior.attributes.clone(), planned)
    }

    fn check_immutable(&self, d: &ResourceData) -> Result<(), ProviderError> {
        match self.def.immutable.iter().find(|name| d.has_change(name)) {
            Some(name) => Err(ProviderError::Immutable(name.clone())),
            None => Ok(()),
        }
    }

    fn force_new_changes(&self, d: &ResourceData) -> Vec<String> {
        self.def
            .schema
            .force_new_attributes()
            .filter(|name| d.has_change(name))
            .map(str::to_string)
            .collect()
    }

    async fn lock(&self) -> Option<OwnedMutexGuard<()>> {
        match &self.def.lock {
            Some(name) => Some(self.provider.locks.acquire(name).await),
            None => None,
        }
    }

    fn finish(&self, d: ResourceData) -> InstanceState {
        let id = d.id().to_string();
        let mut attributes = d.into_attributes();
        self.def.schema.normalize(&mut attributes);

        let missing = self.def.schema.missing_computed(&attributes);
        if !missing.is_empty() {
            tracing::debug!("{} [{}] computed attributes not returned: {:?}", self.type_name, id, missing);
        }

        InstanceState {
            resource_type: self.type_name.clone(),
            id,
            attributes,
        }
    }
}

/// Run a data source query
pub async fn read_data_source(
    provider: &Provider,
    type_name: &str,
    config: &AttrMap,
) -> Result<InstanceState, ProviderError> {
    let def = get_resource(type_name)
        .filter(|def| def.kind == ResourceKind::DataSource)
        .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))?;
    let handler = services::data_source_for(type_name, def)
        .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))?;

    instrumented(type_name, "read", async {
        def.schema.validate(config)?;
        let mut config = config.clone();
        def.schema.apply_defaults(&mut config);

        let mut d = ResourceData::new(config);
        handler.read(provider, &mut d).await?;

        let id = d.id().to_string();
        let mut attributes = d.into_attributes();
        def.schema.normalize(&mut attributes);
        Ok(InstanceState {
            resource_type: type_name.to_string(),
            id,
            attributes,
        })
    })
    .await
}

/// Run one operation inside a span carrying a fresh log id, logging its
/// elapsed time
async fn instrumented<T, F>(type_name: &str, op: &'static str, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let log_id = Uuid::new_v4();
    let span = tracing::info_span!("resource", r#type = %type_name, op, log_id = %log_id);
    let start = Instant::now();

    let result = fut.instrument(span.clone()).await;

    span.in_scope(|| match &result {
        Ok(_) => tracing::info!(
            "[ELAPSED] resource.{}.{} elapsed {} ms",
            type_name,
            op,
            start.elapsed().as_millis()
        ),
        Err(e) => tracing::warn!("[CRITAL] resource.{}.{} failed, reason: {}", type_name, op, e),
    });
    result
}
