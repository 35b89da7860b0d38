//! Resource and data source lifecycle.
//!
//! Resources are written against the typed [`Resource`] / [`DataSource`]
//! traits. The registry and the CLI work with the JSON-erased
//! [`DynResource`] / [`DynDataSource`] views, which every typed
//! implementation gets for free.

mod diagnostics;
mod import_id;
mod registry;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::retry::Cancellation;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use import_id::parse_import_id;
pub use registry::ProviderRegistry;

/// A managed Dashboard object with a full create/read/update/delete cycle.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Plan and state share one model; computed attributes are `None` in a
    /// plan until the API fills them in.
    type Model: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Terraform-style type name, e.g. `meraki_networks_appliance_vlans`.
    fn type_name(&self) -> &'static str;

    /// Checks a plan before it is applied. Errors stop the apply; warnings
    /// are shown and the apply goes ahead.
    fn validate(&self, _plan: &Self::Model) -> Diagnostics {
        Diagnostics::new()
    }

    async fn create(
        &self,
        cancel: &Cancellation,
        plan: Self::Model,
    ) -> Result<Self::Model, Diagnostics>;

    /// Refreshes `state` from the API. `Ok(None)` means the object no longer
    /// exists and should be dropped from state.
    async fn read(
        &self,
        cancel: &Cancellation,
        state: Self::Model,
    ) -> Result<Option<Self::Model>, Diagnostics>;

    async fn update(
        &self,
        cancel: &Cancellation,
        plan: Self::Model,
        state: Self::Model,
    ) -> Result<Self::Model, Diagnostics>;

    async fn delete(&self, cancel: &Cancellation, state: Self::Model) -> Result<(), Diagnostics>;

    /// Builds the identifying part of a model from an import ID. The caller
    /// completes it with [`Resource::read`].
    fn import_state(&self, id: &str) -> Result<Self::Model, Diagnostics>;
}

/// A read-only lookup against the Dashboard API.
#[async_trait]
pub trait DataSource: Send + Sync {
    type Config: DeserializeOwned + Send + Sync + 'static;
    type Model: Serialize + Send + Sync + 'static;

    fn type_name(&self) -> &'static str;

    async fn read(
        &self,
        cancel: &Cancellation,
        config: Self::Config,
    ) -> Result<Self::Model, Diagnostics>;
}

/// [`Resource`] with models exchanged as JSON values.
#[async_trait]
pub trait DynResource: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn validate(&self, plan: &Value) -> Diagnostics;
    async fn create(&self, cancel: &Cancellation, plan: Value) -> Result<Value, Diagnostics>;
    async fn read(&self, cancel: &Cancellation, state: Value)
    -> Result<Option<Value>, Diagnostics>;
    async fn update(
        &self,
        cancel: &Cancellation,
        plan: Value,
        state: Value,
    ) -> Result<Value, Diagnostics>;
    async fn delete(&self, cancel: &Cancellation, state: Value) -> Result<(), Diagnostics>;
    fn import_state(&self, id: &str) -> Result<Value, Diagnostics>;
}

/// [`DataSource`] with configuration and result exchanged as JSON values.
#[async_trait]
pub trait DynDataSource: Send + Sync {
    fn type_name(&self) -> &'static str;
    async fn read(&self, cancel: &Cancellation, config: Value) -> Result<Value, Diagnostics>;
}

#[async_trait]
impl<T> DynResource for T
where
    T: Resource,
{
    fn type_name(&self) -> &'static str {
        Resource::type_name(self)
    }

    fn validate(&self, plan: &Value) -> Diagnostics {
        match decode::<T::Model>(plan.clone(), "plan") {
            Ok(plan) => Resource::validate(self, &plan),
            Err(diags) => diags,
        }
    }

    async fn create(&self, cancel: &Cancellation, plan: Value) -> Result<Value, Diagnostics> {
        let plan = decode::<T::Model>(plan, "plan")?;
        let state = Resource::create(self, cancel, plan).await?;
        encode(&state)
    }

    async fn read(
        &self,
        cancel: &Cancellation,
        state: Value,
    ) -> Result<Option<Value>, Diagnostics> {
        let state = decode::<T::Model>(state, "state")?;
        match Resource::read(self, cancel, state).await? {
            Some(state) => encode(&state).map(Some),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        cancel: &Cancellation,
        plan: Value,
        state: Value,
    ) -> Result<Value, Diagnostics> {
        let plan = decode::<T::Model>(plan, "plan")?;
        let state = decode::<T::Model>(state, "state")?;
        let state = Resource::update(self, cancel, plan, state).await?;
        encode(&state)
    }

    async fn delete(&self, cancel: &Cancellation, state: Value) -> Result<(), Diagnostics> {
        let state = decode::<T::Model>(state, "state")?;
        Resource::delete(self, cancel, state).await
    }

    fn import_state(&self, id: &str) -> Result<Value, Diagnostics> {
        let state = Resource::import_state(self, id)?;
        encode(&state)
    }
}

#[async_trait]
impl<T> DynDataSource for T
where
    T: DataSource,
{
    fn type_name(&self) -> &'static str {
        DataSource::type_name(self)
    }

    async fn read(&self, cancel: &Cancellation, config: Value) -> Result<Value, Diagnostics> {
        let config = decode::<T::Config>(config, "configuration")?;
        let model = DataSource::read(self, cancel, config).await?;
        encode(&model)
    }
}

fn decode<M: DeserializeOwned>(value: Value, what: &str) -> Result<M, Diagnostics> {
    serde_json::from_value(value).map_err(|e| {
        Diagnostics::error(
            "Invalid Configuration",
            format!("Failed to decode {}: {}", what, e),
        )
    })
}

fn encode<M: Serialize>(model: &M) -> Result<Value, Diagnostics> {
    serde_json::to_value(model)
        .map_err(|e| Diagnostics::error("Internal Error", format!("Failed to encode state: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Widget {
        id: Option<String>,
        name: String,
    }

    /// In-memory resource recording the calls it receives.
    #[derive(Default)]
    struct WidgetResource {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Resource for WidgetResource {
        type Model = Widget;

        fn type_name(&self) -> &'static str {
            "test_widget"
        }

        fn validate(&self, plan: &Widget) -> Diagnostics {
            let mut diags = Diagnostics::new();
            if plan.id.is_some() {
                diags.add_warning("Computed Attribute Ignored", "`id` is set by the API");
            }
            diags
        }

        async fn create(&self, _: &Cancellation, plan: Widget) -> Result<Widget, Diagnostics> {
            self.calls.lock().unwrap().push("create".into());
            Ok(Widget {
                id: Some("w-1".into()),
                ..plan
            })
        }

        async fn read(&self, _: &Cancellation, state: Widget) -> Result<Option<Widget>, Diagnostics> {
            self.calls.lock().unwrap().push("read".into());
            Ok((state.id.as_deref() != Some("gone")).then_some(state))
        }

        async fn update(
            &self,
            _: &Cancellation,
            plan: Widget,
            state: Widget,
        ) -> Result<Widget, Diagnostics> {
            self.calls.lock().unwrap().push("update".into());
            Ok(Widget { id: state.id, ..plan })
        }

        async fn delete(&self, _: &Cancellation, _: Widget) -> Result<(), Diagnostics> {
            self.calls.lock().unwrap().push("delete".into());
            Ok(())
        }

        fn import_state(&self, id: &str) -> Result<Widget, Diagnostics> {
            let [id] = parse_import_id(id, ["id"])?;
            Ok(Widget {
                id: Some(id),
                name: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_dyn_resource_round_trips_json() {
        let resource = WidgetResource::default();
        let dynamic: &dyn DynResource = &resource;
        let cancel = Cancellation::never();

        let state = dynamic
            .create(&cancel, json!({"id": null, "name": "gizmo"}))
            .await
            .unwrap();
        assert_eq!(state, json!({"id": "w-1", "name": "gizmo"}));

        let state = dynamic
            .update(&cancel, json!({"id": null, "name": "renamed"}), state)
            .await
            .unwrap();
        assert_eq!(state, json!({"id": "w-1", "name": "renamed"}));

        dynamic.delete(&cancel, state).await.unwrap();

        assert_eq!(
            *resource.calls.lock().unwrap(),
            vec!["create", "update", "delete"]
        );
    }

    #[tokio::test]
    async fn test_dyn_resource_read_gone() {
        let resource = WidgetResource::default();
        let dynamic: &dyn DynResource = &resource;

        let refreshed = dynamic
            .read(&Cancellation::never(), json!({"id": "gone", "name": "x"}))
            .await
            .unwrap();

        assert!(refreshed.is_none());
    }

    #[tokio::test]
    async fn test_dyn_resource_rejects_malformed_plan() {
        let resource = WidgetResource::default();
        let dynamic: &dyn DynResource = &resource;

        let err = dynamic
            .create(&Cancellation::never(), json!({"name": 42}))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Invalid Configuration"));
        assert!(resource.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dyn_resource_validate() {
        let resource = WidgetResource::default();
        let dynamic: &dyn DynResource = &resource;

        assert_eq!(dynamic.validate(&json!({"name": "gizmo"})).iter().count(), 0);

        let diags = dynamic.validate(&json!({"id": "w-1", "name": "gizmo"}));
        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);

        let diags = dynamic.validate(&json!({"name": 42}));
        assert!(diags.has_error());
        assert!(resource.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dyn_resource_import_state() {
        let resource = WidgetResource::default();
        let dynamic: &dyn DynResource = &resource;

        assert_eq!(dynamic.type_name(), "test_widget");
        assert_eq!(
            dynamic.import_state("w-9").unwrap(),
            json!({"id": "w-9", "name": ""})
        );
        assert!(dynamic.import_state("a,b").is_err());
    }
}
