//! The "disable app" settings toggle.
//!
//! The flag is an entity property named [`DISABLE_PROPERTY_KEY`] on either a
//! project or the app itself. Its presence means "disabled", whatever the
//! stored value: saving a disabled selection writes `true`, saving an
//! enabled selection deletes the property.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::api::error::{ApiError, Result};
use crate::api::types::{Project, PropertyScope};
use crate::api::{IssueTracker, PropertyStore};

/// Property key holding the flag.
pub const DISABLE_PROPERTY_KEY: &str = "disable_app";

/// Lifecycle of the toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    /// The property has not been read yet.
    #[default]
    Loading,
    /// Showing the current selection.
    Ready { disabled: bool },
    /// A write for `disabled` is in flight.
    Saving { disabled: bool },
}

impl ToggleState {
    /// The selection shown to the user, once loaded.
    pub fn disabled(self) -> Option<bool> {
        match self {
            ToggleState::Loading => None,
            ToggleState::Ready { disabled } | ToggleState::Saving { disabled } => Some(disabled),
        }
    }

    pub fn label(self) -> &'static str {
        match self.disabled() {
            None => "loading",
            Some(true) => "disabled",
            Some(false) => "enabled",
        }
    }
}

/// Settings toggle bound to one property scope.
pub struct SettingsToggle<'a, P: PropertyStore + ?Sized> {
    store: &'a P,
    scope: PropertyScope,
    state: ToggleState,
    /// Last value known to be stored remotely.
    saved: Option<bool>,
    /// Message of the last failed load or save.
    error: Option<String>,
}

impl<'a, P: PropertyStore + ?Sized> SettingsToggle<'a, P> {
    pub fn new(store: &'a P, scope: PropertyScope) -> Self {
        Self {
            store,
            scope,
            state: ToggleState::Loading,
            saved: None,
            error: None,
        }
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    pub fn scope(&self) -> &PropertyScope {
        &self.scope
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the selection differs from what is stored.
    pub fn is_dirty(&self) -> bool {
        match (self.state.disabled(), self.saved) {
            (Some(selected), Some(saved)) => selected != saved,
            _ => false,
        }
    }

    /// Read the property and leave `Loading`.
    ///
    /// A missing property and a failed read both load as enabled; a failed
    /// read also records its error message.
    #[instrument(skip(self), fields(scope = %self.scope))]
    pub async fn load(&mut self) -> ToggleState {
        self.state = ToggleState::Loading;
        self.error = None;

        let disabled = match self.store.get_property(&self.scope, DISABLE_PROPERTY_KEY).await {
            Ok(Some(property)) => {
                debug!(value = %property.value, "Disable flag present");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Error loading settings, treating app as enabled: {}", e);
                self.error = Some(format!("Error loading settings: {}", e));
                false
            }
        };

        self.saved = Some(disabled);
        self.state = ToggleState::Ready { disabled };
        self.state
    }

    /// Select a value. Ignored unless the toggle is `Ready`.
    pub fn set_disabled(&mut self, disabled: bool) -> bool {
        match self.state {
            ToggleState::Ready { .. } => {
                self.state = ToggleState::Ready { disabled };
                true
            }
            _ => false,
        }
    }

    /// Flip the selection. Ignored unless the toggle is `Ready`.
    pub fn toggle(&mut self) -> bool {
        match self.state {
            ToggleState::Ready { disabled } => self.set_disabled(!disabled),
            _ => false,
        }
    }

    /// Persist the current selection.
    ///
    /// The toggle returns to `Ready` with the saved selection whether or not
    /// the write succeeds; a failure is returned and recorded, and the stored
    /// value is left as it was.
    #[instrument(skip(self), fields(scope = %self.scope))]
    pub async fn save(&mut self) -> Result<()> {
        let disabled = match self.state {
            ToggleState::Ready { disabled } => disabled,
            ToggleState::Loading => {
                return Err(ApiError::InvalidRequest(
                    "settings have not been loaded".to_string(),
                ))
            }
            ToggleState::Saving { .. } => {
                return Err(ApiError::InvalidRequest(
                    "a save is already in progress".to_string(),
                ))
            }
        };

        self.state = ToggleState::Saving { disabled };
        self.error = None;

        let result = if disabled {
            self.store
                .set_property(&self.scope, DISABLE_PROPERTY_KEY, &Value::Bool(true))
                .await
        } else {
            self.store
                .delete_property(&self.scope, DISABLE_PROPERTY_KEY)
                .await
        };

        self.state = ToggleState::Ready { disabled };
        match result {
            Ok(()) => {
                self.saved = Some(disabled);
                info!(
                    "App is now {} for {}",
                    if disabled { "disabled" } else { "enabled" },
                    self.scope
                );
                Ok(())
            }
            Err(e) => {
                self.error = Some(format!("Error saving settings: {}", e));
                Err(e)
            }
        }
    }
}

/// The project settings apply to when none is named: the first project
/// returned by the project search.
pub async fn current_project<T: IssueTracker + ?Sized>(tracker: &T) -> Result<Project> {
    tracker
        .search_projects()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("Cannot determine current project".to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::api::types::EntityProperty;

    #[derive(Default)]
    struct FakeStore {
        value: Mutex<Option<Value>>,
        fail_reads: bool,
        fail_writes: bool,
        writes: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn with_value(value: Value) -> Self {
            Self {
                value: Mutex::new(Some(value)),
                ..Default::default()
            }
        }

        fn stored(&self) -> Option<Value> {
            self.value.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PropertyStore for FakeStore {
        async fn get_property(
            &self,
            _scope: &PropertyScope,
            key: &str,
        ) -> Result<Option<EntityProperty>> {
            if self.fail_reads {
                return Err(ApiError::ServerError("HTTP 500: down".to_string()));
            }
            Ok(self.stored().map(|value| EntityProperty {
                key: key.to_string(),
                value,
            }))
        }

        async fn set_property(&self, _scope: &PropertyScope, key: &str, value: &Value) -> Result<()> {
            self.writes.lock().unwrap().push(format!("PUT {}", key));
            if self.fail_writes {
                return Err(ApiError::Forbidden);
            }
            *self.value.lock().unwrap() = Some(value.clone());
            Ok(())
        }

        async fn delete_property(&self, _scope: &PropertyScope, key: &str) -> Result<()> {
            self.writes.lock().unwrap().push(format!("DELETE {}", key));
            if self.fail_writes {
                return Err(ApiError::Forbidden);
            }
            *self.value.lock().unwrap() = None;
            Ok(())
        }
    }

    fn scope() -> PropertyScope {
        PropertyScope::Project("10000".to_string())
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let store = FakeStore::default();
        let toggle = SettingsToggle::new(&store, scope());
        assert_eq!(toggle.state(), ToggleState::Loading);
        assert_eq!(toggle.state().label(), "loading");
    }

    #[tokio::test]
    async fn test_absent_property_loads_enabled() {
        let store = FakeStore::default();
        let mut toggle = SettingsToggle::new(&store, scope());
        assert_eq!(toggle.load().await, ToggleState::Ready { disabled: false });
        assert!(toggle.error().is_none());
    }

    #[tokio::test]
    async fn test_present_property_loads_disabled() {
        let store = FakeStore::with_value(Value::Bool(true));
        let mut toggle = SettingsToggle::new(&store, scope());
        assert_eq!(toggle.load().await, ToggleState::Ready { disabled: true });
    }

    #[tokio::test]
    async fn test_presence_not_value_encodes_disabled() {
        let store = FakeStore::with_value(Value::Bool(false));
        let mut toggle = SettingsToggle::new(&store, scope());
        assert_eq!(toggle.load().await.disabled(), Some(true));
    }

    #[tokio::test]
    async fn test_read_error_fails_open() {
        let store = FakeStore {
            fail_reads: true,
            ..FakeStore::with_value(Value::Bool(true))
        };
        let mut toggle = SettingsToggle::new(&store, scope());
        assert_eq!(toggle.load().await, ToggleState::Ready { disabled: false });
        assert!(toggle.error().unwrap().starts_with("Error loading settings"));
    }

    #[tokio::test]
    async fn test_toggle_ignored_while_loading() {
        let store = FakeStore::default();
        let mut toggle = SettingsToggle::new(&store, scope());
        assert!(!toggle.toggle());
        assert!(!toggle.set_disabled(true));
        let err = assert_err!(toggle.save().await);
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_disabled_writes_property() {
        let store = FakeStore::default();
        let mut toggle = SettingsToggle::new(&store, scope());
        toggle.load().await;

        assert!(toggle.toggle());
        assert!(toggle.is_dirty());
        assert_ok!(toggle.save().await);

        assert_eq!(toggle.state(), ToggleState::Ready { disabled: true });
        assert!(!toggle.is_dirty());
        assert_eq!(store.stored(), Some(Value::Bool(true)));
        assert_eq!(*store.writes.lock().unwrap(), vec!["PUT disable_app"]);
    }

    #[tokio::test]
    async fn test_save_enabled_deletes_property() {
        let store = FakeStore::with_value(Value::Bool(true));
        let mut toggle = SettingsToggle::new(&store, scope());
        toggle.load().await;

        toggle.set_disabled(false);
        assert_ok!(toggle.save().await);

        assert_eq!(toggle.state(), ToggleState::Ready { disabled: false });
        assert_eq!(store.stored(), None);
        assert_eq!(*store.writes.lock().unwrap(), vec!["DELETE disable_app"]);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_selection_and_remote_value() {
        let store = FakeStore {
            fail_writes: true,
            ..FakeStore::default()
        };
        let mut toggle = SettingsToggle::new(&store, scope());
        toggle.load().await;
        toggle.set_disabled(true);

        let err = assert_err!(toggle.save().await);
        assert!(matches!(err, ApiError::Forbidden));
        assert_eq!(toggle.state(), ToggleState::Ready { disabled: true });
        assert!(toggle.is_dirty());
        assert!(toggle.error().unwrap().starts_with("Error saving settings"));
        assert_eq!(store.stored(), None);
    }
}
