//! Application registry and reference resolution.
//!
//! An application is named by an [`AppRef`] of the form `module:attribute`
//! (for example `demo.main:app`). References are resolved once at startup
//! against the factories registered in an [`AppRegistry`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::app::App;
use crate::demo;

/// Reference used when none is configured.
pub const DEFAULT_APP_REF: &str = "demo.main:app";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid application reference '{0}', expected format: module:attribute")]
    InvalidRef(String),

    #[error("module '{0}' is not registered")]
    ModuleNotFound(String),

    #[error("module '{module}' has no attribute '{attribute}'")]
    AttributeNotFound { module: String, attribute: String },
}

/// `module:attribute` pair naming an application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppRef {
    pub module: String,
    pub attribute: String,
}

impl AppRef {
    pub fn new(module: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            attribute: attribute.into(),
        }
    }
}

impl FromStr for AppRef {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, attribute) = s
            .rsplit_once(':')
            .ok_or_else(|| ResolveError::InvalidRef(s.to_string()))?;
        let (module, attribute) = (module.trim(), attribute.trim());
        if module.is_empty() || attribute.is_empty() {
            return Err(ResolveError::InvalidRef(s.to_string()));
        }
        Ok(Self::new(module, attribute))
    }
}

impl fmt::Display for AppRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.attribute)
    }
}

/// Builds a fresh application instance.
pub type AppFactory = Box<dyn Fn() -> Arc<dyn App> + Send + Sync>;

/// Factories keyed by module, then attribute.
#[derive(Default)]
pub struct AppRegistry {
    modules: BTreeMap<String, BTreeMap<String, AppFactory>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the `demo.main` applications.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        demo::register(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, app_ref: AppRef, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn App> + Send + Sync + 'static,
    {
        self.modules
            .entry(app_ref.module)
            .or_default()
            .insert(app_ref.attribute, Box::new(factory));
        self
    }

    pub fn contains(&self, app_ref: &AppRef) -> bool {
        self.modules
            .get(&app_ref.module)
            .is_some_and(|attrs| attrs.contains_key(&app_ref.attribute))
    }

    /// Registered references, sorted.
    pub fn refs(&self) -> Vec<AppRef> {
        self.modules
            .iter()
            .flat_map(|(module, attrs)| attrs.keys().map(move |attr| AppRef::new(module, attr)))
            .collect()
    }

    pub fn resolve(&self, app_ref: &AppRef) -> Result<Arc<dyn App>, ResolveError> {
        let attrs = self
            .modules
            .get(&app_ref.module)
            .ok_or_else(|| ResolveError::ModuleNotFound(app_ref.module.clone()))?;
        let factory = attrs.get(&app_ref.attribute).ok_or_else(|| {
            ResolveError::AttributeNotFound {
                module: app_ref.module.clone(),
                attribute: app_ref.attribute.clone(),
            }
        })?;
        Ok(factory())
    }
}

impl fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppRegistry")
            .field("refs", &self.refs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppResult, Receive, Responder};
    use crate::scope::Scope;

    struct Nop;

    #[async_trait::async_trait]
    impl App for Nop {
        async fn call(&self, _: &Scope, _: &mut Receive, _: &mut Responder) -> AppResult {
            Ok(())
        }
    }

    #[test]
    fn parses_module_and_attribute() {
        let r: AppRef = "demo.main:app".parse().unwrap();
        assert_eq!(r, AppRef::new("demo.main", "app"));
        assert_eq!(r.to_string(), "demo.main:app");
    }

    #[test]
    fn rejects_refs_without_both_parts() {
        for bad in ["demo.main", ":app", "demo.main:", ""] {
            let err = bad.parse::<AppRef>().unwrap_err();
            assert_eq!(err, ResolveError::InvalidRef(bad.to_string()));
        }
    }

    #[test]
    fn resolves_registered_factory() {
        let mut registry = AppRegistry::new();
        registry.register(AppRef::new("svc", "nop"), || Arc::new(Nop) as Arc<dyn App>);

        assert!(registry.contains(&AppRef::new("svc", "nop")));
        assert!(registry.resolve(&AppRef::new("svc", "nop")).is_ok());
    }

    #[test]
    fn distinguishes_missing_module_and_attribute() {
        let mut registry = AppRegistry::new();
        registry.register(AppRef::new("svc", "nop"), || Arc::new(Nop) as Arc<dyn App>);

        let err = registry.resolve(&AppRef::new("other", "nop")).err().unwrap();
        assert_eq!(err, ResolveError::ModuleNotFound("other".to_string()));

        let err = registry.resolve(&AppRef::new("svc", "missing")).err().unwrap();
        assert_eq!(
            err,
            ResolveError::AttributeNotFound {
                module: "svc".to_string(),
                attribute: "missing".to_string(),
            }
        );
    }

    #[test]
    fn builtin_contains_default_app() {
        let registry = AppRegistry::builtin();
        let default: AppRef = DEFAULT_APP_REF.parse().unwrap();
        assert!(registry.contains(&default));
        assert_eq!(
            registry.refs(),
            vec![
                AppRef::new("demo.main", "app"),
                AppRef::new("demo.main", "echo"),
                AppRef::new("demo.main", "fail"),
            ]
        );
    }

    #[test]
    fn debug_lists_registered_refs() {
        let mut registry = AppRegistry::new();
        registry
            .register(AppRef::new("svc", "b"), || Arc::new(Nop) as Arc<dyn App>)
            .register(AppRef::new("svc", "a"), || Arc::new(Nop) as Arc<dyn App>);

        assert_eq!(registry.refs(), vec![AppRef::new("svc", "a"), AppRef::new("svc", "b")]);
        let debug = format!("{registry:?}");
        assert!(debug.starts_with("AppRegistry"));
        assert!(debug.contains("attribute: \"a\""));
    }
}
